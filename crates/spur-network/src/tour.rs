//! Tours and their flattened itineraries.
//!
//! A tour chains routes end to end: the last component of route *k* must be
//! the first component of route *k + 1*.  The shared component is visited
//! once, so the itinerary of a tour `[a b c] + [c d]` is `[a b c d]`.

use serde::{Deserialize, Serialize};

use spur_core::{ComponentId, RouteId, TourId};

use crate::{Route, StopParams};

/// Identifies the route edge whose jitter override applies to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub route: RouteId,
    pub stop:  u32,
}

impl EdgeKey {
    /// RNG salt for the edge's jitter stream.  Disjoint from component salts,
    /// which are the raw component index.
    pub fn salt(self) -> u64 {
        (1 << 63) | (u64::from(self.route.0) << 32) | u64::from(self.stop)
    }
}

/// One entry of a flattened tour.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryStop {
    pub component:   ComponentId,
    /// Effective parameters, merged at route junctions.
    pub params:      StopParams,
    /// Route edge owning the jitter override, if `params.jitter` is set.
    pub jitter_edge: Option<EdgeKey>,
}

/// Ordered sequence of routes, flattened once at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    id:        TourId,
    name:      String,
    routes:    Vec<RouteId>,
    itinerary: Vec<ItineraryStop>,
}

impl Tour {
    /// Flatten `routes` (already checked for continuity) into an itinerary.
    pub(crate) fn flatten(id: TourId, name: String, routes: &[&Route]) -> Self {
        let mut itinerary: Vec<ItineraryStop> = Vec::new();

        for route in routes {
            for (i, stop) in route.stops().iter().enumerate() {
                let key  = EdgeKey { route: route.id(), stop: i as u32 };
                let edge = stop.params.jitter.map(|_| key);

                if i == 0 {
                    if let Some(prev) = itinerary.last_mut() {
                        // Junction: fold this opening stop into the previous closing stop.
                        prev.params      = StopParams::merge_junction(&prev.params, &stop.params);
                        prev.jitter_edge = edge.or(prev.jitter_edge);
                        continue;
                    }
                }

                itinerary.push(ItineraryStop {
                    component:   stop.component,
                    params:      stop.params,
                    jitter_edge: edge,
                });
            }
        }

        Self {
            id,
            name,
            routes: routes.iter().map(|r| r.id()).collect(),
            itinerary,
        }
    }

    pub fn id(&self) -> TourId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routes(&self) -> &[RouteId] {
        &self.routes
    }

    pub fn itinerary(&self) -> &[ItineraryStop] {
        &self.itinerary
    }

    /// Stop at `cursor`, or `None` once the tour is exhausted.
    pub fn stop(&self, cursor: usize) -> Option<&ItineraryStop> {
        self.itinerary.get(cursor)
    }
}
