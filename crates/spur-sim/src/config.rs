//! JSON model description.
//!
//! ```json
//! {
//!   "run":        { "seed": 7, "liveness_horizon_secs": 600 },
//!   "components": [ { "name": "P1", "capacity": 2,
//!                     "service": { "model": "dwell_station", "mean_boarding": 20, "mean_alighting": 10 },
//!                     "jitter":  { "kind": "normal", "mean": 0, "std_dev": 5 } },
//!                   { "name": "T1", "service": { "model": "traversal", "length": 1200, "speed": 20 } } ],
//!   "routes":     [ { "name": "out", "stops": [ { "component": "P1", "departure": 120 },
//!                                              { "component": "T1" } ] } ],
//!   "tours":      [ { "name": "day", "routes": ["out"] } ],
//!   "spawns":     [ { "agent": "IC 1", "tour": "day", "time": 0 } ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use spur_core::RunConfig;
use spur_network::{ComponentDef, Network, NetworkBuilder, StopParams};
use spur_schedule::SpawnEntry;

use crate::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub run:        RunConfig,
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub routes:     Vec<RouteDef>,
    #[serde(default)]
    pub tours:      Vec<TourDef>,
    #[serde(default)]
    pub spawns:     Vec<SpawnEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    pub name:  String,
    pub stops: Vec<StopDef>,
}

/// A route stop by component name, with its edge parameters inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopDef {
    pub component: String,
    #[serde(flatten)]
    pub params:    StopParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourDef {
    pub name:   String,
    pub routes: Vec<String>,
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the network, resolving component and route names.  Jitter
    /// streams are seeded from `run.seed`.
    pub fn build_network(&self) -> SimResult<Network> {
        let mut b = NetworkBuilder::new(self.run.seed);
        for def in &self.components {
            b.add_component(def.clone())?;
        }
        for route in &self.routes {
            let stops = route
                .stops
                .iter()
                .map(|s| {
                    let id = b.component_id(&s.component).ok_or_else(|| SimError::UnknownName {
                        kind: "component",
                        name: s.component.clone(),
                    })?;
                    Ok((id, s.params))
                })
                .collect::<SimResult<Vec<_>>>()?;
            b.add_route(route.name.clone(), stops)?;
        }
        for tour in &self.tours {
            let routes = tour
                .routes
                .iter()
                .map(|name| {
                    b.route_id(name)
                        .ok_or_else(|| SimError::UnknownName { kind: "route", name: name.clone() })
                })
                .collect::<SimResult<Vec<_>>>()?;
            b.add_tour(tour.name.clone(), routes)?;
        }
        Ok(b.build()?)
    }
}

/// Load a [`ModelConfig`] from a JSON file.
pub fn load_config_json(path: impl AsRef<Path>) -> SimResult<ModelConfig> {
    let file = File::open(path)?;
    load_config_reader(BufReader::new(file))
}

/// Load a [`ModelConfig`] from any JSON reader.
pub fn load_config_reader<R: Read>(reader: R) -> SimResult<ModelConfig> {
    Ok(serde_json::from_reader(reader)?)
}
