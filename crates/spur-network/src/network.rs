//! The assembled network and its builder.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use spur_core::{AgentId, ComponentId, RouteId, SimTime, StreamPosition, TourId};
use spur_jitter::{Jitter, JitterSpec};

use crate::{
    Component, ComponentState, EdgeKey, ItineraryStop, NetworkError, NetworkResult,
    QueueDiscipline, Route, RouteStop, ServiceContext, ServiceModel, ServiceSpec, StopParams, Tour,
};

// ── ComponentDef ──────────────────────────────────────────────────────────────

/// Declarative component description, as found in model config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name:       String,
    #[serde(default = "default_capacity")]
    pub capacity:   u32,
    #[serde(default)]
    pub service:    ServiceSpec,
    #[serde(default)]
    pub jitter:     JitterSpec,
    #[serde(default)]
    pub discipline: QueueDiscipline,
}

fn default_capacity() -> u32 {
    1
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, capacity: u32, service: ServiceSpec) -> Self {
        Self {
            name: name.into(),
            capacity,
            service,
            jitter: JitterSpec::Fixed,
            discipline: QueueDiscipline::Fifo,
        }
    }

    pub fn with_jitter(mut self, jitter: JitterSpec) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_discipline(mut self, discipline: QueueDiscipline) -> Self {
        self.discipline = discipline;
        self
    }
}

// ── DurationSample ────────────────────────────────────────────────────────────

/// Outcome of sampling one service duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationSample {
    /// Duration in whole seconds, after jitter, clipping and rounding.
    pub secs:    u64,
    /// Nominal duration before jitter.
    pub nominal: f64,
    /// Jittered duration before clipping.
    pub raw:     f64,
    /// `true` if the raw duration was negative or non-finite.
    pub clipped: bool,
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Components, routes and tours of one model.
///
/// Routes and tours are immutable after build.  Components carry dynamic
/// occupancy and are mutated only by the kernel.  Do not construct directly;
/// use [`NetworkBuilder`].
#[derive(Debug)]
pub struct Network {
    components:   Vec<Component>,
    routes:       Vec<Route>,
    tours:        Vec<Tour>,
    edge_jitters: BTreeMap<EdgeKey, Jitter>,

    component_names: HashMap<String, ComponentId>,
    route_names:     HashMap<String, RouteId>,
    tour_names:      HashMap<String, TourId>,
}

impl Network {
    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn component(&self, id: ComponentId) -> NetworkResult<&Component> {
        self.components.get(id.index()).ok_or(NetworkError::UnknownComponent(id))
    }

    pub fn component_mut(&mut self, id: ComponentId) -> NetworkResult<&mut Component> {
        self.components.get_mut(id.index()).ok_or(NetworkError::UnknownComponent(id))
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn route(&self, id: RouteId) -> NetworkResult<&Route> {
        self.routes.get(id.index()).ok_or(NetworkError::UnknownRoute(id))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn tour(&self, id: TourId) -> NetworkResult<&Tour> {
        self.tours.get(id.index()).ok_or(NetworkError::UnknownTour(id))
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    /// Flattened stop list of `tour`.
    pub fn itinerary(&self, tour: TourId) -> NetworkResult<&[ItineraryStop]> {
        self.tour(tour).map(Tour::itinerary)
    }

    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.component_names.get(name).copied()
    }

    pub fn route_id(&self, name: &str) -> Option<RouteId> {
        self.route_names.get(name).copied()
    }

    pub fn tour_id(&self, name: &str) -> Option<TourId> {
        self.tour_names.get(name).copied()
    }

    // ── Service ───────────────────────────────────────────────────────────

    /// Sample the service duration of `agent` at `stop`, starting at `now`.
    ///
    /// The nominal value is the stop's duration override if present,
    /// otherwise the component's service model.  Jitter comes from the
    /// stop's edge override if present, otherwise the component's own.
    pub fn sample_duration(
        &mut self,
        stop:  &ItineraryStop,
        agent: AgentId,
        now:   SimTime,
    ) -> NetworkResult<DurationSample> {
        let component = self
            .components
            .get_mut(stop.component.index())
            .ok_or(NetworkError::UnknownComponent(stop.component))?;

        let nominal = match stop.params.duration {
            Some(secs) => secs,
            None => {
                let ctx = ServiceContext { now, agent, component: stop.component, stop: &stop.params };
                component.service.nominal_duration(&ctx)
            }
        };

        let jitter = match stop.jitter_edge.and_then(|k| self.edge_jitters.get_mut(&k)) {
            Some(edge) => edge,
            None => &mut component.jitter,
        };
        let sample = jitter.sample(nominal);

        Ok(DurationSample {
            secs:    SimTime::secs_from_f64(sample.value),
            nominal,
            raw:     sample.raw,
            clipped: sample.clipped || !sample.raw.is_finite(),
        })
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Check every component, then mutual exclusion across the network:
    /// an agent occupies at most one component, waits in at most one line,
    /// and never waits to *enter* while occupying something.  Waiting to
    /// hand off while occupying the previous component is the normal
    /// blocked state and is allowed.
    pub fn check_invariants(&self) -> NetworkResult<()> {
        let mut occupied: HashMap<AgentId, ComponentId> = HashMap::new();
        let mut waiting:  HashMap<AgentId, ComponentId> = HashMap::new();
        for c in &self.components {
            c.check_invariants()?;
            for &agent in c.occupants() {
                if let Some(&other) = occupied.get(&agent) {
                    return Err(NetworkError::AgentAlreadyPresent { agent, component: other });
                }
                occupied.insert(agent, c.id());
            }
            for agent in c.wait_queue().chain(c.handoff_queue()) {
                if let Some(&other) = waiting.get(&agent) {
                    return Err(NetworkError::AgentAlreadyPresent { agent, component: other });
                }
                waiting.insert(agent, c.id());
            }
        }
        for c in &self.components {
            for agent in c.wait_queue() {
                if let Some(&held) = occupied.get(&agent) {
                    return Err(NetworkError::AgentAlreadyPresent { agent, component: held });
                }
            }
        }
        Ok(())
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    pub fn component_states(&self) -> Vec<ComponentState> {
        self.components.iter().map(Component::state).collect()
    }

    pub fn edge_jitter_positions(&self) -> Vec<(EdgeKey, StreamPosition)> {
        self.edge_jitters.iter().map(|(&k, j)| (k, j.position())).collect()
    }

    /// Restore dynamic state captured by [`component_states`](Self::component_states)
    /// and [`edge_jitter_positions`](Self::edge_jitter_positions).
    pub fn restore(
        &mut self,
        components: &[ComponentState],
        edges:      &[(EdgeKey, StreamPosition)],
    ) -> NetworkResult<()> {
        if components.len() != self.components.len() {
            let missing = ComponentId(components.len().min(self.components.len()) as u32);
            return Err(NetworkError::UnknownComponent(missing));
        }
        for (component, state) in self.components.iter_mut().zip(components) {
            component.restore(state)?;
        }
        for (key, position) in edges {
            let jitter = self
                .edge_jitters
                .get_mut(key)
                .ok_or(NetworkError::UnknownRoute(key.route))?;
            jitter.restore(*position);
        }
        Ok(())
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// Components must be added before the routes that use them, and routes
/// before the tours that chain them.  Names are unique per kind.
///
/// # Example
///
/// ```
/// use spur_network::{ComponentDef, NetworkBuilder, ServiceSpec, StopParams};
///
/// let mut b = NetworkBuilder::new(42);
/// let a = b.add_component(ComponentDef::new("A", 1, ServiceSpec::Fixed { secs: 30.0 })).unwrap();
/// let c = b.add_component(ComponentDef::new("C", 1, ServiceSpec::Yard)).unwrap();
/// let r = b.add_route("out", vec![(a, StopParams::default()), (c, StopParams::default())]).unwrap();
/// b.add_tour("day", vec![r]).unwrap();
/// let net = b.build().unwrap();
/// assert_eq!(net.components().len(), 2);
/// ```
pub struct NetworkBuilder {
    seed:       u64,
    components: Vec<Component>,
    routes:     Vec<Route>,
    tours:      Vec<Tour>,

    edge_jitters:    BTreeMap<EdgeKey, Jitter>,
    component_names: HashMap<String, ComponentId>,
    route_names:     HashMap<String, RouteId>,
    tour_names:      HashMap<String, TourId>,
}

impl NetworkBuilder {
    /// `seed` is the run's global seed; every jitter stream derives from it.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            components:      Vec::new(),
            routes:          Vec::new(),
            tours:           Vec::new(),
            edge_jitters:    BTreeMap::new(),
            component_names: HashMap::new(),
            route_names:     HashMap::new(),
            tour_names:      HashMap::new(),
        }
    }

    /// Add a component using a built-in service model.
    pub fn add_component(&mut self, def: ComponentDef) -> NetworkResult<ComponentId> {
        let service = def.service.build().map_err(|reason| NetworkError::InvalidServiceModel {
            component: def.name.clone(),
            reason,
        })?;
        self.add_component_with_model(def.name, def.capacity, def.discipline, service, def.jitter)
    }

    /// Add a component with a caller-supplied service model.
    pub fn add_component_with_model(
        &mut self,
        name:       impl Into<String>,
        capacity:   u32,
        discipline: QueueDiscipline,
        service:    Box<dyn ServiceModel>,
        jitter:     JitterSpec,
    ) -> NetworkResult<ComponentId> {
        let name = name.into();
        if self.component_names.contains_key(&name) {
            return Err(NetworkError::DuplicateName { kind: "component", name });
        }
        let id = ComponentId(self.components.len() as u32);
        let jitter = Jitter::new(jitter, self.seed, u64::from(id.0))
            .map_err(|source| NetworkError::InvalidJitter { owner: format!("component {name:?}"), source })?;
        let component = Component::new(id, name.clone(), capacity, discipline, service, jitter)?;
        self.components.push(component);
        self.component_names.insert(name, id);
        Ok(id)
    }

    /// Add a route visiting `stops` in order.
    pub fn add_route(
        &mut self,
        name:  impl Into<String>,
        stops: Vec<(ComponentId, StopParams)>,
    ) -> NetworkResult<RouteId> {
        let name = name.into();
        if self.route_names.contains_key(&name) {
            return Err(NetworkError::DuplicateName { kind: "route", name });
        }
        if stops.is_empty() {
            return Err(NetworkError::EmptyRoute(name));
        }
        for pair in stops.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(NetworkError::RepeatedStop { route: name, component: pair[0].0 });
            }
        }

        let id = RouteId(self.routes.len() as u32);
        let mut route_stops = Vec::with_capacity(stops.len());
        let mut jitters     = Vec::new();
        for (i, (component, params)) in stops.into_iter().enumerate() {
            if component.index() >= self.components.len() {
                return Err(NetworkError::UnknownComponent(component));
            }
            if let Some(secs) = params.duration {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(NetworkError::InvalidStopDuration { route: name, stop: i, secs });
                }
            }
            if let Some(spec) = params.jitter {
                let key    = EdgeKey { route: id, stop: i as u32 };
                let jitter = Jitter::new(spec, self.seed, key.salt()).map_err(|source| {
                    NetworkError::InvalidJitter { owner: format!("route {name:?} stop {i}"), source }
                })?;
                jitters.push((key, jitter));
            }
            route_stops.push(RouteStop { component, params });
        }

        self.edge_jitters.extend(jitters);
        self.routes.push(Route::new(id, name.clone(), route_stops));
        self.route_names.insert(name, id);
        Ok(id)
    }

    /// Add a tour chaining `routes` end to end.
    pub fn add_tour(&mut self, name: impl Into<String>, routes: Vec<RouteId>) -> NetworkResult<TourId> {
        let name = name.into();
        if self.tour_names.contains_key(&name) {
            return Err(NetworkError::DuplicateName { kind: "tour", name });
        }
        if routes.is_empty() {
            return Err(NetworkError::EmptyTour(name));
        }

        let resolved = routes
            .iter()
            .map(|&r| self.routes.get(r.index()).ok_or(NetworkError::UnknownRoute(r)))
            .collect::<NetworkResult<Vec<&Route>>>()?;

        for pair in resolved.windows(2) {
            if pair[0].last().component != pair[1].first().component {
                return Err(NetworkError::RouteDiscontinuity {
                    tour:     name,
                    previous: pair[0].id(),
                    next:     pair[1].id(),
                });
            }
        }

        let id   = TourId(self.tours.len() as u32);
        let tour = Tour::flatten(id, name.clone(), &resolved);
        self.tours.push(tour);
        self.tour_names.insert(name, id);
        Ok(id)
    }

    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.component_names.get(name).copied()
    }

    pub fn route_id(&self, name: &str) -> Option<RouteId> {
        self.route_names.get(name).copied()
    }

    /// Consume the builder and produce a [`Network`].
    pub fn build(self) -> NetworkResult<Network> {
        Ok(Network {
            components:      self.components,
            routes:          self.routes,
            tours:           self.tours,
            edge_jitters:    self.edge_jitters,
            component_names: self.component_names,
            route_names:     self.route_names,
            tour_names:      self.tour_names,
        })
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new(0)
    }
}
