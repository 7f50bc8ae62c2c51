//! The `Model` orchestrator and its event loop.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use spur_core::{AgentId, ComponentId, RunConfig, SimTime, TourId};
use spur_network::{Admission, Claimant, ComponentState, ItineraryStop, Network};
use spur_schedule::{EventHandle, EventQueue, RespawnPolicy};

use crate::liveness::wait_for_chain;
use crate::{
    Agent, AgentState, Anomaly, Intervention, KernelEvent, KernelObserver, LivenessWarning,
    NegativeDurationWarning, SimError, SimResult, TraceRecord, TransitionKind,
};

/// Joins a spawn plan's name and a respawn generation (`"IC 4#2"`).
/// Reserved: plan names may not contain it.
pub(crate) const GENERATION_SEPARATOR: char = '#';

// ── Run control ───────────────────────────────────────────────────────────────

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No events remain.
    Exhausted,
    /// The next event lies beyond the requested end time.
    ReachedEndTime,
    /// The pause handle was set.  State is intact; call a run method again
    /// after [`PauseHandle::resume`].
    Paused,
}

/// Cloneable flag checked after every dispatched event.
///
/// Share it with another thread or an observer to pause a run between
/// events, inject interventions, take a snapshot, and resume.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn pause(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A spawn schedule entry with its tour resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub name:     String,
    pub tour:     TourId,
    pub time:     SimTime,
    pub priority: i32,
    pub respawn:  RespawnPolicy,
}

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub time:       SimTime,
    pub dispatched: u64,
    /// Events still queued (non-zero when stopped at an end time).
    pub pending:    usize,
    pub spawned:    usize,
    pub completed:  usize,
    pub aborted:    usize,
    /// Agents that have neither completed nor been aborted.
    pub in_network: Vec<AgentId>,
    /// Agents currently blocked on a hand-off.
    pub stuck:      Vec<AgentId>,
    pub liveness_warnings:          usize,
    pub negative_duration_warnings: usize,
}

// ── Model ─────────────────────────────────────────────────────────────────────

/// The simulation kernel.
///
/// Owns the event queue, the network and every agent.  All state changes
/// happen inside [`step`](Self::step), one event at a time, in `(time,
/// sequence)` order.  Create via [`ModelBuilder`][crate::ModelBuilder].
///
/// # Dispatch
///
/// | Event              | Handler effect                                            |
/// |--------------------|-----------------------------------------------------------|
/// | `Spawn`            | create agent; hold for arrival or request first stop      |
/// | `Ready`            | timetable hold elapsed; request first or next stop        |
/// | `ServiceComplete`  | hold for departure/arrival, or attempt hand-off / finish  |
/// | `LivenessCheck`    | report a hand-off wait that outlived the horizon          |
/// | `Intervention`     | close/open component, abort agent                         |
///
/// A hand-off (reserve next, vacate current, promote whoever was waiting on
/// the vacated component, recursively) is one transaction inside a single
/// dispatch; observers only see its completed result.
pub struct Model {
    pub config: RunConfig,

    pub(crate) queue:             EventQueue<KernelEvent>,
    pub(crate) network:           Network,
    pub(crate) plans:             Vec<SpawnPlan>,
    /// Every agent ever spawned, indexed by `AgentId`.
    pub(crate) agents:            Vec<Agent>,
    pub(crate) live:              BTreeSet<AgentId>,
    pub(crate) anomalies:         Vec<Anomaly>,
    pub(crate) negative_reported: BTreeSet<ComponentId>,

    pause: PauseHandle,

    // ── Per-dispatch scratch ──────────────────────────────────────────────
    pub(crate) trace:               Vec<TraceRecord>,
    pub(crate) delivered_anomalies: usize,
    current:                        EventHandle,
    touched:                        Vec<ComponentId>,
}

impl Model {
    pub(crate) fn new(
        config:  RunConfig,
        network: Network,
        plans:   Vec<SpawnPlan>,
        queue:   EventQueue<KernelEvent>,
    ) -> Self {
        Self {
            config,
            queue,
            network,
            plans,
            agents: Vec::new(),
            live: BTreeSet::new(),
            anomalies: Vec::new(),
            negative_reported: BTreeSet::new(),
            pause: PauseHandle::default(),
            trace: Vec::new(),
            delivered_anomalies: 0,
            current: EventHandle(0),
            touched: Vec::new(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Every agent spawned so far, including finished ones.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> SimResult<&Agent> {
        self.agents.get(id.index()).ok_or(SimError::UnknownAgent(id))
    }

    /// First agent spawned under `name`.
    pub fn agent_by_name(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Agents that have spawned and not yet completed or aborted.
    pub fn live_agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.live.iter().copied()
    }

    pub fn plans(&self) -> &[SpawnPlan] {
        &self.plans
    }

    pub fn component_state(&self, id: ComponentId) -> SimResult<ComponentState> {
        Ok(self.network.component(id)?.state())
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn liveness_warnings(&self) -> impl Iterator<Item = &LivenessWarning> + '_ {
        self.anomalies.iter().filter_map(Anomaly::as_liveness)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// A handle sharing this model's pause flag.
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn report(&self) -> RunReport {
        let count = |s: AgentState| self.agents.iter().filter(|a| a.state == s).count();
        let liveness = self.liveness_warnings().count();
        RunReport {
            time:       self.now(),
            dispatched: self.queue.dispatched(),
            pending:    self.queue.len(),
            spawned:    self.agents.len(),
            completed:  count(AgentState::Completed),
            aborted:    count(AgentState::Aborted),
            in_network: self.live.iter().copied().collect(),
            stuck:      self
                .agents
                .iter()
                .filter(|a| a.state == AgentState::BlockedOnHandoff)
                .map(|a| a.id)
                .collect(),
            liveness_warnings:          liveness,
            negative_duration_warnings: self.anomalies.len() - liveness,
        }
    }

    // ── Run loops ─────────────────────────────────────────────────────────

    /// Dispatch exactly one event.  Returns its time, or `None` if the queue
    /// was empty.
    pub fn step<O: KernelObserver>(&mut self, observer: &mut O) -> SimResult<Option<SimTime>> {
        let Some(event) = self.queue.advance() else {
            return Ok(None);
        };
        self.current = event.handle();
        self.touched.clear();
        trace!(time = %event.time, event = %self.current, kind = event.payload.name(), "dispatch");

        self.dispatch(event.payload)?;
        for &c in &self.touched {
            self.network.component(c)?.check_invariants()?;
        }
        self.deliver(observer);
        Ok(Some(event.time))
    }

    /// Run to the configured `end_time`, or until no events remain.
    pub fn run<O: KernelObserver>(&mut self, observer: &mut O) -> SimResult<RunOutcome> {
        let end = self.config.end_time;
        self.run_until(end, observer)
    }

    /// Dispatch events until the queue is empty, the next event lies after
    /// `end`, or the pause handle is set.
    ///
    /// Events scheduled exactly at `end` are dispatched.
    pub fn run_until<O: KernelObserver>(
        &mut self,
        end:      Option<SimTime>,
        observer: &mut O,
    ) -> SimResult<RunOutcome> {
        info!(time = %self.now(), pending = self.queue.len(), "run started");
        loop {
            if self.pause.is_paused() {
                info!(time = %self.now(), "run paused");
                return Ok(RunOutcome::Paused);
            }
            let outcome = match self.queue.peek_time() {
                None => Some(RunOutcome::Exhausted),
                Some(t) if end.is_some_and(|e| t > e) => Some(RunOutcome::ReachedEndTime),
                Some(_) => None,
            };
            if let Some(outcome) = outcome {
                let report = self.report();
                info!(
                    time       = %report.time,
                    dispatched = report.dispatched,
                    completed  = report.completed,
                    stuck      = report.stuck.len(),
                    anomalies  = self.anomalies.len(),
                    ?outcome,
                    "run finished"
                );
                observer.on_run_end(self.now(), outcome);
                return Ok(outcome);
            }
            self.step(observer)?;
        }
    }

    /// Dispatch at most `n` events, ignoring `end_time`.  Stops early when
    /// the queue empties or the model is paused.  Returns the number
    /// dispatched.
    pub fn run_for<O: KernelObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<u64> {
        let mut done = 0;
        while done < n && !self.pause.is_paused() {
            if self.step(observer)?.is_none() {
                break;
            }
            done += 1;
        }
        Ok(done)
    }

    // ── External intervention ─────────────────────────────────────────────

    /// Schedule `intervention` at `time`, which must not precede the clock.
    /// Interventions at the current time run after events already queued
    /// for that time.
    pub fn inject(&mut self, time: SimTime, intervention: Intervention) -> SimResult<EventHandle> {
        let now = self.now();
        if time < now {
            return Err(SimError::InjectInPast { requested: time, now });
        }
        match intervention {
            Intervention::CloseComponent(c) | Intervention::OpenComponent(c) => {
                self.network.component(c)?;
            }
            Intervention::AbortAgent(a) => {
                self.agent(a)?;
            }
        }
        let handle = self.queue.schedule(time, KernelEvent::Intervention(intervention))?;
        info!(time = %time, event = %handle, ?intervention, "intervention scheduled");
        Ok(handle)
    }

    /// Cancel a pending intervention.  Returns `false` if `handle` is not a
    /// pending intervention (already dispatched, cancelled, or a kernel event).
    pub fn cancel_injection(&mut self, handle: EventHandle) -> bool {
        let is_intervention = self
            .queue
            .iter()
            .any(|(h, _, e)| h == handle && matches!(e, KernelEvent::Intervention(_)));
        is_intervention && self.queue.cancel(handle)
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Full consistency check of network occupancy against agent states.
    ///
    /// `step` only checks the components it touched; this walks everything.
    pub fn check_invariants(&self) -> SimResult<()> {
        self.network.check_invariants()?;

        let inconsistent = |agent: &Agent, what: &str| {
            SimError::Inconsistent(format!("{} ({:?}): {what}", agent.id, agent.state))
        };

        for agent in &self.agents {
            if agent.is_live() != self.live.contains(&agent.id) {
                return Err(inconsistent(agent, "live set disagrees with state"));
            }
            let holds = |c: Option<ComponentId>| -> SimResult<bool> {
                Ok(match c {
                    Some(c) => self.network.component(c)?.is_occupant(agent.id),
                    None => false,
                })
            };
            match agent.state {
                AgentState::Spawned | AgentState::Completed | AgentState::Aborted => {
                    if agent.occupying.is_some() || agent.waiting_on.is_some() {
                        return Err(inconsistent(agent, "holds or waits for a component"));
                    }
                }
                AgentState::Queued => {
                    let waits = match agent.waiting_on {
                        Some(c) => self.network.component(c)?.wait_queue().any(|a| a == agent.id),
                        None => false,
                    };
                    if agent.occupying.is_some() || !waits {
                        return Err(inconsistent(agent, "not in the wait queue it claims"));
                    }
                }
                AgentState::InService | AgentState::Advancing => {
                    if !holds(agent.occupying)? || agent.waiting_on.is_some() {
                        return Err(inconsistent(agent, "not an occupant of its component"));
                    }
                }
                AgentState::BlockedOnHandoff => {
                    let waits = match agent.waiting_on {
                        Some(c) => self.network.component(c)?.handoff_queue().any(|a| a == agent.id),
                        None => false,
                    };
                    if !holds(agent.occupying)? || !waits {
                        return Err(inconsistent(agent, "hand-off bookkeeping broken"));
                    }
                }
                AgentState::Requesting => {
                    return Err(inconsistent(agent, "transient state observed between events"));
                }
            }
        }

        for component in self.network.components() {
            for &occupant in component.occupants() {
                let agent = self.agent(occupant)?;
                if agent.occupying != Some(component.id()) {
                    return Err(inconsistent(agent, "component lists it as occupant"));
                }
            }
        }
        Ok(())
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    fn dispatch(&mut self, payload: KernelEvent) -> SimResult<()> {
        match payload {
            KernelEvent::Spawn { plan, cycle } => self.on_spawn(plan, cycle),
            KernelEvent::Ready { agent } => self.on_ready(agent),
            KernelEvent::ServiceComplete { agent } => self.on_service_complete(agent),
            KernelEvent::LivenessCheck { agent, episode } => self.on_liveness_check(agent, episode),
            KernelEvent::Intervention(i) => self.on_intervention(i),
        }
    }

    fn on_spawn(&mut self, plan: usize, cycle: u32) -> SimResult<()> {
        let now = self.now();
        let p = self
            .plans
            .get(plan)
            .ok_or_else(|| SimError::Inconsistent(format!("spawn plan {plan} does not exist")))?;

        let id   = next_agent_id(self.agents.len())?;
        let name = if cycle == 0 {
            p.name.clone()
        } else {
            format!("{}{GENERATION_SEPARATOR}{cycle}", p.name)
        };
        debug!(agent = %id, name = %name, cycle, time = %now, "agent spawned");
        self.agents.push(Agent::new(id, name, p.tour, plan, cycle, p.priority, now));
        self.live.insert(id);
        self.record(Some(id), None, TransitionKind::Spawned);

        let first = self.stop_at(id, 0)?;
        match first.params.arrival {
            Some(at) if at > now => self.hold(id, at),
            _ => self.enter(id, first.component),
        }
    }

    fn on_ready(&mut self, id: AgentId) -> SimResult<()> {
        let state = {
            let agent = self.agent_mut(id)?;
            agent.pending = None;
            agent.state
        };
        match state {
            AgentState::Spawned => {
                let first = self.stop_at(id, 0)?;
                self.enter(id, first.component)
            }
            AgentState::Advancing => self.advance(id),
            state => Err(SimError::UnexpectedEvent { agent: id, state, event: "ready" }),
        }
    }

    fn on_service_complete(&mut self, id: AgentId) -> SimResult<()> {
        let (component, cursor) = {
            let agent = self.agent_mut(id)?;
            if agent.state != AgentState::InService {
                let state = agent.state;
                return Err(SimError::UnexpectedEvent { agent: id, state, event: "service_complete" });
            }
            agent.set_state(AgentState::Advancing)?;
            agent.pending = None;
            (agent.occupying, agent.cursor)
        };
        self.record(Some(id), component, TransitionKind::ServiceCompleted);

        let ready = self.ready_time(id, cursor)?;
        if ready > self.now() {
            self.hold(id, ready)
        } else {
            self.advance(id)
        }
    }

    fn on_liveness_check(&mut self, id: AgentId, episode: u64) -> SimResult<()> {
        let now     = self.now();
        let current = self.current;
        let since = {
            let agent = self.agent_mut(id)?;
            if agent.liveness_check == Some(current) {
                agent.liveness_check = None;
            }
            if agent.state != AgentState::BlockedOnHandoff
                || agent.block_episode != episode
                || agent.stuck_reported
            {
                return Ok(());
            }
            agent.blocked_since.unwrap_or(now)
        };

        let chain = wait_for_chain(&self.network, &self.agents, id)?;
        let already_reported = chain.cyclic
            && chain.agents.iter().any(|a| self.agents.get(a.index()).is_some_and(|a| a.deadlock_reported));
        let blocked_since = chain
            .agents
            .iter()
            .filter_map(|a| self.agents.get(a.index()).and_then(|a| a.blocked_since))
            .min()
            .unwrap_or(since);
        for &a in chain.agents.iter().chain([&id]) {
            if let Some(agent) = self.agents.get_mut(a.index()) {
                agent.stuck_reported    = true;
                agent.deadlock_reported = chain.cyclic;
            }
        }
        if already_reported {
            debug!(agent = %id, time = %now, member = chain.member, "blocked in an already reported deadlock");
            return Ok(());
        }
        if chain.cyclic && !chain.member {
            debug!(agent = %id, time = %now, "blocked behind a deadlock");
        }
        self.report_anomaly(Anomaly::Liveness(LivenessWarning {
            time:       now,
            blocked_since,
            agents:     chain.agents,
            components: chain.components,
            cyclic:     chain.cyclic,
        }));
        Ok(())
    }

    fn on_intervention(&mut self, intervention: Intervention) -> SimResult<()> {
        info!(time = %self.now(), ?intervention, "applying intervention");
        match intervention {
            Intervention::CloseComponent(c) => {
                self.network.component_mut(c)?.close();
                self.touched.push(c);
                self.record(None, Some(c), TransitionKind::ComponentClosed);
                Ok(())
            }
            Intervention::OpenComponent(c) => {
                self.network.component_mut(c)?.open();
                self.touched.push(c);
                self.record(None, Some(c), TransitionKind::ComponentOpened);
                self.settle(vec![c])
            }
            Intervention::AbortAgent(a) => self.abort(a),
        }
    }

    // ── Agent actions ─────────────────────────────────────────────────────

    /// Park the agent until `until` with a `Ready` event.
    fn hold(&mut self, id: AgentId, until: SimTime) -> SimResult<()> {
        let handle = self.queue.schedule(until, KernelEvent::Ready { agent: id })?;
        let occupying = {
            let agent = self.agent_mut(id)?;
            agent.pending = Some(handle);
            agent.occupying
        };
        debug!(agent = %id, until = %until, "held by timetable");
        self.record(Some(id), occupying, TransitionKind::Held);
        Ok(())
    }

    /// First request of a freshly spawned agent.
    fn enter(&mut self, id: AgentId, component: ComponentId) -> SimResult<()> {
        let priority = {
            let agent = self.agent_mut(id)?;
            agent.set_state(AgentState::Requesting)?;
            agent.priority
        };
        self.record(Some(id), Some(component), TransitionKind::Requested);
        self.touched.push(component);

        match self.network.component_mut(component)?.request(id, priority)? {
            Admission::Admitted => self.begin_service(id, component),
            Admission::Queued | Admission::HandoffWait => {
                let agent = self.agent_mut(id)?;
                agent.set_state(AgentState::Queued)?;
                agent.waiting_on = Some(component);
                debug!(agent = %id, component = %component, time = %self.now(), "queued");
                self.record(Some(id), Some(component), TransitionKind::Queued);
                Ok(())
            }
        }
    }

    /// The agent has just been admitted to `component` (it is already an
    /// occupant).  Sample its service duration and schedule completion.
    fn begin_service(&mut self, id: AgentId, component: ComponentId) -> SimResult<()> {
        let now = self.now();
        let cursor = {
            let agent = self.agent_mut(id)?;
            agent.set_state(AgentState::InService)?;
            agent.occupying  = Some(component);
            agent.waiting_on = None;
            agent.cursor
        };
        self.record(Some(id), Some(component), TransitionKind::Admitted);

        let stop = self.stop_at(id, cursor)?;
        if stop.component != component {
            return Err(SimError::Inconsistent(format!(
                "{id} admitted to {component} but stop {cursor} is {}",
                stop.component
            )));
        }
        let sample = self.network.sample_duration(&stop, id, now)?;
        if sample.clipped && self.negative_reported.insert(component) {
            self.report_anomaly(Anomaly::NegativeDuration(NegativeDurationWarning {
                time: now,
                component,
                agent: id,
                raw: sample.raw,
            }));
        }

        let handle = self.queue.schedule_in(sample.secs, KernelEvent::ServiceComplete { agent: id });
        self.agent_mut(id)?.pending = Some(handle);
        debug!(agent = %id, component = %component, time = %now, secs = sample.secs, "service started");
        Ok(())
    }

    /// Service and timetable holds are done: hand off to the next stop, or
    /// leave the network when the tour is exhausted.
    fn advance(&mut self, id: AgentId) -> SimResult<()> {
        let (current, cursor, priority) = {
            let agent = self.agent(id)?;
            let current = agent
                .occupying
                .ok_or_else(|| SimError::Inconsistent(format!("{id} advancing from nowhere")))?;
            (current, agent.cursor, agent.priority)
        };

        let Some(next) = self.next_stop(id, cursor)? else {
            self.network.component_mut(current)?.vacate(id)?;
            self.touched.push(current);
            self.record(Some(id), Some(current), TransitionKind::Vacated);
            self.finish(id, AgentState::Completed)?;
            self.respawn(id)?;
            return self.settle(vec![current]);
        };

        let target = next.component;
        self.agent_mut(id)?.set_state(AgentState::Requesting)?;
        self.record(Some(id), Some(target), TransitionKind::Requested);
        self.touched.push(target);

        match self.network.component_mut(target)?.request_handoff(id, priority)? {
            Admission::Admitted => {
                let freed = self.complete_handoff(id, target)?;
                self.settle(vec![freed])
            }
            Admission::Queued | Admission::HandoffWait => self.block(id, target),
        }
    }

    /// Enter `BlockedOnHandoff` and arm a liveness check.
    fn block(&mut self, id: AgentId, target: ComponentId) -> SimResult<()> {
        let now = self.now();
        let episode = {
            let agent = self.agent_mut(id)?;
            agent.set_state(AgentState::BlockedOnHandoff)?;
            agent.waiting_on        = Some(target);
            agent.blocked_since     = Some(now);
            agent.block_episode    += 1;
            agent.stuck_reported    = false;
            agent.deadlock_reported = false;
            agent.block_episode
        };
        let check = self
            .queue
            .schedule_in(self.config.liveness_horizon_secs, KernelEvent::LivenessCheck { agent: id, episode });
        self.agent_mut(id)?.liveness_check = Some(check);
        debug!(agent = %id, component = %target, time = %now, "blocked on hand-off");
        self.record(Some(id), Some(target), TransitionKind::HandoffBlocked);
        Ok(())
    }

    /// Second half of a hand-off: `id` already occupies `target`; vacate the
    /// component behind it and start service.  Returns the vacated component.
    fn complete_handoff(&mut self, id: AgentId, target: ComponentId) -> SimResult<ComponentId> {
        let (previous, check) = {
            let agent = self.agent_mut(id)?;
            let previous = agent
                .occupying
                .ok_or_else(|| SimError::Inconsistent(format!("{id} hands off from nowhere")))?;
            agent.cursor       += 1;
            agent.blocked_since = None;
            (previous, agent.liveness_check.take())
        };
        if let Some(check) = check {
            self.queue.cancel(check);
        }

        self.network.component_mut(previous)?.vacate(id)?;
        self.touched.push(previous);
        self.record(Some(id), Some(previous), TransitionKind::Vacated);
        debug!(agent = %id, from = %previous, to = %target, time = %self.now(), "hand-off");
        self.begin_service(id, target)?;
        Ok(previous)
    }

    /// Capacity-freed notification: promote claimants on every component in
    /// `freed`, following the cascade of hand-offs it releases.
    fn settle(&mut self, freed: Vec<ComponentId>) -> SimResult<()> {
        let policy = self.config.admission;
        let mut work: VecDeque<ComponentId> = freed.into();
        while let Some(component) = work.pop_front() {
            loop {
                let claimant = self.network.component_mut(component)?.promote(policy)?;
                let Some(claimant) = claimant else { break };
                self.touched.push(component);
                match claimant {
                    Claimant::Entrant(agent) => self.begin_service(agent, component)?,
                    Claimant::Handoff(agent) => {
                        let vacated = self.complete_handoff(agent, component)?;
                        work.push_back(vacated);
                    }
                }
            }
        }
        Ok(())
    }

    fn abort(&mut self, id: AgentId) -> SimResult<()> {
        if self.agent(id)?.state.is_terminal() {
            debug!(agent = %id, "abort ignored: agent already finished");
            return Ok(());
        }
        let (pending, check, waiting, occupying) = {
            let agent = self.agent_mut(id)?;
            (agent.pending.take(), agent.liveness_check.take(), agent.waiting_on.take(), agent.occupying)
        };
        for handle in [pending, check].into_iter().flatten() {
            self.queue.cancel(handle);
        }
        if let Some(c) = waiting {
            self.network.component_mut(c)?.withdraw(id);
            self.touched.push(c);
        }
        let mut freed = Vec::new();
        if let Some(c) = occupying {
            self.network.component_mut(c)?.vacate(id)?;
            self.touched.push(c);
            self.record(Some(id), Some(c), TransitionKind::Vacated);
            freed.push(c);
        }
        warn!(agent = %id, time = %self.now(), "agent aborted");
        self.finish(id, AgentState::Aborted)?;
        self.settle(freed)
    }

    /// Move to a terminal state and drop out of live bookkeeping.
    fn finish(&mut self, id: AgentId, terminal: AgentState) -> SimResult<()> {
        let now = self.now();
        let agent = self.agent_mut(id)?;
        agent.set_state(terminal)?;
        agent.occupying     = None;
        agent.waiting_on    = None;
        agent.pending       = None;
        agent.blocked_since = None;
        agent.finished_at   = Some(now);
        self.live.remove(&id);

        let kind = match terminal {
            AgentState::Completed => TransitionKind::Completed,
            _ => TransitionKind::Aborted,
        };
        debug!(agent = %id, time = %now, %kind, "agent finished");
        self.record(Some(id), None, kind);
        Ok(())
    }

    fn respawn(&mut self, id: AgentId) -> SimResult<()> {
        let (plan, cycle) = {
            let agent = self.agent(id)?;
            (agent.plan, agent.cycle)
        };
        let Some(p) = self.plans.get(plan) else {
            return Err(SimError::Inconsistent(format!("{id} refers to missing spawn plan {plan}")));
        };
        if let RespawnPolicy::Cyclic { delay_secs, .. } = p.respawn {
            if p.respawn.allows(cycle) {
                let handle = self.queue.schedule_in(delay_secs, KernelEvent::Spawn { plan, cycle: cycle + 1 });
                debug!(plan, cycle = cycle + 1, event = %handle, "respawn scheduled");
            }
        }
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn agent_mut(&mut self, id: AgentId) -> SimResult<&mut Agent> {
        self.agents.get_mut(id.index()).ok_or(SimError::UnknownAgent(id))
    }

    fn itinerary(&self, id: AgentId) -> SimResult<&[ItineraryStop]> {
        let tour = self.agent(id)?.tour;
        Ok(self.network.itinerary(tour)?)
    }

    fn stop_at(&self, id: AgentId, cursor: usize) -> SimResult<ItineraryStop> {
        self.itinerary(id)?
            .get(cursor)
            .cloned()
            .ok_or_else(|| SimError::Inconsistent(format!("{id} has no stop {cursor}")))
    }

    fn next_stop(&self, id: AgentId, cursor: usize) -> SimResult<Option<ItineraryStop>> {
        Ok(self.itinerary(id)?.get(cursor + 1).cloned())
    }

    /// Earliest time the agent may leave stop `cursor`: its scheduled
    /// departure, or the next stop's scheduled arrival, whichever is later.
    fn ready_time(&self, id: AgentId, cursor: usize) -> SimResult<SimTime> {
        let itinerary = self.itinerary(id)?;
        let departure = itinerary.get(cursor).and_then(|s| s.params.departure);
        let arrival   = itinerary.get(cursor + 1).and_then(|s| s.params.arrival);
        Ok(departure.max(arrival).unwrap_or(SimTime::ZERO))
    }

    fn record(&mut self, agent: Option<AgentId>, component: Option<ComponentId>, kind: TransitionKind) {
        self.trace.push(TraceRecord { time: self.queue.now(), event: self.current, agent, component, kind });
    }

    fn report_anomaly(&mut self, anomaly: Anomaly) {
        warn!(time = %anomaly.time(), "{anomaly}");
        self.anomalies.push(anomaly);
    }

    fn deliver<O: KernelObserver>(&mut self, observer: &mut O) {
        for record in self.trace.drain(..) {
            observer.on_transition(&record);
        }
        for anomaly in &self.anomalies[self.delivered_anomalies..] {
            observer.on_anomaly(anomaly);
        }
        self.delivered_anomalies = self.anomalies.len();
    }
}

/// Id for the agent spawned after `count` others.  `AgentId::INVALID` is
/// never handed out.
pub(crate) fn next_agent_id(count: usize) -> SimResult<AgentId> {
    u32::try_from(count)
        .ok()
        .filter(|&n| n != AgentId::INVALID.0)
        .map(AgentId)
        .ok_or_else(|| SimError::Inconsistent(format!("agent id space exhausted after {count} agents")))
}
