//! Wait-for analysis behind liveness warnings.

use spur_core::{AgentId, ComponentId};
use spur_network::Network;

use crate::{Agent, AgentState, SimResult};

pub(crate) struct WaitChain {
    /// Cyclic: every agent of the deadlocked set, in id order.
    /// Otherwise: just the agent that was checked.
    pub agents:     Vec<AgentId>,
    /// Cyclic: every component the set waits for, in the order reached.
    /// Otherwise: the component the checked agent waits for.
    pub components: Vec<ComponentId>,
    pub cyclic:     bool,
    /// The checked agent is itself part of the deadlocked set.
    pub member:     bool,
}

/// Follow "waits for a component held by" edges from `start` through every
/// occupant, not only the first.
///
/// The walk is closed when each agent reached waits for a component whose
/// occupants are all blocked on a hand-off: nobody in that set can ever move
/// again.  The deadlocked set is then the agents occupying those components;
/// `start` may instead sit outside it, blocked behind it.  If any awaited
/// component is empty or has an occupant still making progress, the wait is
/// not a deadlock and only `start` is returned.
pub(crate) fn wait_for_chain(
    network: &Network,
    agents:  &[Agent],
    start:   AgentId,
) -> SimResult<WaitChain> {
    let awaited = |id: AgentId| {
        agents
            .get(id.index())
            .filter(|a| a.state == AgentState::BlockedOnHandoff)
            .and_then(|a| a.waiting_on)
    };
    let open = |first: Option<ComponentId>| WaitChain {
        agents:     vec![start],
        components: first.into_iter().collect(),
        cyclic:     false,
        member:     false,
    };

    let mut reached    = vec![start];
    let mut components = Vec::new();
    let mut i = 0;
    while let Some(&current) = reached.get(i) {
        let Some(target) = awaited(current) else {
            return Ok(open(awaited(start)));
        };
        let occupants = network.component(target)?.occupants();
        if occupants.is_empty() || !occupants.iter().all(|&o| awaited(o).is_some()) {
            return Ok(open(awaited(start)));
        }
        if !components.contains(&target) {
            components.push(target);
        }
        for &o in occupants {
            if !reached.contains(&o) {
                reached.push(o);
            }
        }
        i += 1;
    }

    let mut members: Vec<AgentId> = reached
        .into_iter()
        .filter(|&a| {
            agents
                .get(a.index())
                .and_then(|a| a.occupying)
                .is_some_and(|c| components.contains(&c))
        })
        .collect();
    members.sort_unstable();
    let member = members.contains(&start);
    Ok(WaitChain { agents: members, components, cyclic: true, member })
}
