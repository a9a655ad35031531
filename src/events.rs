use super::*;

/// A click binding. Each bound handler carries exactly one listener for the
/// lifetime of the page; the fold node it points at decides the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Listener {
    pub(crate) fold: FoldId,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    /// Returns false when the same listener is already registered.
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, listener: Listener) -> bool {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn has(&self, node_id: NodeId, event: &str) -> bool {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .is_some_and(|listeners| !listeners.is_empty())
    }

    pub(crate) fn bound_nodes(&self, event: &str) -> usize {
        self.map
            .values()
            .filter(|events| events.get(event).is_some_and(|l| !l.is_empty()))
            .count()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) handled: usize,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            handled: 0,
        }
    }
}
