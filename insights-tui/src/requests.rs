//! Request identifiers for discarding stale backend responses.
//!
//! Each outgoing call gets the next id for its kind. A response is applied
//! only if its id is still the latest issued for that kind, so a slow
//! earlier call can never overwrite the result of a later one.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Tasks,
    Summary,
    Emotion,
    Relevance,
}

impl RequestKind {
    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::Tasks => "tasks",
            RequestKind::Summary => "summary",
            RequestKind::Emotion => "emotion",
            RequestKind::Relevance => "relevance",
        }
    }
}

/// Monotonic id of one backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Default)]
pub struct RequestTracker {
    next: u64,
    latest: HashMap<RequestKind, RequestId>,
}

impl RequestTracker {
    /// Issue a new id; it becomes the only current one for `kind`.
    pub fn issue(&mut self, kind: RequestKind) -> RequestId {
        self.next += 1;
        let id = RequestId(self.next);
        self.latest.insert(kind, id);
        id
    }

    pub fn is_current(&self, kind: RequestKind, id: RequestId) -> bool {
        self.latest.get(&kind) == Some(&id)
    }

    /// Accept a response once: true if current, and the kind is then settled
    /// so a duplicate delivery is ignored.
    pub fn settle(&mut self, kind: RequestKind, id: RequestId) -> bool {
        if self.is_current(kind, id) {
            self.latest.remove(&kind);
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self, kind: RequestKind) -> bool {
        self.latest.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_request_wins() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue(RequestKind::Emotion);
        let second = tracker.issue(RequestKind::Emotion);

        assert!(!tracker.settle(RequestKind::Emotion, first));
        assert!(tracker.settle(RequestKind::Emotion, second));
        assert!(!tracker.in_flight(RequestKind::Emotion));
    }

    #[test]
    fn kinds_are_independent() {
        let mut tracker = RequestTracker::default();
        let tasks = tracker.issue(RequestKind::Tasks);
        let relevance = tracker.issue(RequestKind::Relevance);
        assert!(tracker.is_current(RequestKind::Tasks, tasks));
        assert!(tracker.settle(RequestKind::Relevance, relevance));
        assert!(tracker.in_flight(RequestKind::Tasks));
    }

    #[test]
    fn duplicate_delivery_is_ignored() {
        let mut tracker = RequestTracker::default();
        let id = tracker.issue(RequestKind::Summary);
        assert!(tracker.settle(RequestKind::Summary, id));
        assert!(!tracker.settle(RequestKind::Summary, id));
    }
}
