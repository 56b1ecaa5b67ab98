//! Seen-before sets guarding the three job types
//!
//! Membership is permanent for the process lifetime; nothing is ever removed.

use std::collections::HashSet;

/// Three independent append-only membership sets
#[derive(Debug, Default)]
pub struct DedupRegistry {
    /// Account ids scheduled for inspection from match reports
    inspected: HashSet<String>,

    /// Account ids scheduled for a history fetch
    history_fetched: HashSet<String>,

    /// Match ids scheduled for a report fetch
    report_fetched: HashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an account for inspection; returns false if it was already marked
    pub fn mark_inspected(&mut self, account_id: &str) -> bool {
        mark(&mut self.inspected, account_id)
    }

    /// Marks an account for a history fetch; returns false if it was already marked
    pub fn mark_history(&mut self, account_id: &str) -> bool {
        mark(&mut self.history_fetched, account_id)
    }

    /// Marks a match for a report fetch; returns false if it was already marked
    pub fn mark_report(&mut self, match_id: &str) -> bool {
        mark(&mut self.report_fetched, match_id)
    }

    #[cfg(test)]
    pub fn is_inspected(&self, account_id: &str) -> bool {
        self.inspected.contains(account_id)
    }

    pub fn inspected_count(&self) -> usize {
        self.inspected.len()
    }

    #[cfg(test)]
    pub fn history_count(&self) -> usize {
        self.history_fetched.len()
    }

    #[cfg(test)]
    pub fn report_count(&self) -> usize {
        self.report_fetched.len()
    }
}

fn mark(set: &mut HashSet<String>, id: &str) -> bool {
    if set.contains(id) {
        return false;
    }
    set.insert(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_once() {
        let mut registry = DedupRegistry::new();

        assert!(registry.mark_history("A"));
        assert!(!registry.mark_history("A"));
        assert!(registry.mark_report("M1"));
        assert!(!registry.mark_report("M1"));
        assert!(registry.mark_inspected("A"));
        assert!(!registry.mark_inspected("A"));
    }

    #[test]
    fn test_sets_are_independent() {
        let mut registry = DedupRegistry::new();

        assert!(registry.mark_inspected("X"));
        assert!(registry.mark_history("X"));
        assert!(registry.mark_report("X"));

        assert_eq!(registry.inspected_count(), 1);
        assert_eq!(registry.history_count(), 1);
        assert_eq!(registry.report_count(), 1);
        assert!(registry.is_inspected("X"));
        assert!(!registry.is_inspected("Y"));
    }
}
