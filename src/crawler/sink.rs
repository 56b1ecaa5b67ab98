//! In-memory collection of discovered accounts
//!
//! The sink only grows. It remembers how many records were last written to
//! disk so the status reporter can persist on growth and nothing else.

use crate::model::DiscoveredAccount;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ResultSink {
    records: Vec<DiscoveredAccount>,
    account_ids: HashSet<String>,
    persisted_len: usize,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads records already on disk (the seed list)
    ///
    /// Preloaded records count as persisted, so they never trigger a write by
    /// themselves.
    pub fn preload(&mut self, records: impl IntoIterator<Item = DiscoveredAccount>) {
        for record in records {
            self.record(record);
        }
        self.persisted_len = self.records.len();
    }

    /// Appends a record unless its account is already present
    ///
    /// Returns true when the sink grew.
    pub fn record(&mut self, record: DiscoveredAccount) -> bool {
        if !self.account_ids.insert(record.account_id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DiscoveredAccount] {
        &self.records
    }

    /// Records to write when the sink grew since the last successful write
    pub fn unpersisted(&self) -> Option<Vec<DiscoveredAccount>> {
        (self.records.len() > self.persisted_len).then(|| self.records.clone())
    }

    /// Remembers `len` as the size of the file on disk
    pub fn mark_persisted(&mut self, len: usize) {
        self.persisted_len = self.persisted_len.max(len);
    }

    #[cfg(test)]
    pub fn persisted_len(&self) -> usize {
        self.persisted_len
    }
}
