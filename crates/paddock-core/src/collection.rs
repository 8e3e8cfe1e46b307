//! Status-partitioned local collection keyed by external identifier.

use std::collections::HashMap;

use tracing::warn;

use crate::{HorseStatus, LocalRecord};

/// All locally tracked horses of one status.
///
/// Records keep their insertion order. An index from external id to
/// position guarantees that at most one record references a given external
/// horse.
#[derive(Debug, Clone)]
pub struct HorseCollection {
    status: HorseStatus,
    records: Vec<LocalRecord>,
    by_external_id: HashMap<String, usize>,
}

impl HorseCollection {
    pub fn new(status: HorseStatus) -> Self {
        Self {
            status,
            records: Vec::new(),
            by_external_id: HashMap::new(),
        }
    }

    /// Builds a collection from persisted records.
    ///
    /// Records stored with a different status are re-tagged. If several
    /// stored records share an external id, the first one keeps the link and
    /// the others are kept as unlinked local records.
    pub fn from_records(status: HorseStatus, records: Vec<LocalRecord>) -> Self {
        let mut collection = Self::new(status);
        for mut record in records {
            record.status = status;
            if let Some(external_id) = record.external_id.as_deref() {
                if collection.by_external_id.contains_key(external_id) {
                    warn!(
                        status = %status,
                        external_id,
                        local_id = %record.id,
                        "Duplicate external id in stored collection, unlinking record"
                    );
                    record.external_id = None;
                }
            }
            collection.push(record);
        }
        collection
    }

    pub fn status(&self) -> HorseStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LocalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LocalRecord> {
        self.records
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Option<&LocalRecord> {
        self.by_external_id
            .get(external_id)
            .map(|&idx| &self.records[idx])
    }

    pub(crate) fn find_by_external_id_mut(&mut self, external_id: &str) -> Option<&mut LocalRecord> {
        match self.by_external_id.get(external_id) {
            Some(&idx) => self.records.get_mut(idx),
            None => None,
        }
    }

    /// Appends a record, indexing its external id.
    ///
    /// Callers must check that the external id is not already present.
    pub(crate) fn push(&mut self, record: LocalRecord) {
        if let Some(external_id) = &record.external_id {
            self.by_external_id
                .insert(external_id.clone(), self.records.len());
        }
        self.records.push(record);
    }
}
