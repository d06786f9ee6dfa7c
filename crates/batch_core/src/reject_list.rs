use batch_logging::batch_warn;

use crate::canonical::Canonicalizer;
use crate::record::{OriginId, RejectRecord};

/// Ordered reject records, unique by URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RejectList {
    records: Vec<RejectRecord>,
}

impl RejectList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses newline separated records. Blank lines are ignored and invalid
    /// records are dropped with a warning.
    pub fn parse(text: &str, canonicalizer: Option<&dyn Canonicalizer>) -> Self {
        let mut list = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = RejectRecord::decode(line, canonicalizer);
            if !record.valid {
                batch_warn!("Dropping invalid reject record on line {}: {:?}", lineno + 1, line);
                continue;
            }
            list.upsert(record);
        }
        list
    }

    /// One encoded line per record, newline terminated.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for record in &self.records {
            text.push_str(&record.encode());
            text.push('\n');
        }
        text
    }

    /// Inserts `record`, replacing an existing record with the same URL in
    /// place. Invalid records are refused; returns whether it was stored.
    pub fn upsert(&mut self, record: RejectRecord) -> bool {
        if !record.valid {
            return false;
        }
        match self.records.iter_mut().find(|existing| existing.url == record.url) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        true
    }

    pub fn find(&self, url: &str) -> Option<&RejectRecord> {
        self.records.iter().find(|record| record.url == url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.find(url).is_some()
    }

    pub fn remove(&mut self, url: &str) -> Option<RejectRecord> {
        let position = self.records.iter().position(|record| record.url == url)?;
        Some(self.records.remove(position))
    }

    /// Origin ids of the records that carry one, in list order.
    pub fn origin_ids(&self) -> Vec<OriginId> {
        self.records.iter().filter_map(|record| record.origin_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RejectRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RejectRecord> for RejectList {
    fn from_iter<I: IntoIterator<Item = RejectRecord>>(iter: I) -> Self {
        let mut list = Self::new();
        for record in iter {
            list.upsert(record);
        }
        list
    }
}

impl IntoIterator for RejectList {
    type Item = RejectRecord;
    type IntoIter = std::vec::IntoIter<RejectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
