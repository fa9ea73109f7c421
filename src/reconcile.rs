//! Poll-driven reconciliation of the rendered table against the server.
//!
//! Every tick issues a tagged record fetch. Fetches may overlap, so a
//! completion only applies if it was issued after the last applied one.
//! An applied list that equals what is already rendered is a no-op.

use tracing::debug;

use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Superseded by a newer completion, or issued before a clear.
    Stale,
    Unchanged,
    Rebuilt { rows: usize },
}

#[derive(Debug, Default)]
pub struct Reconciler {
    rows: Vec<Record>,
    issued: u64,
    applied: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tag for a new record fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn apply(&mut self, seq: u64, records: Vec<Record>) -> Reconciled {
        if seq <= self.applied {
            debug!(seq, applied = self.applied, "dropping stale record list");
            return Reconciled::Stale;
        }
        self.applied = seq;
        if records.len() == self.rows.len() && records == self.rows {
            return Reconciled::Unchanged;
        }
        self.rows = records;
        Reconciled::Rebuilt {
            rows: self.rows.len(),
        }
    }

    /// Drops every row and invalidates all fetches issued so far.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.applied = self.issued;
    }
}

pub fn counter_label(rows: usize) -> String {
    format!("Packets captured: {rows}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) fn records(count: usize) -> Vec<Record> {
        (0..count).map(record).collect()
    }

    pub(crate) fn record(index: usize) -> Record {
        Record {
            no: index as u64 + 1,
            time: format!("12:00:{:02}.000", index % 60),
            src: "10.0.0.5".to_string(),
            dst: "93.184.216.34".to_string(),
            protocol: "TCP".to_string(),
            length: 60 + index as u64,
            info: format!("Ether / IP / TCP 10.0.0.5:{} > 93.184.216.34:https S", 40000 + index),
        }
    }

    #[test]
    fn rendered_count_follows_latest_fetch() {
        let mut reconciler = Reconciler::new();
        let mut outcomes = Vec::new();
        for count in [0, 3, 3, 7] {
            let seq = reconciler.begin_fetch();
            outcomes.push(reconciler.apply(seq, records(count)));
            assert_eq!(reconciler.len(), count);
            assert_eq!(counter_label(reconciler.len()), format!("Packets captured: {count}"));
        }
        assert_eq!(
            outcomes,
            vec![
                Reconciled::Unchanged,
                Reconciled::Rebuilt { rows: 3 },
                Reconciled::Unchanged,
                Reconciled::Rebuilt { rows: 7 },
            ]
        );
    }

    #[test]
    fn same_length_different_content_rebuilds() {
        let mut reconciler = Reconciler::new();
        let seq = reconciler.begin_fetch();
        reconciler.apply(seq, records(2));
        let mut changed = records(2);
        changed[1].info = "rewritten".to_string();
        let seq = reconciler.begin_fetch();
        assert_eq!(reconciler.apply(seq, changed), Reconciled::Rebuilt { rows: 2 });
        assert_eq!(reconciler.rows()[1].info, "rewritten");
    }

    #[test]
    fn overlapping_fetches_keep_newest() {
        let mut reconciler = Reconciler::new();
        let first = reconciler.begin_fetch();
        let second = reconciler.begin_fetch();
        assert_eq!(reconciler.apply(second, records(9)), Reconciled::Rebuilt { rows: 9 });
        assert_eq!(reconciler.apply(first, records(4)), Reconciled::Stale);
        assert_eq!(reconciler.len(), 9);
    }

    #[test]
    fn clear_invalidates_in_flight_fetches() {
        let mut reconciler = Reconciler::new();
        let seq = reconciler.begin_fetch();
        reconciler.apply(seq, records(5));
        let in_flight = reconciler.begin_fetch();
        reconciler.clear();
        assert_eq!(reconciler.apply(in_flight, records(6)), Reconciled::Stale);
        assert!(reconciler.is_empty());
        let next = reconciler.begin_fetch();
        assert_eq!(reconciler.apply(next, records(1)), Reconciled::Rebuilt { rows: 1 });
    }
}
