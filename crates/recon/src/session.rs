//! Editing stage over a finished run.
//!
//! A session owns its records outright; edits never re-run the join. Only
//! `sent` and `note` can change.

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{MatchRecord, ReconOutcome, ReconSummary};

/// Edit addressed by business key rather than position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordEdit {
    pub invoice: String,
    pub order: String,
    pub sent: Option<bool>,
    pub note: Option<String>,
}

/// Result of [`ReconSession::apply_edits`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditReport {
    pub applied: usize,
    /// `invoice|order` of edits that matched no record.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReconSession {
    records: Vec<MatchRecord>,
}

impl ReconSession {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn set_sent(&mut self, index: usize, sent: bool) -> Result<(), ReconError> {
        self.record_mut(index)?.sent = sent;
        Ok(())
    }

    pub fn set_note(&mut self, index: usize, note: impl Into<String>) -> Result<(), ReconError> {
        self.record_mut(index)?.note = note.into();
        Ok(())
    }

    /// Apply edits by (invoice, order). Every record with that key is
    /// updated; after deduplication there is at most one.
    pub fn apply_edits(&mut self, edits: &[RecordEdit]) -> EditReport {
        let mut report = EditReport::default();
        for edit in edits {
            let mut hit = false;
            for record in self
                .records
                .iter_mut()
                .filter(|r| r.invoice == edit.invoice && r.order == edit.order)
            {
                if let Some(sent) = edit.sent {
                    record.sent = sent;
                }
                if let Some(ref note) = edit.note {
                    record.note = note.clone();
                }
                hit = true;
            }
            if hit {
                report.applied += 1;
            } else {
                report.unknown.push(format!("{}|{}", edit.invoice, edit.order));
            }
        }
        if !report.unknown.is_empty() {
            log::warn!("{} edit(s) matched no record: {}", report.unknown.len(), report.unknown.join(", "));
        }
        report
    }

    pub fn summary(&self) -> ReconSummary {
        compute_summary(&self.records)
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut MatchRecord, ReconError> {
        let len = self.records.len();
        self.records
            .get_mut(index)
            .ok_or(ReconError::EditOutOfRange { index, len })
    }
}

impl From<ReconOutcome> for ReconSession {
    fn from(outcome: ReconOutcome) -> Self {
        Self::new(outcome.records)
    }
}

/// Report counters for the summary sheet.
pub fn compute_summary(records: &[MatchRecord]) -> ReconSummary {
    let total = records.len();
    let sent = records.iter().filter(|r| r.sent).count();
    ReconSummary {
        total,
        sent,
        pending: total - sent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn record(invoice: &str, order: &str) -> MatchRecord {
        MatchRecord::new(
            invoice.into(),
            order.into(),
            "Acme".into(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    fn session(n: usize) -> ReconSession {
        ReconSession::new((0..n).map(|i| record(&i.to_string(), "1")).collect())
    }

    #[test]
    fn new_records_count_as_sent() {
        let s = session(3);
        assert_eq!(s.summary(), ReconSummary { total: 3, sent: 3, pending: 0 });
    }

    #[test]
    fn unchecking_sent_moves_to_pending() {
        let mut s = session(3);
        s.set_sent(1, false).unwrap();
        s.set_note(1, "transportadora atrasou").unwrap();
        assert_eq!(s.summary(), ReconSummary { total: 3, sent: 2, pending: 1 });
        assert_eq!(s.records()[1].note, "transportadora atrasou");
        assert!(!s.records()[1].sent);
    }

    #[test]
    fn out_of_range_edit_is_an_error() {
        let mut s = session(1);
        let err = s.set_sent(5, false).unwrap_err();
        assert!(matches!(err, ReconError::EditOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn edits_by_key() {
        let mut s = ReconSession::new(vec![record("10", "1"), record("11", "2")]);
        let report = s.apply_edits(&[
            RecordEdit {
                invoice: "11".into(),
                order: "2".into(),
                sent: Some(false),
                note: Some("devolvido".into()),
            },
            RecordEdit {
                invoice: "99".into(),
                order: "9".into(),
                sent: Some(false),
                note: None,
            },
        ]);
        assert_eq!(report.applied, 1);
        assert_eq!(report.unknown, vec!["99|9".to_string()]);
        assert!(s.records()[0].sent);
        assert!(!s.records()[1].sent);
        assert_eq!(s.records()[1].note, "devolvido");
    }

    #[test]
    fn edit_without_fields_leaves_record_unchanged() {
        let mut s = ReconSession::new(vec![record("10", "1")]);
        let before = s.records().to_vec();
        s.apply_edits(&[RecordEdit {
            invoice: "10".into(),
            order: "1".into(),
            ..Default::default()
        }]);
        assert_eq!(s.records(), before.as_slice());
    }

    proptest! {
        #[test]
        fn counters_always_add_up(n in 0usize..20, flips in proptest::collection::vec((0usize..20, any::<bool>()), 0..40)) {
            let mut s = session(n);
            for (idx, sent) in flips {
                let _ = s.set_sent(idx, sent);
            }
            let summary = s.summary();
            prop_assert_eq!(summary.total, n);
            prop_assert_eq!(summary.sent + summary.pending, summary.total);
        }
    }
}
