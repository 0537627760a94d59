//! Tracking for multi-document write sequences.
//!
//! The store has no transaction spanning documents, so operations such as
//! approving a join request are a chain of independent writes. A
//! [`SagaTracker`] records which steps committed; when a later step fails
//! after an earlier one committed, it logs a [`PartialConsistencyWarning`].
//! Nothing is rolled back. Every step is written to be idempotent so the
//! caller can re-invoke the whole operation from any partial state.

use std::fmt;

use log::warn;

use crate::errors::{Error, Result};

/// Logged (never returned) when a saga stops after committing some steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialConsistencyWarning {
    pub saga: &'static str,
    pub subject: String,
    pub committed: Vec<&'static str>,
    pub failed_step: &'static str,
    pub cause: String,
}

impl fmt::Display for PartialConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "saga '{}' for {} left partially applied: committed [{}], failed at '{}': {}",
            self.saga,
            self.subject,
            self.committed.join(", "),
            self.failed_step,
            self.cause
        )
    }
}

/// Records committed steps of one saga run.
#[derive(Debug)]
pub struct SagaTracker {
    saga: &'static str,
    subject: String,
    committed: Vec<&'static str>,
    warnings: Vec<PartialConsistencyWarning>,
}

impl SagaTracker {
    pub fn new(saga: &'static str, subject: impl Into<String>) -> Self {
        Self {
            saga,
            subject: subject.into(),
            committed: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records the outcome of `step`, passing the result through.
    pub fn record<T>(&mut self, step: &'static str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.committed.push(step);
                Ok(value)
            }
            Err(err) => {
                self.note_failure(step, &err);
                Err(err)
            }
        }
    }

    /// Like [`record`](Self::record) but swallows the failure after logging.
    ///
    /// Used for trailing best-effort steps whose failure must not change the
    /// outcome of the primary write.
    pub fn record_best_effort<T>(&mut self, step: &'static str, result: Result<T>) -> Option<T> {
        match self.record(step, result) {
            Ok(value) => Some(value),
            Err(_) => None,
        }
    }

    fn note_failure(&mut self, step: &'static str, err: &Error) {
        if self.committed.is_empty() {
            return;
        }
        let warning = PartialConsistencyWarning {
            saga: self.saga,
            subject: self.subject.clone(),
            committed: self.committed.clone(),
            failed_step: step,
            cause: err.to_string(),
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn committed(&self) -> &[&'static str] {
        &self.committed
    }

    pub fn warnings(&self) -> &[PartialConsistencyWarning] {
        &self.warnings
    }

    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DatabaseError;

    fn transport_err() -> Error {
        Error::Database(DatabaseError::QueryFailed("connection reset".to_string()))
    }

    #[test]
    fn test_failure_before_any_commit_is_not_partial() {
        let mut saga = SagaTracker::new("approve", "q1/x");
        let result: Result<()> = saga.record("add_participant", Err(transport_err()));
        assert!(result.is_err());
        assert!(!saga.is_partial());
    }

    #[test]
    fn test_failure_after_commit_produces_warning() {
        let mut saga = SagaTracker::new("approve", "q1/x");
        saga.record("add_participant", Ok(())).unwrap();
        saga.record("remove_join_request", Ok(())).unwrap();
        let _ = saga.record::<()>("increment_joined", Err(transport_err()));

        assert!(saga.is_partial());
        let warning = &saga.warnings()[0];
        assert_eq!(warning.committed, vec!["add_participant", "remove_join_request"]);
        assert_eq!(warning.failed_step, "increment_joined");
        assert!(warning.to_string().contains("q1/x"));
    }

    #[test]
    fn test_best_effort_swallows_error() {
        let mut saga = SagaTracker::new("give_badge", "b1");
        saga.record("append_badge", Ok(())).unwrap();
        let out: Option<()> = saga.record_best_effort("recompute", Err(transport_err()));
        assert!(out.is_none());
        assert_eq!(saga.committed(), &["append_badge"]);
        assert!(saga.is_partial());
    }
}
