//! The `ExposureWriter` trait implemented by all backend writers.

use az_exposure::StepRecord;

use crate::OutputResult;

/// Backend-agnostic exposure log writer.
///
/// Implementations must leave every already-written step durable after each
/// [`write_step`](Self::write_step) returns — the orchestrator relies on
/// that for orderly shutdown after a mid-run failure.
pub trait ExposureWriter {
    /// Persist one step's record.
    fn write_step(&mut self, record: &StepRecord) -> OutputResult<()>;

    /// Flush and close the backend.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
