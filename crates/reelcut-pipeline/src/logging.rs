//! Structured run logging utilities.
//!
//! Every pipeline run logs with its run id and current stage attached, so
//! interleaved runs stay separable in JSON logs.

use tracing::{error, info, warn, Span};

use reelcut_models::RunId;

use crate::error::Stage;

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: &'static str,
}

impl RunLogger {
    pub fn new(run_id: &RunId) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: "run",
        }
    }

    /// Logger for the same run, tagged with `stage`.
    pub fn for_stage(&self, stage: Stage) -> Self {
        Self {
            run_id: self.run_id.clone(),
            stage: stage.as_str(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, stage = self.stage, "Warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, stage = self.stage, "Error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, stage = self.stage, "Completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Span carrying the run id, for attaching to async work.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, stage = self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_stages() {
        let run_id = RunId::from("20240101120000");
        let logger = RunLogger::new(&run_id);
        assert_eq!(logger.run_id(), "20240101120000");
        assert_eq!(logger.stage(), "run");

        let transcribe = logger.for_stage(Stage::Transcribe);
        assert_eq!(transcribe.run_id(), "20240101120000");
        assert_eq!(transcribe.stage(), "transcribe");
    }

    #[test]
    fn test_logging_without_subscriber_is_noop() {
        let logger = RunLogger::new(&RunId::from("r")).for_stage(Stage::Assemble);
        logger.log_start("a");
        logger.log_progress("b");
        logger.log_warning("c");
        logger.log_error("d");
        logger.log_completion("e");
        let _guard = logger.create_span().entered();
    }
}
