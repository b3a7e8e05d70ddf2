//! Where a finished debate's result goes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ReportError;
use crate::feedback::FinalResult;

/// Persists or publishes the final result. Called once per session.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    async fn save(&self, result: &FinalResult) -> Result<(), ReportError>;
}

/// Writes the result to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl ResultReporter for LogReporter {
    async fn save(&self, result: &FinalResult) -> Result<(), ReportError> {
        info!(
            session = %result.session_id,
            human_score = result.human_score,
            opponent_score = result.opponent_score,
            winner = result.winner.display_name(),
            "debate result"
        );
        Ok(())
    }
}

/// Saves each result as pretty-printed JSON in a history directory.
#[derive(Debug, Clone)]
pub struct JsonFileReporter {
    dir: PathBuf,
}

impl JsonFileReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, result: &FinalResult) -> PathBuf {
        self.dir.join(format!("debate-{}.json", result.session_id))
    }
}

#[async_trait]
impl ResultReporter for JsonFileReporter {
    async fn save(&self, result: &FinalResult) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(result)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(result);
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "saved debate result");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FallbackScores, FeedbackLedger};
    use uuid::Uuid;

    fn result() -> FinalResult {
        let ledger = FeedbackLedger::new(FallbackScores::default());
        FinalResult::from_ledger(Uuid::new_v4(), "Ban it?", &ledger)
    }

    #[tokio::test]
    async fn test_json_reporter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = JsonFileReporter::new(dir.path().join("history"));
        let result = result();

        reporter.save(&result).await.unwrap();

        let saved = std::fs::read_to_string(reporter.path_for(&result)).unwrap();
        let parsed: FinalResult = serde_json::from_str(&saved).unwrap();
        assert_eq!(parsed, result);
    }

    #[tokio::test]
    async fn test_json_reporter_fails_on_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let reporter = JsonFileReporter::new(&blocker);
        assert!(matches!(
            reporter.save(&result()).await,
            Err(ReportError::Io(_))
        ));
    }
}
