use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Which listing call an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Directory,
    Movement,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Directory => write!(f, "eigyousyo info"),
            Stage::Movement => write!(f, "dailyreport movement"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("missing or invalid configuration: {0}")]
    Config(String),

    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("{stage} request failed: {reason}")]
    Upstream { stage: Stage, reason: String },

    #[error("report fetch failed for driver {driver_id}, db {db_id}: {reason}")]
    Fetch { driver_id: i64, db_id: i64, reason: String },

    #[error("failed to save report for driver {driver_id}, db {db_id}: {reason}")]
    Persistence { driver_id: i64, db_id: i64, reason: String },
}

impl JobError {
    pub(crate) fn upstream(stage: Stage, reason: impl ToString) -> Self {
        JobError::Upstream { stage, reason: reason.to_string() }
    }

    /// Only token and site-listing failures abort the whole job.
    pub fn is_fatal(&self) -> bool {
        match self {
            JobError::Config(_) | JobError::Client(_) | JobError::Auth(_) => true,
            JobError::Upstream { stage, .. } => *stage == Stage::Directory,
            JobError::Fetch { .. } | JobError::Persistence { .. } => false,
        }
    }
}

#[test]
fn test_fatal_kinds() {
    assert!(JobError::Auth("no token".to_string()).is_fatal());
    assert!(JobError::upstream(Stage::Directory, "received status code 500").is_fatal());
    assert!(!JobError::upstream(Stage::Movement, "received status code 404").is_fatal());
    assert_eq!(
        JobError::upstream(Stage::Directory, "received status code 500").to_string(),
        "eigyousyo info request failed: received status code 500"
    );
    assert!(!JobError::Fetch { driver_id: 1, db_id: 10, reason: "timeout".to_string() }.is_fatal());
}
