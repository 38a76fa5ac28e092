pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod store;

use aws_lambda_events::event::cloudwatch_events::CloudWatchEvent;
use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info};

pub use api::ApiClient;
pub use config::{Credentials, JobConfig};
pub use error::{JobError, Stage};
pub use model::{Movement, NippoReport, PersistedItem, ReportSummary};
pub use pipeline::{run_job, JobOutcome};
pub use store::{DynamoReportStore, ReportStore};

/// Scheduled entry point. The event payload is ignored.
///
/// An aborted job is logged and still reported as a successful invocation, so the
/// scheduler's async retry does not re-run a collection that already wrote rows.
pub async fn function_handler(_event: LambdaEvent<CloudWatchEvent>) -> Result<(), Error> {
    let config = JobConfig::from_env()?;
    let api = ApiClient::new(http::build_http_client()?, &config);
    let store = DynamoReportStore::from_config(&config).await;

    match run_job(&config, &api, &store).await {
        Ok(outcome) => info!(
            persisted = outcome.persisted,
            absent = outcome.absent,
            failed_writes = outcome.failed_writes,
            "collection completed"
        ),
        Err(e) => error!(error = %e, "collection aborted"),
    }
    Ok(())
}
