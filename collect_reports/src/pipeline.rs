use crate::api::ApiClient;
use crate::config::JobConfig;
use crate::error::JobError;
use crate::model::{FetchResult, Movement, NippoReport, PersistedItem, ReportSummary};
use crate::store::ReportStore;
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Rough number of drivers per eigyousyo, used only to size the result buffer.
const RESULTS_PER_SITE_ESTIMATE: usize = 10;

/// Tally of one run. Fetch and write failures are counted here as well as logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub sites: usize,
    pub sites_skipped: usize,
    pub fetches_launched: usize,
    pub persisted: usize,
    pub absent: usize,
    pub failed_writes: usize,
}

/// Runs one collection pass: token, eigyousyo codes, movements per code, then one
/// concurrent report fetch per movement, draining results into `store` as they arrive.
///
/// Only a token or eigyousyo listing failure returns `Err`; everything past that
/// point is logged and counted in the returned `JobOutcome`.
pub async fn run_job(config: &JobConfig, api: &ApiClient, store: &dyn ReportStore) -> Result<JobOutcome, JobError> {
    let token = api.get_access_token(&config.credentials).await?;
    info!("access token acquired");

    let codes = api.get_eigyousyo_codes(&token).await?;
    let mut outcome = JobOutcome { sites: codes.len(), ..Default::default() };

    let (tx, mut rx) = mpsc::channel::<FetchResult>((codes.len() * RESULTS_PER_SITE_ESTIMATE).max(1));
    let limiter = config.max_concurrent_fetches.map(|n| Arc::new(Semaphore::new(n)));
    let mut fetches = JoinSet::new();

    for code in &codes {
        let movements = match api.get_movements(&token, code).await {
            Ok(movements) => movements,
            Err(e) => {
                warn!(eigyousyo_code = %code, error = %e, "failed to get driver and db ids, skipping eigyousyo");
                outcome.sites_skipped += 1;
                continue;
            }
        };
        for movement in movements {
            outcome.fetches_launched += 1;
            fetches.spawn(fetch_nippo(api.clone(), token.clone(), movement, tx.clone(), limiter.clone()));
        }
    }
    // Each task holds its own sender, so the channel closes once the last fetch finishes.
    drop(tx);
    info!(launched = outcome.fetches_launched, "all report fetches launched");

    while let Some(result) = rx.recv().await {
        let movement = result.movement;
        match result.report {
            None => {
                warn!(driver_id = movement.driver_id, db_id = movement.db_id, "nippo data is missing, skipping");
                outcome.absent += 1;
            }
            Some(report) => match save_report(store, &movement, &report, Utc::now()).await {
                Ok(()) => {
                    info!(driver_id = movement.driver_id, db_id = movement.db_id, "saved report");
                    outcome.persisted += 1;
                }
                Err(e) => {
                    error!(driver_id = movement.driver_id, db_id = movement.db_id, error = %e, "failed to save report");
                    outcome.failed_writes += 1;
                }
            }
        }
    }

    while let Some(joined) = fetches.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "report fetch task did not complete");
            outcome.absent += 1;
        }
    }

    info!(
        sites = outcome.sites,
        sites_skipped = outcome.sites_skipped,
        launched = outcome.fetches_launched,
        persisted = outcome.persisted,
        absent = outcome.absent,
        failed_writes = outcome.failed_writes,
        "all results drained"
    );
    Ok(outcome)
}

/// Fetches one report and always sends exactly one result, with `report: None` on any failure.
async fn fetch_nippo(
    api: ApiClient,
    token: SecretString,
    movement: Movement,
    results: mpsc::Sender<FetchResult>,
    limiter: Option<Arc<Semaphore>>,
) {
    let permit = match limiter {
        Some(semaphore) => semaphore.acquire_owned().await.ok(),
        None => None
    };
    let report = match api.get_nippo(&token, &movement).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(error = %e, "report fetch failed");
            None
        }
    };
    drop(permit);

    if results.send(FetchResult { movement, report }).await.is_err() {
        debug!(driver_id = movement.driver_id, db_id = movement.db_id, "result receiver closed before send");
    }
}

pub fn to_persisted_item(movement: &Movement, report: &NippoReport, written_at: DateTime<Utc>) -> Result<PersistedItem, JobError> {
    let summary = ReportSummary::new(movement, report);
    let log_data = serde_json::to_string(&summary).map_err(|e| JobError::Persistence {
        driver_id: movement.driver_id,
        db_id: movement.db_id,
        reason: e.to_string(),
    })?;
    Ok(PersistedItem {
        driver_eigyousyo_id: report.results.movement_detail.driver_eigyousyo_id,
        driver_id: movement.driver_id,
        db_id: movement.db_id,
        log_data,
        timestamp: written_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

async fn save_report(store: &dyn ReportStore, movement: &Movement, report: &NippoReport, written_at: DateTime<Utc>) -> Result<(), JobError> {
    let item = to_persisted_item(movement, report, written_at)?;
    let detail = &report.results.movement_detail;
    info!(
        driver_id = item.driver_id,
        db_id = item.db_id,
        road_running_distance = detail.road_running_distance,
        loaded_distance = detail.loaded_distance,
        empty_distance = detail.empty_distance,
        work_start_time = %detail.work_start_time,
        work_end_time = %detail.work_end_time,
        road_running_duration = detail.road_running_duration,
        work_duration = detail.work_duration,
        work_details = report.results.work_detail_list.len(),
        "log data created"
    );
    store.put_report(&item).await
}
