use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EigyousyoResponse {
    #[serde(default)]
    pub results: Vec<EigyousyoInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EigyousyoInfo {
    pub eigyousyo_code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovementResponse {
    pub results: MovementResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovementResults {
    #[serde(default)]
    pub movement_basic_info: Vec<Movement>,
}

/// One (driver, vehicle, branch) triple whose daily report can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    #[serde(default)]
    pub driver_id: i64,
    /// Vehicle identifier; the upstream calls it the db id.
    #[serde(default)]
    pub db_id: i64,
    #[serde(default)]
    pub branch_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NippoReport {
    #[serde(default)]
    pub results: NippoResults,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NippoResults {
    pub movement_detail: MovementDetail,
    pub work_detail_list: Vec<WorkDetail>,
}

/// Distances and durations are passed through in whatever unit the upstream reports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementDetail {
    pub driver_eigyousyo_id: i64,
    pub road_running_distance: i64,
    pub loaded_distance: i64,
    pub empty_distance: i64,
    pub work_start_time: String,
    pub work_end_time: String,
    pub road_running_duration: i64,
    pub work_duration: i64,
    pub short_rest_duration: i64,
    pub rest_duration: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkDetail {
    pub start_distance: i64,
    pub end_distance: i64,
    pub start_time: String,
    pub end_time: String,
    pub record_name: String,
    pub loading_kind: i64,
    pub road_name: String,
}

/// What a report fetch task hands to the aggregator; `report` is `None` when the fetch failed.
#[derive(Debug)]
pub struct FetchResult {
    pub movement: Movement,
    pub report: Option<NippoReport>,
}

/// The subset of a report that gets stored as `LogData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportSummary {
    #[serde(rename = "DriverID")]
    pub driver_id: i64,
    #[serde(rename = "DbID")]
    pub db_id: i64,
    pub road_running_distance: i64,
    pub loaded_distance: i64,
    pub empty_distance: i64,
    pub work_start_time: String,
    pub work_end_time: String,
    pub road_running_duration: i64,
    pub work_duration: i64,
}

impl ReportSummary {
    pub fn new(movement: &Movement, report: &NippoReport) -> Self {
        let detail = &report.results.movement_detail;
        ReportSummary {
            driver_id: movement.driver_id,
            db_id: movement.db_id,
            road_running_distance: detail.road_running_distance,
            loaded_distance: detail.loaded_distance,
            empty_distance: detail.empty_distance,
            work_start_time: detail.work_start_time.to_owned(),
            work_end_time: detail.work_end_time.to_owned(),
            road_running_duration: detail.road_running_duration,
            work_duration: detail.work_duration,
        }
    }
}

/// One row of the report table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedItem {
    pub driver_eigyousyo_id: i64,
    pub driver_id: i64,
    pub db_id: i64,
    pub log_data: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT_BODY: &str = r#"{
        "results": {
            "movementDetail": {
                "driverEigyousyoId": 3,
                "roadRunningDistance": 120,
                "loadedDistance": 80,
                "emptyDistance": 40,
                "workStartTime": "2024-05-01 08:00:00",
                "workEndTime": "2024-05-01 17:30:00",
                "roadRunningDuration": 300,
                "workDuration": 570,
                "shortRestDuration": 15,
                "restDuration": 60
            },
            "workDetailList": [
                {
                    "startDistance": 0,
                    "endDistance": 35,
                    "startTime": "2024-05-01 08:10:00",
                    "endTime": "2024-05-01 09:00:00",
                    "recordName": "loading",
                    "loadingKind": 1,
                    "roadName": "Route 16"
                }
            ]
        }
    }"#;

    #[test]
    fn test_decode_report() {
        let report: NippoReport = serde_json::from_str(REPORT_BODY).unwrap();
        let detail = &report.results.movement_detail;
        assert_eq!(detail.driver_eigyousyo_id, 3);
        assert_eq!(detail.road_running_distance, 120);
        assert_eq!(detail.rest_duration, 60);
        assert_eq!(report.results.work_detail_list.len(), 1);
        assert_eq!(report.results.work_detail_list[0].road_name, "Route 16");
        assert_eq!(report.results.work_detail_list[0].loading_kind, 1);
    }

    #[test]
    fn test_missing_fields_decode_to_zero() {
        let report: NippoReport = serde_json::from_str(r#"{"results": {"movementDetail": {"loadedDistance": 5}}}"#).unwrap();
        assert_eq!(report.results.movement_detail.loaded_distance, 5);
        assert_eq!(report.results.movement_detail.work_start_time, "");
        assert!(report.results.work_detail_list.is_empty());
    }

    #[test]
    fn test_summary_field_names() {
        let report: NippoReport = serde_json::from_str(REPORT_BODY).unwrap();
        let movement = Movement { driver_id: 1, db_id: 10, branch_id: 1 };
        let summary = ReportSummary::new(&movement, &report);
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["DriverID"], 1);
        assert_eq!(json["DbID"], 10);
        assert_eq!(json["RoadRunningDistance"], 120);
        assert_eq!(json["WorkStartTime"], "2024-05-01 08:00:00");
        assert_eq!(json["WorkDuration"], 570);
        assert!(json.get("RestDuration").is_none());
    }

    #[test]
    fn test_missing_eigyousyo_results_is_empty() {
        let response: EigyousyoResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_decode_movements() {
        let body = r#"{"results": {"movementBasicInfo": [{"driverId": 1, "dbId": 10, "branchId": 2}]}}"#;
        let response: MovementResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.results.movement_basic_info, vec![Movement { driver_id: 1, db_id: 10, branch_id: 2 }]);
    }
}
