use crate::config::JobConfig;
use crate::error::JobError;
use crate::model::PersistedItem;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_dynamodb as ddb;
use aws_sdk_dynamodb::model::AttributeValue;
use std::collections::HashMap;

/// Write side of the report table. Only `put_report` is needed; the job never reads back.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn put_report(&self, item: &PersistedItem) -> Result<(), JobError>;
}

pub struct DynamoReportStore {
    client: ddb::Client,
    table_name: String,
}

impl DynamoReportStore {
    pub async fn from_config(job_config: &JobConfig) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
        let config = aws_config::from_env().region(region_provider).load().await;
        let ddb_config = match &job_config.dynamodb_endpoint {
            Some(endpoint) => ddb::config::Builder::from(&config).endpoint_url(endpoint).build(),
            None => ddb::config::Builder::from(&config).build()
        };
        DynamoReportStore {
            client: ddb::Client::from_conf(ddb_config),
            table_name: job_config.table_name.to_owned(),
        }
    }
}

pub(crate) fn to_attributes(item: &PersistedItem) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (String::from("DriverEigyousyoId"), AttributeValue::N(item.driver_eigyousyo_id.to_string())),
        (String::from("DriverID"), AttributeValue::N(item.driver_id.to_string())),
        (String::from("DbID"), AttributeValue::N(item.db_id.to_string())),
        (String::from("LogData"), AttributeValue::S(item.log_data.to_owned())),
        (String::from("Timestamp"), AttributeValue::S(item.timestamp.to_owned())),
    ])
}

#[async_trait]
impl ReportStore for DynamoReportStore {
    async fn put_report(&self, item: &PersistedItem) -> Result<(), JobError> {
        self.client.put_item()
            .set_table_name(Some(self.table_name.to_owned()))
            .set_item(Some(to_attributes(item)))
            .send()
            .await
            .map_err(|e| JobError::Persistence {
                driver_id: item.driver_id,
                db_id: item.db_id,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[test]
fn test_item_attributes() {
    let item = PersistedItem {
        driver_eigyousyo_id: 3,
        driver_id: 1,
        db_id: 10,
        log_data: String::from("{\"DriverID\":1}"),
        timestamp: String::from("2024-05-01T00:00:00Z"),
    };
    let attrs = to_attributes(&item);
    assert_eq!(attrs.len(), 5);
    assert_eq!(attrs.get("DriverEigyousyoId"), Some(&AttributeValue::N(String::from("3"))));
    assert_eq!(attrs.get("DriverID"), Some(&AttributeValue::N(String::from("1"))));
    assert_eq!(attrs.get("DbID"), Some(&AttributeValue::N(String::from("10"))));
    assert_eq!(attrs.get("LogData"), Some(&AttributeValue::S(String::from("{\"DriverID\":1}"))));
    assert_eq!(attrs.get("Timestamp"), Some(&AttributeValue::S(String::from("2024-05-01T00:00:00Z"))));
}
