use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use tracing::info;

use crate::api::IngestError;
use crate::event::ProcessedRecord;
use crate::sinks::Record;

const DOC_TYPE: &str = "measure";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ClusterHealth {
    status: String,
}

#[derive(Deserialize)]
struct IndexResponse {
    result: String,
}

#[derive(Deserialize)]
struct EsErrorBody {
    error: EsError,
}

#[derive(Deserialize)]
struct EsError {
    #[serde(rename = "type")]
    kind: String,
}

/// Indexes one document per record into a single Elasticsearch index,
/// chosen at startup. No retries, no batching: a rejected document is
/// reported and the next record moves on.
pub struct ElasticSink {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl ElasticSink {
    /// Connects and logs the cluster status before any record flows.
    pub async fn new(base_url: &str, index: String) -> anyhow::Result<ElasticSink> {
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("connecting to elasticsearch at {base_url}...");

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let health: ClusterHealth = client
            .get(format!("{base_url}/_cluster/health"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(
            "connected to elasticsearch, cluster status: {}",
            health.status
        );

        Ok(ElasticSink {
            client,
            base_url,
            index,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Creates the target index. Running against an index that already
    /// exists must come up cleanly, so that rejection is swallowed.
    pub async fn ensure_index(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .put(format!("{}/{}", self.base_url, self.index))
            .send()
            .await?;

        if response.status().is_success() {
            info!("created index {}", self.index);
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let already_exists = serde_json::from_str::<EsErrorBody>(&body)
            .map(|parsed| parsed.error.kind == "resource_already_exists_exception")
            .unwrap_or(false);
        if already_exists {
            info!("index {} already exists", self.index);
            return Ok(());
        }

        anyhow::bail!("failed to create index {}: {status} {body}", self.index)
    }
}

#[async_trait]
impl Record for ElasticSink {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn send(&self, record: &ProcessedRecord) -> Result<(), IngestError> {
        let response = self
            .client
            .post(format!("{}/{}/{DOC_TYPE}", self.base_url, self.index))
            .json(&record.document())
            .send()
            .await
            .map_err(|e| IngestError::SinkError(format!("document store unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::SinkError(format!(
                "document store returned {status}"
            )));
        }

        let body: IndexResponse = response
            .json()
            .await
            .map_err(|e| IngestError::SinkError(format!("malformed store response: {e}")))?;
        if body.result != "created" {
            return Err(IngestError::SinkError(format!(
                "document was not created: {}",
                body.result
            )));
        }

        counter!("telemetry_records_ingested_total", "sink" => "elasticsearch").increment(1);
        Ok(())
    }
}
