//! Kubeflow Pipelines REST API client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::ProviderError;
use crate::providers::check_response;

/// The resource type of a reference to a recurring job.
pub const RESOURCE_TYPE_JOB: &str = "JOB";
/// The resource type of a reference to a namespace.
pub const RESOURCE_TYPE_NAMESPACE: &str = "NAMESPACE";
/// The relationship of a job which created a run.
pub const RELATIONSHIP_CREATOR: &str = "CREATOR";
/// The relationship of a namespace which owns a run.
pub const RELATIONSHIP_OWNER: &str = "OWNER";

/// The subset of the KFP API which is used to resolve run identities.
#[async_trait]
pub trait KfpApi: Send + Sync + 'static {
    /// Fetch a run by id.
    async fn get_run(&self, run_id: &str) -> Result<ApiRun, ProviderError>;
    /// Fetch a recurring job by id.
    async fn get_job(&self, job_id: &str) -> Result<ApiJob, ProviderError>;
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunDetail {
    #[serde(default)]
    pub run: ApiRun,
}

/// A KFP run record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ApiRun {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
}

/// A KFP recurring job record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ApiJob {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A relationship between a run and another KFP resource.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ResourceReference {
    #[serde(default)]
    pub key: ResourceKey,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ResourceKey {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
}

impl ResourceReference {
    /// True if this reference is of the given type and relationship.
    pub fn is(&self, kind: &str, relationship: &str) -> bool {
        self.key.kind == kind && self.relationship == relationship
    }
}

/// Deserialize a timestamp, treating the zero timestamp as absent.
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let val: Option<DateTime<Utc>> = Deserialize::deserialize(deserializer)?;
    Ok(val.filter(|ts| ts.timestamp() > 0))
}

/// A KFP API client using the v1beta1 REST endpoints.
pub struct RestKfpApi {
    client: reqwest::Client,
    address: String,
}

impl RestKfpApi {
    /// Create a new instance targeting the given API address.
    pub fn new(address: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("error building KFP API HTTP client")?;
        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl KfpApi for RestKfpApi {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_run(&self, run_id: &str) -> Result<ApiRun, ProviderError> {
        let url = format!("{}/apis/v1beta1/runs/{}", self.address, run_id);
        let res = check_response(self.client.get(&url).send().await?, "KFP GetRun").await?;
        let detail: RunDetail = res.json().await?;
        Ok(detail.run)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_job(&self, job_id: &str) -> Result<ApiJob, ProviderError> {
        let url = format!("{}/apis/v1beta1/jobs/{}", self.address, job_id);
        let res = check_response(self.client.get(&url).send().await?, "KFP GetJob").await?;
        Ok(res.json().await?)
    }
}
