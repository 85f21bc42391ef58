//! Jobicy adapter (remote job listings via RapidAPI).
//!
//! Implements the `rjb-core` `JobSearch` port over `GET /api/v2/remote-jobs`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use rjb_core::{
    config::Config,
    errors::Error,
    search::{JobQuery, JobSearch, ListingRecord},
    Result,
};

#[derive(Clone, Debug)]
pub struct JobicyConfig {
    pub base_url: String,
    pub host: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl JobicyConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.jobicy_base_url.clone(),
            host: cfg.jobicy_host.clone(),
            api_key: cfg.rapidapi_key.clone(),
            timeout: cfg.search_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct JobicyClient {
    cfg: JobicyConfig,
    http: reqwest::Client,
}

impl JobicyClient {
    pub fn new(cfg: JobicyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::Config(format!("jobicy http client: {e}")))?;
        Ok(Self { cfg, http })
    }
}

#[async_trait]
impl JobSearch for JobicyClient {
    async fn search(&self, query: &JobQuery) -> Result<Vec<ListingRecord>> {
        let mut params: Vec<(&str, String)> = vec![("count", query.count.to_string())];
        for (key, value) in [
            ("geo", &query.geo),
            ("industry", &query.industry),
            ("tag", &query.tag),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        }

        let resp = self
            .http
            .get(&self.cfg.base_url)
            .query(&params)
            .header("X-RapidAPI-Key", &self.cfg.api_key)
            .header("X-RapidAPI-Host", &self.cfg.host)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("jobicy request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("jobicy read error: {e}")))?;

        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "jobicy API error (status {}): {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let records = parse_jobs(&body)?;
        debug!(count = records.len(), requested = query.count, "jobicy search done");
        Ok(records)
    }
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<RawJob>,
}

/// Wire shape of one job. Every field is optional and tolerant of number-vs-string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJob {
    #[serde(default, deserialize_with = "opaque")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    url: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    job_title: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    company_name: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    job_geo: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    job_level: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    job_excerpt: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub_date: Option<String>,
    #[serde(
        default,
        rename = "salary_min",
        alias = "salaryMin",
        alias = "annualSalaryMin",
        deserialize_with = "opaque"
    )]
    salary_min: Option<String>,
    #[serde(
        default,
        rename = "salary_max",
        alias = "salaryMax",
        alias = "annualSalaryMax",
        deserialize_with = "opaque"
    )]
    salary_max: Option<String>,
}

impl From<RawJob> for ListingRecord {
    fn from(raw: RawJob) -> Self {
        ListingRecord {
            id: raw.id.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            title: raw.job_title.unwrap_or_default(),
            company: raw.company_name.unwrap_or_default(),
            location: raw.job_geo.unwrap_or_default(),
            level: raw.job_level.unwrap_or_default(),
            excerpt: raw.job_excerpt.filter(|s| !s.is_empty()),
            published: raw.pub_date.unwrap_or_default(),
            salary_min: raw.salary_min.filter(|s| !s.is_empty()),
            salary_max: raw.salary_max.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

/// Keep scalars as the provider wrote them: `"80k"` stays `80k`, `80000` becomes `"80000"`.
fn opaque<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(de)?.map(|s| match s {
        Scalar::Text(t) => t,
        Scalar::Number(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

fn parse_jobs(body: &str) -> Result<Vec<ListingRecord>> {
    let resp: JobsResponse = serde_json::from_str(body)
        .map_err(|e| Error::Upstream(format!("jobicy json error: {e}")))?;
    Ok(resp.jobs.into_iter().map(ListingRecord::from).collect())
}
