//! Job search port + normalized listing model.

use async_trait::async_trait;

use crate::Result;

pub const DEFAULT_COUNT: u8 = 5;
pub const MAX_COUNT: u8 = 50;

/// One normalized search result.
///
/// Compensation bounds are kept exactly as the provider formatted them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub level: String,
    pub excerpt: Option<String>,
    pub published: String,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobQuery {
    /// Already clamped to `1..=MAX_COUNT` by the handler.
    pub count: u8,
    pub geo: Option<String>,
    pub industry: Option<String>,
    pub tag: Option<String>,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            geo: None,
            industry: None,
            tag: None,
        }
    }
}

/// Hexagonal port for the job-listing provider.
///
/// Implementations return `Error::Upstream` for transport, status and decode failures.
/// An empty vector is a valid answer, not an error.
#[async_trait]
pub trait JobSearch: Send + Sync {
    async fn search(&self, query: &JobQuery) -> Result<Vec<ListingRecord>>;
}
