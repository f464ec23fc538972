//! Admin-only backend endpoints under `BACKEND_URL`, plus moderation.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use thala_core::console::{Row, SqlRequest, SqlResponse};
use thala_core::{ModerationAction, ModerationTarget};

use super::schemas::FlagUpdate;
use super::{ApiResult, BackendClient, ERROR_ONLY};

const STATS_PATH: &str = "/api/v1/admin/stats";
const SQL_PATH: &str = "/api/v1/admin/sql";

/// Dashboard counters, as served to the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_events: u64,
    pub total_videos: u64,
    pub total_archive_entries: u64,
    pub total_messages: u64,
    pub total_communities: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
}

/// Stats body as the backend sends it. Any counter may be absent.
#[derive(Debug, Default, Deserialize)]
struct BackendStats {
    total_users: Option<u64>,
    total_events: Option<u64>,
    total_videos: Option<u64>,
    total_archive_entries: Option<u64>,
    total_messages: Option<u64>,
    total_communities: Option<u64>,
    total_likes: Option<u64>,
    total_comments: Option<u64>,
    total_shares: Option<u64>,
}

impl From<BackendStats> for DashboardStats {
    fn from(s: BackendStats) -> Self {
        Self {
            total_users: s.total_users.unwrap_or_default(),
            total_events: s.total_events.unwrap_or_default(),
            total_videos: s.total_videos.unwrap_or_default(),
            total_archive_entries: s.total_archive_entries.unwrap_or_default(),
            total_messages: s.total_messages.unwrap_or_default(),
            total_communities: s.total_communities.unwrap_or_default(),
            total_likes: s.total_likes.unwrap_or_default(),
            total_comments: s.total_comments.unwrap_or_default(),
            total_shares: s.total_shares.unwrap_or_default(),
        }
    }
}

/// SQL result as the backend sends it.
#[derive(Debug, Default, Deserialize)]
struct BackendSqlResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    row_count: Option<u64>,
}

impl From<BackendSqlResult> for SqlResponse {
    fn from(r: BackendSqlResult) -> Self {
        let row_count = match r.row_count {
            Some(n) if n > 0 => n,
            _ => r.rows.len() as u64,
        };
        Self {
            columns: r.columns,
            rows: r.rows,
            row_count,
        }
    }
}

impl BackendClient {
    /// Dashboard counters. Missing counters read as zero.
    ///
    /// Only the `error` field of a failure body is relayed.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> ApiResult<DashboardStats> {
        let url = self.backend_endpoint(STATS_PATH)?;
        let response = self
            .send_reading::<()>(Method::GET, url, None, ERROR_ONLY)
            .await?;
        let stats: BackendStats = Self::handle_response(response).await?;
        Ok(stats.into())
    }

    /// Run a read-only query on the backend.
    ///
    /// The query text is sent as-is; admission is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn execute_sql(&self, query: &str) -> ApiResult<SqlResponse> {
        let url = self.backend_endpoint(SQL_PATH)?;
        let body = SqlRequest {
            query: query.to_string(),
        };
        let response = self.send(Method::POST, url, Some(&body)).await?;
        let result: BackendSqlResult = Self::handle_response(response).await?;
        Ok(result.into())
    }

    /// Delete or flag a moderation target. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    #[tracing::instrument(skip(self, reason), fields(target = target.as_str(), action = action.as_str()))]
    pub async fn moderate(
        &self,
        target: ModerationTarget,
        id: &str,
        action: ModerationAction,
        reason: Option<&str>,
    ) -> ApiResult<()> {
        let url = self.api_item(target.backend_path(), id)?;
        match action {
            ModerationAction::Delete => {
                self.send::<()>(Method::DELETE, url, None).await?;
            }
            ModerationAction::Flag => {
                let body = FlagUpdate {
                    flagged: true,
                    flag_reason: reason.map(str::to_string),
                };
                self.send(Method::PUT, url, Some(&body)).await?;
            }
        }
        Ok(())
    }
}
