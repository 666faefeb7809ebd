use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::groups::LogGroup;
use crate::http::{authorized, join_url};
use crate::records::LogRecord;

/// Length of the trailing query window.
pub const WINDOW_MS: i64 = 10 * 60 * 1000;

/// Maximum records the log API returns per call. Busy groups can lose
/// events past this cap; merging never detects that.
pub const FETCH_LIMIT: u32 = 100;

/// Parameters of a single event query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub log_group_name: String,
    pub start_time: i64,
    pub end_time: i64,
    pub limit: u32,
}

impl LogQuery {
    /// The trailing window ending at `now_ms`.
    pub fn trailing_window(log_group_name: &str, now_ms: i64) -> Self {
        Self {
            log_group_name: log_group_name.to_string(),
            start_time: now_ms - WINDOW_MS,
            end_time: now_ms,
            limit: FETCH_LIMIT,
        }
    }
}

/// Read side of the external logging service.
pub trait LogSource: Send + Sync + 'static {
    /// Lists every group whose name starts with `prefix`.
    fn describe_log_groups(&self, prefix: &str) -> Result<Vec<LogGroup>>;

    fn filter_log_events(&self, query: &LogQuery) -> Result<Vec<LogRecord>>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroupsResponse {
    pub log_groups: Vec<LogGroupEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroupEntry {
    pub log_group_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogEventsResponse {
    pub events: Vec<LogRecord>,
}

/// [`LogSource`] backed by the HTTP log gateway.
pub struct HttpLogSource {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpLogSource {
    pub fn new(agent: ureq::Agent, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            agent,
            base_url: base_url.into(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl LogSource for HttpLogSource {
    fn describe_log_groups(&self, prefix: &str) -> Result<Vec<LogGroup>> {
        let url = join_url(&self.base_url, "log-groups");
        let response: LogGroupsResponse =
            authorized(self.agent.get(&url), self.token.as_deref())
                .query("prefix", prefix)
                .call()?
                .body_mut()
                .read_json()?;

        Ok(response
            .log_groups
            .into_iter()
            .map(|entry| LogGroup::from_name(&entry.log_group_name, prefix))
            .collect())
    }

    fn filter_log_events(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        let url = join_url(
            &self.base_url,
            &format!(
                "log-groups/{}/events",
                urlencoding::encode(&query.log_group_name)
            ),
        );
        let response: LogEventsResponse =
            authorized(self.agent.get(&url), self.token.as_deref())
                .query("startTime", query.start_time.to_string())
                .query("endTime", query.end_time.to_string())
                .query("limit", query.limit.to_string())
                .call()?
                .body_mut()
                .read_json()?;

        Ok(response.events)
    }
}
