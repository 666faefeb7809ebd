use serde_json::Value;

use crate::error::Result;
use crate::http::{authorized, join_url};

/// Client for the supplier matching API.
///
/// Payloads are owned by the backend; they are passed through as raw JSON.
pub struct SupplierClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl SupplierClient {
    pub fn new(agent: ureq::Agent, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            agent,
            base_url: base_url.into(),
            token,
        }
    }

    /// `POST /suppliers/suggest`
    pub fn suggest(&self, request: &Value) -> Result<Value> {
        self.post("suppliers/suggest", request)
    }

    /// `GET /emails/{id}/matches`
    pub fn matches(&self, email_id: &str) -> Result<Value> {
        let url = join_url(
            &self.base_url,
            &format!("emails/{}/matches", urlencoding::encode(email_id)),
        );
        let body = authorized(self.agent.get(&url), self.token.as_deref())
            .call()?
            .body_mut()
            .read_json()?;
        Ok(body)
    }

    /// `POST /suppliers/feedback`
    pub fn feedback(&self, feedback: &Value) -> Result<Value> {
        self.post("suppliers/feedback", feedback)
    }

    fn post(&self, path: &str, payload: &Value) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        let body = authorized(self.agent.post(&url), self.token.as_deref())
            .send_json(payload)?
            .body_mut()
            .read_json()?;
        Ok(body)
    }
}
