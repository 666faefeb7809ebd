use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
const GLOBAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the HTTP agent shared by the backend clients.
pub fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_global(Some(GLOBAL_TIMEOUT))
        .build();
    config.into()
}

/// Attaches `Authorization: Bearer <token>` when a token is configured.
pub(crate) fn authorized<B>(
    request: ureq::RequestBuilder<B>,
    token: Option<&str>,
) -> ureq::RequestBuilder<B> {
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
