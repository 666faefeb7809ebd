//! In-process stand-in for the log gateway, the upload bucket and the
//! supplier API, serving the same routes the clients call.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, warn};

use crate::records::LogRecord;
use crate::source::{LogEventsResponse, LogGroupEntry, LogGroupsResponse};

static RE_GROUP_EVENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/log-groups/([^/]+)/events$").unwrap());
static RE_UPLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/bucket/emails/([^/]+)$").unwrap());
static RE_MATCHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/emails/([^/]+)/matches$").unwrap());

/// Group names seeded by [`MockBackend::seeded`].
pub const SEEDED_GROUPS: &[&str] = &[
    "/aws/lambda/email-processor",
    "/aws/lambda/email-parser",
    "/aws/lambda/supplier-matcher",
    "/aws/lambda/billing-report",
];

const FEED_MESSAGES: &[&str] = &[
    "START RequestId: {id} Version: $LATEST",
    "INFO polling inbox queue",
    "INFO extracted 3 line items",
    "WARN supplier name normalised with low confidence",
    "Warning: retrying model call",
    "ERROR attachment could not be decoded",
    "END RequestId: {id}",
];

/// An object stored through the upload route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct BackendState {
    groups: BTreeMap<String, Vec<LogRecord>>,
    objects: Vec<StoredObject>,
    feedback: Vec<Value>,
    requests: HashMap<&'static str, usize>,
}

impl BackendState {
    fn processor_group(&self) -> Option<String> {
        self.groups
            .keys()
            .find(|name| name.contains("email-processor"))
            .cloned()
    }
}

/// Mock backend listening on a local port until dropped.
pub struct MockBackend {
    server: Arc<Server>,
    addr: SocketAddr,
    state: Arc<Mutex<BackendState>>,
    feeding: Arc<AtomicBool>,
}

impl MockBackend {
    /// Binds `addr` (use port 0 for an ephemeral port) and starts serving.
    pub fn start(addr: &str) -> io::Result<Self> {
        let server = Server::http(addr).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let local = server.server_addr().to_ip().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "mock backend is not bound to an IP address")
        })?;

        let server = Arc::new(server);
        let state = Arc::new(Mutex::new(BackendState::default()));

        let server_clone = Arc::clone(&server);
        let state_clone = Arc::clone(&state);
        std::thread::Builder::new()
            .name("mock-backend".into())
            .spawn(move || {
                for request in server_clone.incoming_requests() {
                    handle_request(request, &state_clone);
                }
            })?;

        debug!(%local, "mock backend listening");
        Ok(Self {
            server,
            addr: local,
            state,
            feeding: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Starts with [`SEEDED_GROUPS`] in place and a few lines each.
    pub fn seeded(addr: &str) -> io::Result<Self> {
        let backend = Self::start(addr)?;
        let now = chrono::Utc::now().timestamp_millis();
        for name in SEEDED_GROUPS {
            backend.add_group(name);
            backend.push_event(name, now - 60_000, "INFO cold start");
        }
        Ok(backend)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add_group(&self, name: &str) {
        self.lock().groups.entry(name.to_string()).or_default();
    }

    pub fn push_event(&self, group: &str, timestamp: i64, message: &str) {
        self.lock()
            .groups
            .entry(group.to_string())
            .or_default()
            .push(LogRecord::new(timestamp, message));
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.lock().objects.clone()
    }

    pub fn feedback(&self) -> Vec<Value> {
        self.lock().feedback.clone()
    }

    /// Requests served on one route: `log-groups`, `events`, `upload`,
    /// `suggest`, `matches` or `feedback`.
    pub fn request_count(&self, route: &str) -> usize {
        self.lock().requests.get(route).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.lock().requests.values().sum()
    }

    /// Appends a line to every group each `interval`, until dropped.
    pub fn spawn_feed(&self, interval: Duration) -> io::Result<()> {
        if self.feeding.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let state = Arc::clone(&self.state);
        let feeding = Arc::clone(&self.feeding);
        std::thread::Builder::new()
            .name("mock-backend-feed".into())
            .spawn(move || {
                let mut counter: usize = 0;
                while feeding.load(Ordering::SeqCst) {
                    std::thread::sleep(interval);
                    let now = chrono::Utc::now().timestamp_millis();
                    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                    for (offset, events) in state.groups.values_mut().enumerate() {
                        let template = FEED_MESSAGES[(counter + offset) % FEED_MESSAGES.len()];
                        let message = template.replace("{id}", &format!("req-{:04}", counter / FEED_MESSAGES.len()));
                        events.push(LogRecord::new(now, message));
                    }
                    counter += 1;
                }
            })?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.feeding.store(false, Ordering::SeqCst);
        self.server.unblock();
    }
}

fn handle_request(mut request: Request, state: &Mutex<BackendState>) {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (url.as_str(), HashMap::new()),
    };
    let method = request.method().clone();
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());

    match (&method, path) {
        (Method::Get, "/log-groups") => {
            count(&mut state, "log-groups");
            let prefix = query.get("prefix").map(String::as_str).unwrap_or("");
            let response = LogGroupsResponse {
                log_groups: state
                    .groups
                    .keys()
                    .filter(|name| name.starts_with(prefix))
                    .map(|name| LogGroupEntry {
                        log_group_name: name.clone(),
                    })
                    .collect(),
            };
            respond_json(request, &response);
        }
        (Method::Post, "/suppliers/suggest") => {
            count(&mut state, "suggest");
            match read_json_body(&mut request) {
                Ok(body) => respond_json(
                    request,
                    &json!({
                        "query": body,
                        "suggestions": [
                            { "supplierId": "SUP-001", "name": "Acme Office Supplies", "score": 0.92 },
                            { "supplierId": "SUP-014", "name": "Northwind Traders", "score": 0.71 }
                        ]
                    }),
                ),
                Err(e) => respond_error(request, 400, &format!("invalid JSON: {}", e)),
            }
        }
        (Method::Post, "/suppliers/feedback") => {
            count(&mut state, "feedback");
            match read_json_body(&mut request) {
                Ok(body) => {
                    state.feedback.push(body);
                    respond_json(request, &json!({ "status": "recorded" }));
                }
                Err(e) => respond_error(request, 400, &format!("invalid JSON: {}", e)),
            }
        }
        _ => {
            if let (Method::Get, Some(caps)) = (&method, RE_GROUP_EVENTS.captures(path)) {
                count(&mut state, "events");
                let name = decode(&caps[1]);
                return match state.groups.get(&name) {
                    Some(events) => {
                        let response = LogEventsResponse {
                            events: window(events, &query),
                        };
                        respond_json(request, &response)
                    }
                    None => respond_error(request, 404, "ResourceNotFoundException"),
                };
            }

            if let (Method::Put, Some(caps)) = (&method, RE_UPLOAD.captures(path)) {
                count(&mut state, "upload");
                let file_name = decode(&caps[1]);
                let content_type = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Content-Type"))
                    .map(|h| h.value.as_str().to_string());
                let mut body = Vec::new();
                if let Err(e) = request.as_reader().read_to_end(&mut body) {
                    return respond_internal_error(request, e);
                }
                store_upload(&mut state, &file_name, content_type, body.len());
                return respond_json(request, &json!({ "key": format!("emails/{}", file_name) }));
            }

            if let (Method::Get, Some(caps)) = (&method, RE_MATCHES.captures(path)) {
                count(&mut state, "matches");
                let email_id = decode(&caps[1]);
                let known = state
                    .objects
                    .iter()
                    .any(|object| object.key.starts_with(&format!("emails/{}.", email_id)));
                return if known {
                    respond_json(
                        request,
                        &json!({
                            "emailId": email_id,
                            "matches": [
                                { "supplierId": "SUP-001", "name": "Acme Office Supplies", "confidence": 0.88 }
                            ]
                        }),
                    )
                } else {
                    respond_error(request, 404, "Email not found")
                };
            }

            respond_error(request, 404, "Not found");
        }
    }
}

fn count(state: &mut BackendState, route: &'static str) {
    *state.requests.entry(route).or_insert(0) += 1;
}

/// Events inside `[startTime, endTime]`, oldest first, capped at `limit`.
fn window(events: &[LogRecord], query: &HashMap<String, String>) -> Vec<LogRecord> {
    let bound = |key: &str, default: i64| {
        query
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default)
    };
    let start = bound("startTime", i64::MIN);
    let end = bound("endTime", i64::MAX);
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let mut selected: Vec<LogRecord> = events
        .iter()
        .filter(|event| event.timestamp >= start && event.timestamp <= end)
        .cloned()
        .collect();
    selected.sort_by_key(|event| event.timestamp);
    selected.truncate(limit);
    selected
}

/// Records the object and logs its processing in the processor group.
fn store_upload(
    state: &mut BackendState,
    file_name: &str,
    content_type: Option<String>,
    size: usize,
) {
    state.objects.push(StoredObject {
        key: format!("emails/{}", file_name),
        content_type,
        size,
    });

    let file_id = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    let Some(group) = state.processor_group() else {
        return;
    };
    let now = chrono::Utc::now().timestamp_millis();
    let lines = [
        format!("START processing {}", file_id),
        format!("INFO parsed {} ({} bytes)", file_id, size),
        format!("INFO supplier candidates ready for {}", file_id),
        format!("END processing {}", file_id),
    ];
    if let Some(events) = state.groups.get_mut(&group) {
        for (offset, line) in lines.into_iter().enumerate() {
            events.push(LogRecord::new(now + offset as i64, line));
        }
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (decode(k), decode(v)))
        .collect()
}

fn decode(value: &str) -> String {
    let plus_decoded = value.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|v| v.into_owned())
        .unwrap_or(plus_decoded)
}

fn read_json_body(request: &mut Request) -> Result<Value, String> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| e.to_string())?;
    serde_json::from_str(&body).map_err(|e| e.to_string())
}

fn respond_json<T: Serialize>(request: Request, value: &T) {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::from_data(body);
            if let Ok(header) =
                Header::from_bytes(b"Content-Type".as_slice(), b"application/json".as_slice())
            {
                response.add_header(header);
            }
            let _ = request.respond(response);
        }
        Err(e) => respond_internal_error(request, e),
    }
}

fn respond_error(request: Request, code: u16, msg: &str) {
    let _ = request.respond(Response::from_string(msg).with_status_code(code));
}

fn respond_internal_error(request: Request, e: impl Display) {
    warn!(error = %e, "mock backend internal error");
    let _ = request.respond(
        Response::from_string(format!("Internal server error: {}", e)).with_status_code(500),
    );
}
