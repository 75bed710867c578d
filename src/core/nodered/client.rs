//! Blocking client for the flow engine's admin HTTP API.
//!
//! One client type serves every operation. All requests carry the same
//! protocol headers and every response passes through the same status
//! classification, so callers only ever see the crate's error taxonomy.
//! An optional retry policy turns the same client into a "wait until the
//! admin API is reachable" probe: only transport-level failures are
//! retried, any HTTP answer is definitive.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::error::{Error, Result};
use crate::core::nodered::flow::{is_tab, Flow, FlowsEnvelope};
use crate::core::nodered::project::{Project, ProjectBranches, ProjectList, ProjectStatus};

/// Protocol version header; v2 wraps flow payloads in a `{flows, rev}`
/// envelope on both directions.
const API_VERSION_HEADER: &str = "Node-RED-API-Version";
const API_VERSION: &str = "v2";

/// Deployment-type header attached to flow replacements. This client only
/// ever does full reloads.
const DEPLOYMENT_TYPE_HEADER: &str = "Node-RED-Deployment-Type";
const DEPLOYMENT_TYPE_FULL: &str = "full";

const RETRY_ATTEMPTS: u32 = 5;
const RETRY_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Bounded retry schedule for transport failures: `attempts` tries in
/// total, sleeping `initial_delay` before the second and doubling after
/// each further failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: RETRY_ATTEMPTS,
            initial_delay: RETRY_INITIAL_DELAY,
        }
    }
}

/// Shape of the engine's structured 400 payload.
#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    code: String,
    message: String,
}

pub struct Client {
    http: HttpClient,
    base_url: String,
    retry: Option<RetryPolicy>,
}

impl Client {
    /// Client that fails fast: a single attempt per request.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), None)
    }

    /// Client that waits out engine startup with the default retry schedule.
    pub fn with_retries(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), Some(RetryPolicy::default()))
    }

    /// Client with an explicit retry schedule.
    pub fn with_retry_policy(base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self::build(base_url.into(), Some(policy))
    }

    fn build(base_url: String, retry: Option<RetryPolicy>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Flow operations
    // ========================================================================

    /// Fetches the deployed flows and returns the top-level tabs, each
    /// stamped with the listing's deployment revision.
    ///
    /// Non-tab nodes and entries that do not decode as tabs are skipped.
    pub fn get_flows(&self) -> Result<Vec<Flow>> {
        let body = self.exchange("get flows", || self.request(Method::GET, "flows"))?;
        let envelope: FlowsEnvelope = decode("get flows", &body)?;
        Ok(tabs_from_envelope(envelope))
    }

    /// Replaces the full flow set and returns the engine's new deployment
    /// revision.
    ///
    /// An empty `rev` skips the engine's conflict check, which is what a
    /// plugin-driven install wants: the plugin is the only writer.
    pub fn set_flows(&self, rev: &str, flows: &Value) -> Result<FlowsEnvelope> {
        let payload = FlowsEnvelope {
            flows: flows.clone(),
            rev: rev.to_string(),
        };
        let body = self.exchange("set flows", || {
            self.request(Method::POST, "flows")
                .header(DEPLOYMENT_TYPE_HEADER, DEPLOYMENT_TYPE_FULL)
                .json(&payload)
        })?;
        decode("set flows", &body)
    }

    /// Deletes a single flow tab by id. Deleting an id that is already gone
    /// classifies as not-found; callers decide whether that is acceptable.
    pub fn delete_flow(&self, id: &str) -> Result<()> {
        self.exchange("delete flow", || {
            self.request(Method::DELETE, &format!("flow/{}", id))
        })?;
        Ok(())
    }

    // ========================================================================
    // Project operations
    // ========================================================================

    /// Lists project names and the currently active project. Also serves as
    /// the reachability probe: project mode being disabled surfaces here as
    /// a not-found error.
    pub fn project_list(&self) -> Result<ProjectList> {
        let body = self.exchange("list projects", || self.request(Method::GET, "projects"))?;
        decode("list projects", &body)
    }

    pub fn project_get(&self, name: &str) -> Result<Project> {
        let operation = "get project";
        let body = self.exchange(operation, || {
            self.request(Method::GET, &format!("projects/{}", name))
        })?;
        decode(operation, &body)
    }

    /// Clones a new project from a git URL, registered under `origin`.
    pub fn project_clone(&self, name: &str, repository_url: &str) -> Result<()> {
        let payload = json!({
            "name": name,
            "git": { "remotes": { "origin": { "url": repository_url } } }
        });
        self.exchange("clone project", || {
            self.request(Method::POST, "projects").json(&payload)
        })?;
        Ok(())
    }

    /// Makes `name` the active project. `clear_context` is forwarded
    /// verbatim and tells the engine to drop flow context on switch.
    pub fn project_set_active(&self, name: &str, clear_context: bool) -> Result<()> {
        let payload = json!({ "active": true, "clearContext": clear_context });
        self.exchange("activate project", || {
            self.request(Method::PUT, &format!("projects/{}", name))
                .json(&payload)
        })?;
        Ok(())
    }

    /// Pulls the active branch's upstream into the project.
    pub fn project_pull(&self, name: &str) -> Result<()> {
        self.exchange("pull project", || {
            self.request(Method::POST, &format!("projects/{}/pull", name))
                .json(&json!({}))
        })?;
        Ok(())
    }

    /// Deletes a project. The engine rejects deleting the active project;
    /// that rejection surfaces through the usual classification.
    pub fn project_delete(&self, name: &str) -> Result<()> {
        self.exchange("delete project", || {
            self.request(Method::DELETE, &format!("projects/{}", name))
        })?;
        Ok(())
    }

    pub fn project_status(&self, name: &str) -> Result<ProjectStatus> {
        let operation = "project status";
        let body = self.exchange(operation, || {
            self.request(Method::GET, &format!("projects/{}/status", name))
        })?;
        decode(operation, &body)
    }

    pub fn project_branches(&self, name: &str) -> Result<ProjectBranches> {
        let operation = "project branches";
        let body = self.exchange(operation, || {
            self.request(Method::GET, &format!("projects/{}/branches", name))
        })?;
        decode(operation, &body)
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// Single construction point for requests; every call carries the
    /// protocol version and content type.
    fn request(&self, method: Method, subpath: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, subpath))
            .header(API_VERSION_HEADER, API_VERSION)
            .header("Content-Type", "application/json")
    }

    /// Sends a request (retrying transport failures per the policy), then
    /// classifies the response status and returns the body of a successful
    /// exchange.
    fn exchange<F>(&self, operation: &'static str, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.retry.map_or(1, |p| p.attempts.max(1));
        let mut delay = self.retry.map_or(Duration::ZERO, |p| p.initial_delay);

        let mut response = None;
        let mut last_error = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                thread::sleep(delay);
                delay = delay.saturating_mul(2);
            }
            match build().send() {
                Ok(r) => {
                    response = Some(r);
                    break;
                }
                Err(e) => last_error = e.to_string(),
            }
        }
        let Some(response) = response else {
            return Err(Error::api_unreachable(last_error, attempts));
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::api_invalid_response(e.to_string(), operation))?;
        match status {
            200..=299 => Ok(body),
            404 => Err(Error::api_not_found(operation)),
            400 => Err(bad_request_error(&body)),
            _ => Err(Error::api_server_error(status, body)),
        }
    }
}

fn bad_request_error(body: &str) -> Error {
    match serde_json::from_str::<ApiErrorPayload>(body) {
        Ok(payload) => Error::api_bad_request(payload.code, payload.message),
        Err(_) => Error::api_bad_request_raw(body),
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::api_invalid_response(e.to_string(), operation))
}

/// Filters a v2 flow listing down to its tabs, stamping each with the
/// deployment revision so version fallbacks work.
fn tabs_from_envelope(envelope: FlowsEnvelope) -> Vec<Flow> {
    let mut tabs = Vec::new();
    let Some(nodes) = envelope.flows.as_array() else {
        return tabs;
    };
    for node in nodes {
        let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();
        if !is_tab(node_type) {
            continue;
        }
        // Entries that do not decode as tabs are skipped, not fatal.
        let Ok(mut flow) = serde_json::from_value::<Flow>(node.clone()) else {
            continue;
        };
        flow.revision = envelope.rev.clone();
        tabs.push(flow);
    }
    tabs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCode;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = Client::new("http://127.0.0.1:1880/");
        assert_eq!(client.base_url(), "http://127.0.0.1:1880");
    }

    #[test]
    fn structured_bad_request_keeps_engine_code_and_message() {
        let err = bad_request_error(r#"{"code":"invalid_flow","message":"bad"}"#);
        assert_eq!(err.code, ErrorCode::ApiBadRequest);
        assert_eq!(err.to_string(), "invalid_flow. bad");
    }

    #[test]
    fn unparseable_bad_request_still_classifies_as_bad_request() {
        let err = bad_request_error("<html>nope</html>");
        assert_eq!(err.code, ErrorCode::ApiBadRequest);
        assert_eq!(err.details["body"], "<html>nope</html>");
    }

    #[test]
    fn envelope_filtering_keeps_tabs_and_stamps_revision() {
        let envelope: FlowsEnvelope = serde_json::from_value(json!({
            "flows": [
                { "id": "t1", "type": "tab", "label": "One" },
                { "id": "n1", "type": "http in", "z": "t1" },
                { "id": "t2", "type": "tab", "label": "Two" }
            ],
            "rev": "abcdef1234567890"
        }))
        .unwrap();
        let tabs = tabs_from_envelope(envelope);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].id, "t1");
        assert_eq!(tabs[1].revision, "abcdef1234567890");
    }

    #[test]
    fn malformed_tab_entries_are_skipped() {
        let envelope: FlowsEnvelope = serde_json::from_value(json!({
            "flows": [
                { "id": 42, "type": "tab" },
                { "type": "tab" },
                { "id": "ok", "type": "tab" }
            ],
            "rev": "r1"
        }))
        .unwrap();
        let tabs = tabs_from_envelope(envelope);
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].id, "ok");
    }

    #[test]
    fn envelope_without_array_yields_no_tabs() {
        let envelope = FlowsEnvelope::default();
        assert!(tabs_from_envelope(envelope).is_empty());
    }
}
