//! Integration tests for the `chainscope serve` HTTP API.
//!
//! Each test starts the server as a child process in offline mode on a
//! free port and talks to it over plain HTTP/1.0, so response bodies are
//! never chunked and end when the server closes the connection.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// A running `chainscope serve`, killed on drop.
struct Server {
    port: u16,
    child: Child,
}

impl Drop for Server {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("no free port")
}

fn serve(env: &[(&str, &str)]) -> Server {
    let port = free_port();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chainscope"));
    cmd.args(["serve", "--offline", "--port", &port.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for var in [
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "GITHUB_TOKEN",
        "CHAINSCOPE_GITHUB_API_URL",
        "CHAINSCOPE_API_KEY",
        "CHAINSCOPE_ACCESS_PASSWORD",
        "CHAINSCOPE_RATE_LIMIT",
    ] {
        cmd.env_remove(var);
    }
    cmd.envs(env.iter().copied());

    let server = Server {
        port,
        child: cmd.spawn().expect("failed to start chainscope serve"),
    };
    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    server
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, self.body))
    }

    /// Payloads of the `data:` lines of an event stream.
    fn events(&self) -> Vec<serde_json::Value> {
        self.body
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim()).expect("event is JSON"))
            .collect()
    }
}

impl Server {
    fn request(&self, method: &str, path: &str, headers: &[(&str, &str)], body: Option<&str>) -> Reply {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).expect("failed to connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();

        let mut request = format!("{} {} HTTP/1.0\r\nHost: localhost\r\n", method, path);
        for (name, value) in headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }
        if let Some(body) = body {
            request.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n",
                body.len()
            ));
        }
        request.push_str("\r\n");
        request.push_str(body.unwrap_or(""));
        stream.write_all(request.as_bytes()).expect("failed to write");

        let mut raw = String::new();
        let _ = stream.read_to_string(&mut raw);
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw.as_str(), ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Reply {
            status,
            headers,
            body: body.to_string(),
        }
    }

    fn get(&self, path: &str) -> Reply {
        self.request("GET", path, &[], None)
    }

    fn post(&self, path: &str, body: &str) -> Reply {
        self.request("POST", path, &[], Some(body))
    }
}

// ── Read-only endpoints ──────────────────────────────────────────────

#[test]
fn health_reports_rule_count() {
    let server = serve(&[]);
    let reply = server.get("/health");
    assert_eq!(reply.status, 200);
    let value = reply.json();
    assert_eq!(value["status"], "ok");
    assert!(value["version"].is_string());
    assert_eq!(value["rules"], 12);
    assert_eq!(value["historyAvailable"], true);
}

#[test]
fn rules_and_history_endpoints() {
    let server = serve(&[]);

    let reply = server.get("/api/rules");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["rules"].as_array().map(Vec::len), Some(12));

    let reply = server.get("/api/history");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["totalSupported"], 1);

    let record = server.get("/api/history/solana").json();
    assert_eq!(record["chainName"], "Solana");
    assert_eq!(record["status"], "SUPPORTED");

    let reply = server.get("/api/history/zanzibarchain");
    assert_eq!(reply.status, 404);
    assert!(reply.json()["error"]
        .as_str()
        .unwrap()
        .contains("no integration record"));
}

#[test]
fn unknown_route_is_json_404() {
    let reply = serve(&[]).get("/nope");
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json()["error"], "not found");
}

#[test]
fn offline_protocol_listing_is_empty() {
    let server = serve(&[]);
    let reply = server.get("/api/protocols/Ethereum?limit=5");
    assert_eq!(reply.status, 200);
    let value = reply.json();
    assert_eq!(value["chain"], "Ethereum");
    assert_eq!(value["protocols"].as_array().map(Vec::len), Some(0));
}

// ── Sales assessment ─────────────────────────────────────────────────

#[test]
fn sales_assess_returns_flattened_assessment() {
    let server = serve(&[]);
    let reply = server.post(
        "/api/sales-assess",
        r#"{"chainName": "Arbitrum", "tvl": 15000000000, "rank": 4}"#,
    );
    assert_eq!(reply.status, 200);
    let value = reply.json();
    assert_eq!(value["complexity"], "LOW");
    assert_eq!(value["marketOpportunity"], "CRITICAL");
    assert_eq!(value["recommendedPriority"], "P0");
    assert_eq!(value["assessmentType"], "SALES_EARLY_STAGE");
    assert_eq!(value["chainData"]["name"], "Arbitrum");
    assert!(value["timestamp"].is_string());
    assert!(value["whyThisComplexity"].is_array());
}

#[test]
fn sales_assess_unknown_tvl_is_reported_as_unknown() {
    let server = serve(&[]);
    let value = server
        .post("/api/sales-assess", r#"{"chainName": "Monero"}"#)
        .json();
    assert_eq!(value["complexity"], "HIGH");
    assert_eq!(value["chainData"]["tvl"], "Unknown");
    assert!(value["chainData"]["tvlRaw"].is_null());
}

#[test]
fn sales_assess_requires_chain_name() {
    let server = serve(&[]);
    for body in [r#"{"chainName": "  "}"#, "{}"] {
        let reply = server.post("/api/sales-assess", body);
        assert_eq!(reply.status, 400, "body: {}", body);
        assert_eq!(reply.json()["error"], "Chain name is required");
    }
}

// ── AI analysis ──────────────────────────────────────────────────────

#[test]
fn analyze_without_model_key_streams_error_event() {
    let server = serve(&[]);
    let reply = server.post("/api/analyze", r#"{"chainName": "Base"}"#);
    assert_eq!(reply.status, 200);
    assert!(reply
        .header("content-type")
        .unwrap_or("")
        .starts_with("text/event-stream"));

    let events = reply.events();
    assert!(!events.is_empty(), "no events in: {}", reply.body);
    assert_eq!(events[0]["type"], "step");
    assert_eq!(events[0]["step"], 1);
    let last = events.last().expect("at least one event");
    assert_eq!(last["type"], "error");
    assert!(last["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate analysis"));
}

#[test]
fn analyze_requires_chain_name() {
    let reply = serve(&[]).post("/api/analyze", r#"{"chainName": ""}"#);
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["error"], "Chain name is required");
}

// ── Repository analysis ──────────────────────────────────────────────

#[test]
fn github_analysis_is_unavailable_offline() {
    let server = serve(&[]);
    let reply = server.get("/api/github-analyze?action=families");
    assert_eq!(reply.status, 503);
    assert_eq!(
        reply.json()["error"],
        "GitHub analysis is unavailable in offline mode"
    );
}

#[test]
fn github_timeline_requires_chain() {
    let server = serve(&[]);
    let reply = server.get("/api/github-analyze?action=timeline");
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["error"], "Chain name required for timeline");
}

// ── Login ────────────────────────────────────────────────────────────

#[test]
fn login_without_configured_password_is_500() {
    let reply = serve(&[]).post("/api/login", r#"{"password": "x"}"#);
    assert_eq!(reply.status, 500);
    assert_eq!(reply.json()["error"], "Access password not configured");
}

#[test]
fn login_checks_password_and_sets_cookie() {
    let server = serve(&[("CHAINSCOPE_ACCESS_PASSWORD", "open-sesame")]);

    assert_eq!(server.post("/api/login", r#"{"password": "wrong"}"#).status, 401);
    assert_eq!(server.post("/api/login", "not json").status, 400);

    let reply = server.post("/api/login", r#"{"password": "open-sesame"}"#);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["success"], true);
    let cookie = reply.header("set-cookie").expect("session cookie");
    assert!(cookie.starts_with("authenticated=true"));
    assert!(cookie.contains("HttpOnly"));
}

// ── API key and rate limit ───────────────────────────────────────────

#[test]
fn api_key_guards_everything_but_health() {
    let server = serve(&[("CHAINSCOPE_API_KEY", "k-123")]);

    assert_eq!(server.get("/health").status, 200);

    let reply = server.get("/api/rules");
    assert_eq!(reply.status, 401);
    assert_eq!(reply.json()["error"], "authentication required");

    let with = |name: &str, value: &str| server.request("GET", "/api/rules", &[(name, value)], None).status;
    assert_eq!(with("X-API-Key", "nope"), 403);
    assert_eq!(with("Authorization", "Bearer k-123"), 200);
    assert_eq!(with("X-API-Key", "k-123"), 200);
}

#[test]
fn rate_limit_rejects_excess_requests() {
    let server = serve(&[("CHAINSCOPE_RATE_LIMIT", "2")]);

    assert_eq!(server.get("/health").status, 200);
    assert_eq!(server.get("/health").status, 200);
    let reply = server.get("/health");
    assert_eq!(reply.status, 429);
    let value = reply.json();
    assert_eq!(value["error"], "rate limit exceeded");
    assert!(value["retry_after"].is_number());
}
