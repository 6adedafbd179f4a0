//! Pre-switch reachability probe for a profile's endpoint.
//!
//! The validator never mutates anything. It sends one authenticated request
//! and classifies the answer into a pass/fail signal.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::profile::Profile;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const BODY_SNIPPET_CHARS: usize = 160;

/// Result of probing a profile's endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Reachable,
    Unreachable(String),
    AuthRejected(String),
}

/// Endpoint probe used by the switch engine.
///
/// Tests substitute scripted implementations; production uses
/// [`HttpValidator`] or [`SkipValidator`].
#[async_trait]
pub trait Validator: Send + Sync {
    async fn check(&self, profile: &Profile) -> ValidationOutcome;
}

/// Always reports `Reachable`. Used for offline switching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipValidator;

#[async_trait]
impl Validator for SkipValidator {
    async fn check(&self, _profile: &Profile) -> ValidationOutcome {
        ValidationOutcome::Reachable
    }
}

/// Probes `GET {base_url}/v1/models` with the profile's credential.
#[derive(Debug, Clone)]
pub struct HttpValidator {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpValidator {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, timeout }
    }
}

#[async_trait]
impl Validator for HttpValidator {
    async fn check(&self, profile: &Profile) -> ValidationOutcome {
        let url = probe_url(&profile.base_url);
        debug!(profile = %profile.name, %url, "probing provider endpoint");
        let request = self
            .http
            .get(&url)
            .header("x-api-key", &profile.credential)
            .bearer_auth(&profile.credential)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeout);

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return ValidationOutcome::Unreachable(format!(
                    "no response from {} within {}s",
                    profile.base_url,
                    self.timeout.as_secs_f32()
                ));
            }
            Err(err) => {
                return ValidationOutcome::Unreachable(format!(
                    "cannot reach {}: {err}",
                    profile.base_url
                ));
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let outcome = classify_status(status, &body);
        debug!(profile = %profile.name, status, ?outcome, "probe finished");
        outcome
    }
}

fn probe_url(base_url: &str) -> String {
    format!("{}/v1/models", base_url.trim().trim_end_matches('/'))
}

/// Map an HTTP status to a validation outcome.
///
/// 404/405 mean the host answered but does not expose the listing route,
/// which many Anthropic-compatible gateways omit.
pub fn classify_status(status: u16, body: &str) -> ValidationOutcome {
    match status {
        200..=299 | 404 | 405 => ValidationOutcome::Reachable,
        401 | 403 => ValidationOutcome::AuthRejected(format!(
            "HTTP {status}: {}",
            snippet(body)
        )),
        429 => ValidationOutcome::Unreachable("HTTP 429: rate limited".to_string()),
        _ => ValidationOutcome::Unreachable(format!("HTTP {status}: {}", snippet(body))),
    }
}

fn snippet(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return "(empty body)".to_string();
    }
    if compact.chars().count() <= BODY_SNIPPET_CHARS {
        return compact;
    }
    let mut cut: String = compact.chars().take(BODY_SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut request_buf = [0u8; 4096];
            let read = stream.read(&mut request_buf).await.unwrap_or(0);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            String::from_utf8_lossy(&request_buf[..read]).to_string()
        });
        (format!("http://{addr}"), server)
    }

    #[test]
    fn status_classification_table() {
        assert_eq!(classify_status(200, ""), ValidationOutcome::Reachable);
        assert_eq!(classify_status(404, ""), ValidationOutcome::Reachable);
        assert_eq!(classify_status(405, ""), ValidationOutcome::Reachable);
        assert!(matches!(
            classify_status(401, "bad key"),
            ValidationOutcome::AuthRejected(msg) if msg.contains("401") && msg.contains("bad key")
        ));
        assert!(matches!(classify_status(403, ""), ValidationOutcome::AuthRejected(_)));
        assert!(matches!(classify_status(429, ""), ValidationOutcome::Unreachable(msg) if msg.contains("rate")));
        assert!(matches!(classify_status(502, ""), ValidationOutcome::Unreachable(msg) if msg.contains("502")));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let ValidationOutcome::Unreachable(msg) = classify_status(500, &body) else {
            panic!("expected unreachable");
        };
        assert!(msg.ends_with('…'));
        assert!(msg.chars().count() < 200);
    }

    #[tokio::test]
    async fn probe_sends_both_auth_headers_to_models_route() {
        let (base, server) = serve_once("200 OK", r#"{"data":[]}"#).await;
        let profile = Profile::new("local", format!("{base}/"), "k-test");
        let outcome = HttpValidator::new(Duration::from_secs(3))
            .check(&profile)
            .await;
        assert_eq!(outcome, ValidationOutcome::Reachable);

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /v1/models "), "{request}");
        assert!(request.contains("x-api-key: k-test"), "{request}");
        assert!(request.contains("authorization: bearer k-test"), "{request}");
        assert!(request.contains("anthropic-version: 2023-06-01"), "{request}");
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_rejected() {
        let (base, _server) = serve_once("401 Unauthorized", r#"{"error":"invalid x-api-key"}"#).await;
        let outcome = HttpValidator::new(Duration::from_secs(3))
            .check(&Profile::new("local", base, "bad"))
            .await;
        assert!(matches!(outcome, ValidationOutcome::AuthRejected(msg) if msg.contains("invalid x-api-key")));
    }

    #[tokio::test]
    async fn silent_server_times_out_as_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _accept = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let outcome = HttpValidator::new(Duration::from_millis(100))
            .check(&Profile::new("local", format!("http://{addr}"), "k"))
            .await;
        assert!(matches!(outcome, ValidationOutcome::Unreachable(_)), "{outcome:?}");
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let outcome = HttpValidator::new(Duration::from_secs(1))
            .check(&Profile::new("local", format!("http://{addr}"), "k"))
            .await;
        assert!(matches!(outcome, ValidationOutcome::Unreachable(msg) if msg.contains("cannot reach")));
    }

    #[tokio::test]
    async fn skip_validator_always_passes() {
        let outcome = SkipValidator
            .check(&Profile::new("x", "http://127.0.0.1:1", "k"))
            .await;
        assert_eq!(outcome, ValidationOutcome::Reachable);
    }
}
