#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, fmt};
use travelbook_client::{ApiClient, ApiConfig, RetryPlan};
use wiremock::MockServer;

pub fn client_for(server: &MockServer) -> ApiClient {
    let config = ApiConfig::from_base_url(server.uri()).expect("mock server uri is a valid URL");
    ApiClient::new(config).expect("client construction")
}

/// Short real delays so retry-exhaustion tests finish quickly.
pub fn fast_plan() -> RetryPlan {
    RetryPlan::new(
        3,
        Duration::from_millis(25),
        Duration::from_millis(100),
        Duration::from_secs(5),
    )
}

/// Mint a signed JWT whose `exp` sits `exp_offset_secs` from now.
pub fn mint_token(exp_offset_secs: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64;
    let claims = json!({ "exp": now + exp_offset_secs, "sub": "42" });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-secret"),
    )
    .expect("token encoding")
}

/// Wrap `results` in the backend's pagination envelope.
pub fn paginated(results: Value) -> Value {
    let count = results.as_array().map(|a| a.len()).unwrap_or(0);
    json!({
        "count": count,
        "next": null,
        "previous": null,
        "results": results,
    })
}

struct VecWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl std::io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lines.lock().unwrap();
        guard.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn capture_logs() -> (Arc<Mutex<Vec<String>>>, DefaultGuard) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let writer_lines = lines.clone();
    let subscriber = Registry::default().with(
        fmt::Layer::default()
            .with_writer(move || VecWriter {
                lines: writer_lines.clone(),
            })
            .with_target(false)
            .with_level(true)
            .with_ansi(false),
    );
    let guard = set_default(subscriber);
    (lines, guard)
}
