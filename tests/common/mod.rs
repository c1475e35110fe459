#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::{
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, LazyLock},
    time::Duration,
};
use timesync_api::{
    clock::{client::ClientSlot, NtpClient, QueryError, TimeSample},
    config::{Config, MetricsPolicy, NtpConfig},
    server::build_with_client,
};
use tower::ServiceExt;
use tracing::Level;

static INIT_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt::init();
});

pub fn initialize_logging() {
    let _ = *INIT_LOGGING;
}

pub fn server_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Answers every query with the same canned result, optionally after a delay.
pub struct MockNtpClient {
    answer: Result<TimeSample, QueryError>,
    delay: Duration,
}

impl MockNtpClient {
    pub fn answering(answer: Result<TimeSample, QueryError>) -> ClientSlot {
        Ok(Arc::new(Self {
            answer,
            delay: Duration::ZERO,
        }))
    }

    pub fn hanging(delay: Duration) -> ClientSlot {
        Ok(Arc::new(Self {
            answer: Err(QueryError::Transport("should never be seen".to_string())),
            delay,
        }))
    }
}

impl NtpClient for MockNtpClient {
    fn query(&self, _server: String, _port: u16) -> BoxFuture<'static, Result<TimeSample, QueryError>> {
        let answer = self.answer.clone();
        let delay = self.delay;

        async move {
            tokio::time::sleep(delay).await;
            answer
        }
        .boxed()
    }
}

pub fn test_config(ntp_server: Option<&str>, policy: MetricsPolicy) -> Arc<Config> {
    Arc::new(Config {
        server_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        server_port: 3000,
        log_level: Level::INFO,
        timezone: "America/New_York".to_string(),
        ntp: NtpConfig {
            server: ntp_server.map(str::to_string),
            timeout: Duration::from_millis(200),
            metrics_policy: policy,
            ..NtpConfig::default()
        },
        no_metrics: false,
    })
}

pub async fn build_app(ntp_server: Option<&str>, client: ClientSlot) -> Router {
    build_with_client(test_config(ntp_server, MetricsPolicy::Permissive), client).await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("Request failed");

    let status = response.status();
    let body_bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    let value = serde_json::from_slice(&body_bytes).expect("Response body is not valid JSON");

    (status, value)
}
