use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::{sync::OnceLock, time::Duration};
use tokio::sync::RwLock;

pub fn init_metrics(enable: bool) -> Option<Arc<RwLock<PrometheusHandle>>> {
    if enable {
        Some(setup_metrics_recorder())
    } else {
        None
    }
}

pub fn spawn_process_collector_if(enable: bool) {
    if enable {
        tokio::spawn(async {
            let collector = metrics_process::Collector::default();
            collector.describe();

            loop {
                collector.collect();
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });
    }
}

// to prevent multiple initialization of the metrics recorder, happens in tests
static HANDLER: OnceLock<Arc<RwLock<PrometheusHandle>>> = OnceLock::new();

pub fn setup_metrics_recorder() -> Arc<RwLock<PrometheusHandle>> {
    HANDLER.get_or_init(internal_setup).clone()
}

fn internal_setup() -> Arc<RwLock<PrometheusHandle>> {
    let builder = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Note: the counters start at 0, otherwise they are not present
    // under `GET /metrics` right after startup, before anything happens.

    describe_counter!(
        "http_requests_total",
        "HTTP calls made to the timesync API"
    );

    describe_counter!(
        "time_readings_total",
        "Readings served by GET /api/time, labelled by where the timestamp came from"
    );
    for source in ["local", "ntp", "ntp_partial", "local_fallback"] {
        counter!("time_readings_total", "source" => source).absolute(0);
    }

    describe_counter!(
        "ntp_query_failures_total",
        "NTP queries that ended in a fallback to the local clock, labelled by error kind"
    );

    Arc::new(RwLock::new(builder))
}
