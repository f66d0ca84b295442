//! Prometheus exposition for the auth counters

use cinelog_auth_core::telemetry;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the auth counters.
///
/// The returned handle renders the text format served on `/metrics`.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    telemetry::describe();
    Ok(handle)
}
