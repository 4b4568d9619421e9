use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;

const PREFIX: &str = "formbridge";

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Build(#[from] metrics_exporter_statsd::StatsdError),
    #[error("could not install metrics recorder: {0}")]
    Install(String),
}

/// Sends metrics to statsd. Without a config every metric call is a no-op.
pub fn init(config: Option<&MetricsConfig>) -> Result<(), MetricsError> {
    let Some(config) = config else {
        tracing::debug!("No metrics config, metrics are disabled");
        return Ok(());
    };

    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(PREFIX))?;
    ::metrics::set_global_recorder(recorder).map_err(|e| MetricsError::Install(e.to_string()))?;

    shared::metrics_defs::describe_all(brightdoor::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
