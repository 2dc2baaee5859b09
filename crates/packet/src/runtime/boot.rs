//! Boot — logging init, config load, pipeline construction.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::{ConfigError, ReaderConfig};
use crate::filter::Pipeline;

/// Initialise the tracing / logging subsystem. Logs go to stderr so stdout
/// carries only packets.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate config, then build the filter pipeline.
pub fn boot() -> Result<(ReaderConfig, Pipeline), ConfigError> {
    info!("Starting aisreader v{}", env!("CARGO_PKG_VERSION"));

    let config = ReaderConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!(
        "Loaded configuration: filters={}, max_packet_lines={}, write_rejected={}",
        config.filters.len(),
        config.max_packet_lines,
        config.write_rejected
    );

    let pipeline = build_pipeline(&config)?;
    Ok((config, pipeline))
}

pub fn build_pipeline(config: &ReaderConfig) -> Result<Pipeline, ConfigError> {
    let configs = config.filter_configurations()?;
    let pipeline = Pipeline::build(&configs)?;
    for stage in pipeline.stages() {
        info!("Filter stage: {}", stage.name());
    }
    Ok(pipeline)
}
