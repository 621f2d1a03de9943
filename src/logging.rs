//! Tracing subscriber setup

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` directives are honoured; the configured level is added for
/// this crate on top of them. `format` selects `json` or human-readable
/// `pretty` output.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&config.level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.try_init(),
        other => bail!("Unknown log format {other:?}, expected json or pretty"),
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    let directive = format!("heart_disease_pipeline={level}")
        .parse()
        .with_context(|| format!("Invalid log level {level:?}"))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}
