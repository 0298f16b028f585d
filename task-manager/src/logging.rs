use crate::config::Config;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `LOG_LEVEL` accepts anything `EnvFilter` understands, e.g. `debug` or
/// `info,sqlx=warn`. An unparsable value falls back to `info`. Production
/// deployments log JSON lines; everything else gets the human readable format.
pub fn init(config: &Config) -> anyhow::Result<()> {
    let (filter, invalid_level) = match EnvFilter::try_new(&config.log_level) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err)),
    };

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))?;
    }

    if let Some(err) = invalid_level {
        tracing::warn!(
            "Invalid LOG_LEVEL '{}', falling back to info: {}",
            config.log_level,
            err
        );
    }
    Ok(())
}
