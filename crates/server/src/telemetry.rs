use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LogFormat;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"))
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init(name: &str, format: LogFormat) -> anyhow::Result<()> {
    match format {
        LogFormat::Json => {
            let subscriber = Registry::default()
                .with(env_filter())
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(name.to_string(), std::io::stdout));
            set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = Registry::default().with(env_filter()).with(fmt::layer().with_target(false));
            set_global_default(subscriber)?;
        }
    }
    Ok(())
}
