use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "tutora=debug,tutora_api=debug,tutora_upload=debug,tutora_storage=debug,tower_http=debug";

/// Initialize tracing: JSON lines in production, compact console output otherwise.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_telemetry(is_production: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if is_production {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?;
    }

    tracing::debug!(is_production, "Tracing initialized");
    Ok(())
}
