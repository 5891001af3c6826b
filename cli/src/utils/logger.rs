use tracing::{debug, info, warn};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging. `RUST_LOG` wins over `default_directive`.
pub fn init_logger(default_directive: &str) -> anyhow::Result<()> {
    let timer = ChronoUtc::rfc_3339();

    let format_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(format_layer)
        .try_init()?;

    Ok(())
}

/// Logger with a fixed context prefix
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
        }
    }

    pub fn warn_with_error(&self, message: &str, error: &dyn std::error::Error) {
        warn!("{}: {}: {}", self.context, message, error);
    }

    pub fn debug(&self, message: &str) {
        debug!("{}: {}", self.context, message);
    }
}

/// [FETCH] - Data fetch operations
pub fn log_fetch(message: &str) {
    info!("FETCH: {}", message);
}

/// [CACHE] - Cache operations
pub fn log_cache(message: &str) {
    debug!("CACHE: {}", message);
}

/// Performance timing helper
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn log_elapsed(&self, context: &str) {
        debug!("{}: {} completed in {:.1}ms", context, self.name, self.elapsed_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_timer_measures_elapsed_time() {
        let timer = Timer::start("noop");
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(timer.elapsed_ms() >= 2.0);
        timer.log_elapsed("TEST");
    }

    #[test]
    fn test_logger_accepts_fetch_errors() {
        let logger = Logger::new("TEST");
        logger.debug("starting");
        logger.warn_with_error("AAPL answered 502", &FetchError::upstream("502 Bad Gateway"));
    }
}
