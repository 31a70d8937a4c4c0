//! Logging helpers.

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Safe to call more than
/// once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Startup banner.
pub fn log_startup(model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 quiz pipeline starting - model: {}", model_name);
    info!(
        "started at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// Final statistics after a batch run.
pub fn log_summary(succeeded: usize, failed: usize) {
    info!("{}", "=".repeat(60));
    info!("✅ done: {} succeeded, {} failed", succeeded, failed);
    info!("{}", "=".repeat(60));
}

/// Truncate long text for log display.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("Thủ đô của Việt Nam", 6), "Thủ đô...");
    }
}
