use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber. `RUST_LOG` adds to the
/// default `asset_flow=info` directive. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env().add_directive(
            "asset_flow=info"
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );

        // A subscriber installed elsewhere (e.g. by a test harness) wins.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init_tracing();
        super::init_tracing();
    }
}
