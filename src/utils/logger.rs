use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither RUST_LOG nor a level is given
pub const DEFAULT_FILTER: &str = "info,sftp_connector=debug";

/// Filter directive applying `level` to dependencies and this crate alike.
///
/// russh logs every packet at debug, so callers asking for `debug` or
/// `trace` get it from russh too.
pub fn filter_directive(level: &str) -> String {
    format!("{},sftp_connector={}", level, level)
}

/// Install the fmt subscriber, filtered by RUST_LOG or [`DEFAULT_FILTER`].
///
/// Connection progress (host key checks, auth attempts) is logged under the
/// `sftp_connector` target; handshake detail comes from `russh`.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install the fmt subscriber at a fixed level, ignoring RUST_LOG
pub fn init_with_level(level: &str) {
    install(EnvFilter::new(filter_directive(level)));
    tracing::debug!("Logging initialized with level: {}", level);
}

fn install(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();
}
