use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const CLI_PREFIX: &str = "cli";

const LOG_DIR: &str = "logs";
const DEFAULT_LEVEL: &str = "debug";

/// Level asked for on the command line. `--log` alone means everything, an explicit filter
/// wins over it.
pub fn level_from_flags(log: bool, filter: Option<LevelFilter>) -> Option<LevelFilter> {
    match (log, filter) {
        (_, Some(level)) => Some(level),
        (true, None) => Some(LevelFilter::TRACE),
        (false, None) => None,
    }
}

/// Filter directive limited to this crate, so reqwest and hyper internals stay quiet.
fn directive(level: Option<LevelFilter>, rust_log: Option<String>) -> String {
    let level = level
        .map(|v| v.to_string())
        .or(rust_log)
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Logs always go to daily rotated files under `application_data_path/logs`. Console output is
/// only added when `show_std` is set, otherwise it would mix with the report.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(application_data_path.join(LOG_DIR))?;

    let stderr = std::io::stderr.with_filter(move |_| show_std);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive(
            log_level,
            std::env::var("RUST_LOG").ok(),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
