//! Tracing subscriber bootstrap shared by the server and the CLI.

use anyhow::Context;
use shelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("invalid log level '{}'", settings.level)),
    }
}

/// Install the global subscriber writing to stdout. Calling it twice is a no-op.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    install(settings, Output::Stdout)
}

/// Like [`init`] but logs go to stderr, leaving stdout for command output.
pub fn init_stderr(settings: &TelemetrySettings) -> anyhow::Result<()> {
    install(settings, Output::Stderr)
}

#[derive(Debug, Clone, Copy)]
enum Output {
    Stdout,
    Stderr,
}

fn install(settings: &TelemetrySettings, output: Output) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;

    let installed = match (settings.log_format.clone(), output) {
        (LogFormat::Pretty, Output::Stdout) => fmt().with_env_filter(filter).try_init(),
        (LogFormat::Pretty, Output::Stderr) => fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init(),
        (LogFormat::Json, Output::Stdout) => fmt().json().with_env_filter(filter).try_init(),
        (LogFormat::Json, Output::Stderr) => fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            target: "shelf-telemetry",
            format = ?settings.log_format,
            ?output,
            "telemetry initialized"
        );
    }

    Ok(())
}
