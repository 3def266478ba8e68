use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "debug";

/// The one global effect assembly performs: turning on verbose diagnostic
/// logging when the debug option is set. Reified as a capability so tests
/// can substitute [`NoopDiagnostics`] instead of tearing down global state.
pub trait Diagnostics {
    fn enable_verbose(&self);
}

/// Installs a debug-level fmt subscriber on stderr. Idempotent: if a global
/// subscriber is already installed the call is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn enable_verbose(&self) {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(VERBOSE_FILTER));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);

        let _ = Registry::default().with(env_filter).with(fmt_layer).try_init();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn enable_verbose(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_diagnostics_is_inert() {
        NoopDiagnostics.enable_verbose();
        NoopDiagnostics.enable_verbose();
    }

    #[test]
    fn test_stderr_diagnostics_is_idempotent() {
        StderrDiagnostics.enable_verbose();
        StderrDiagnostics.enable_verbose();
    }
}
