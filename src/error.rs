use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The options record cannot identify a service. Fatal at startup: the
    /// process must not run telemetry with an unidentified resource.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// An exporter for a configured endpoint could not be constructed. A
    /// present-but-malformed endpoint is an error, never a silent disable.
    #[error("failed to construct {signal} exporter for `{endpoint}`: {message}")]
    ExporterConstruction {
        signal: &'static str,
        endpoint: String,
        message: String,
    },
}
