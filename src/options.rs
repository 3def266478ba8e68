use std::env;

/// Input to assembly. Built once at process startup and never mutated.
#[derive(Clone, Debug)]
pub struct TelemetryOptions {
    pub service: String,
    pub environment: Option<String>,
    pub version: Option<String>,
    /// Inert: HTTP instrumentation is always selected. Kept so callers can
    /// pass their full flag set through unchanged.
    pub use_http_framework: bool,
    pub use_web_framework: bool,
    pub use_rpc_framework: bool,
    pub use_database: bool,
    pub debug: bool,
    pub trace_endpoint: Option<String>,
    pub metrics_endpoint: Option<String>,
}

impl TelemetryOptions {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            environment: None,
            version: None,
            use_http_framework: true,
            use_web_framework: false,
            use_rpc_framework: false,
            use_database: false,
            debug: false,
            trace_endpoint: None,
            metrics_endpoint: None,
        }
    }

    /// Read options from the conventional `OTEL_*` environment variables.
    pub fn from_env() -> Self {
        let mut options = Self::new(env::var("OTEL_SERVICE_NAME").unwrap_or_default());
        options.environment = env::var("DEPLOYMENT_ENVIRONMENT").ok();
        options.version = env::var("OTEL_SERVICE_VERSION").ok();
        options.use_web_framework = flag_from_env("OTEL_INSTRUMENT_WEB");
        options.use_rpc_framework = flag_from_env("OTEL_INSTRUMENT_RPC");
        options.use_database = flag_from_env("OTEL_INSTRUMENT_DB");
        options.debug = flag_from_env("OTEL_DEBUG");
        options.trace_endpoint = env::var("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT").ok();
        options.metrics_endpoint = env::var("OTEL_EXPORTER_OTLP_METRICS_ENDPOINT").ok();
        options
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_web_framework(mut self, enabled: bool) -> Self {
        self.use_web_framework = enabled;
        self
    }

    pub fn with_rpc_framework(mut self, enabled: bool) -> Self {
        self.use_rpc_framework = enabled;
        self
    }

    pub fn with_database(mut self, enabled: bool) -> Self {
        self.use_database = enabled;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn with_trace_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.trace_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_metrics_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metrics_endpoint = Some(endpoint.into());
        self
    }
}

fn flag_from_env(name: &str) -> bool {
    matches!(
        env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("True")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = TelemetryOptions::new("test-service");

        assert_eq!(options.service, "test-service");
        assert!(options.environment.is_none());
        assert!(options.version.is_none());
        assert!(options.use_http_framework);
        assert!(!options.use_web_framework);
        assert!(!options.use_rpc_framework);
        assert!(!options.use_database);
        assert!(!options.debug);
        assert!(options.trace_endpoint.is_none());
        assert!(options.metrics_endpoint.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = TelemetryOptions::new("checkout")
            .with_environment("prod")
            .with_version("1.2.3")
            .with_web_framework(true)
            .with_database(true)
            .with_trace_endpoint("http://localhost:4318");

        assert_eq!(options.environment.as_deref(), Some("prod"));
        assert_eq!(options.version.as_deref(), Some("1.2.3"));
        assert!(options.use_web_framework);
        assert!(options.use_database);
        assert_eq!(
            options.trace_endpoint.as_deref(),
            Some("http://localhost:4318")
        );
        assert!(options.metrics_endpoint.is_none());
    }

    #[test]
    fn test_flag_parsing() {
        unsafe {
            env::set_var("OTEL_BOOTSTRAP_TEST_FLAG", "true");
        }
        assert!(flag_from_env("OTEL_BOOTSTRAP_TEST_FLAG"));

        unsafe {
            env::set_var("OTEL_BOOTSTRAP_TEST_FLAG", "0");
        }
        assert!(!flag_from_env("OTEL_BOOTSTRAP_TEST_FLAG"));

        unsafe {
            env::remove_var("OTEL_BOOTSTRAP_TEST_FLAG");
        }
        assert!(!flag_from_env("OTEL_BOOTSTRAP_TEST_FLAG"));
    }
}
