use opentelemetry_sdk::trace::Sampler;

use crate::diagnostics::{Diagnostics, StderrDiagnostics};
use crate::error::AssemblyError;
use crate::instrument::{self, EnrichmentPolicy, Instrumentation};
use crate::options::TelemetryOptions;
use crate::pipeline::{self, MetricPipeline, TracePipeline};
use crate::propagation::{self, PropagatorStack};
use crate::resource::{self, ResourceIdentity};

/// The assembled configuration: the single artifact handed to the runtime
/// initializer. Constructed once at startup, immutable afterward. Sampling
/// is fixed always-on and span limits are left at SDK defaults.
pub struct TelemetryConfiguration {
    pub resource: ResourceIdentity,
    pub propagators: Option<PropagatorStack>,
    pub trace_pipeline: Option<TracePipeline>,
    pub metric_pipeline: Option<MetricPipeline>,
    pub instrumentations: Vec<Instrumentation>,
    pub enrichment: EnrichmentPolicy,
    pub sampler: Sampler,
    pub debug: bool,
}

impl std::fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfiguration")
            .field("resource", &self.resource)
            .field("propagators", &self.propagators)
            .field("trace_pipeline", &self.trace_pipeline)
            .field("metric_pipeline", &self.metric_pipeline)
            .field("instrumentations", &self.instrumentations)
            .field("enrichment", &self.enrichment)
            .field("debug", &self.debug)
            .finish()
    }
}

impl TelemetryConfiguration {
    pub fn has_trace_pipeline(&self) -> bool {
        self.trace_pipeline.is_some()
    }

    pub fn has_metric_pipeline(&self) -> bool {
        self.metric_pipeline.is_some()
    }
}

/// Compile options into a fully-wired configuration. Deterministic: the same
/// options always produce the same resource identity, propagator ordering,
/// and instrumentation set; exporter and processor instances are fresh per
/// call. With `debug` set, the stderr diagnostics capability is enabled as a
/// documented side channel.
///
/// When an endpoint is configured, assembly must run inside a Tokio runtime
/// (the batch processor and periodic reader spawn their drain tasks on
/// construction); outside one it fails with
/// [`AssemblyError::ExporterConstruction`] rather than panicking.
pub fn assemble(options: &TelemetryOptions) -> Result<TelemetryConfiguration, AssemblyError> {
    assemble_with(options, &StderrDiagnostics)
}

/// `assemble` with an explicit diagnostics capability, so callers and tests
/// control the one global effect.
pub fn assemble_with(
    options: &TelemetryOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<TelemetryConfiguration, AssemblyError> {
    if options.service.is_empty() {
        return Err(AssemblyError::InvalidOptions(
            "service is required and must be non-empty".to_string(),
        ));
    }

    if options.debug {
        diagnostics.enable_verbose();
    }

    let resource = resource::resolve(options);
    let propagators = propagation::compose(options.trace_endpoint.as_deref());
    let trace_pipeline = pipeline::select_trace_exporter(options.trace_endpoint.as_deref())?;
    let metric_pipeline = pipeline::select_metric_exporter(options.metrics_endpoint.as_deref())?;
    let instrumentations = instrument::select(options);

    tracing::debug!(
        service = %resource.service_name,
        tracing = trace_pipeline.is_some(),
        metrics = metric_pipeline.is_some(),
        "telemetry configuration assembled"
    );

    Ok(TelemetryConfiguration {
        resource,
        propagators,
        trace_pipeline,
        metric_pipeline,
        instrumentations,
        enrichment: EnrichmentPolicy::new(options.debug),
        sampler: Sampler::AlwaysOn,
        debug: options.debug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoopDiagnostics;

    #[test]
    fn test_empty_service_is_rejected() {
        let options = TelemetryOptions::new("");
        let result = assemble_with(&options, &NoopDiagnostics);

        assert!(matches!(result, Err(AssemblyError::InvalidOptions(_))));
    }

    #[test]
    fn test_no_trace_endpoint_means_no_propagators_and_no_pipeline() {
        let options = TelemetryOptions::new("svc");
        let config = assemble_with(&options, &NoopDiagnostics).unwrap();

        assert!(config.propagators.is_none());
        assert!(!config.has_trace_pipeline());
        assert!(!config.has_metric_pipeline());
        assert!(matches!(config.sampler, Sampler::AlwaysOn));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let options = TelemetryOptions::new("svc")
            .with_environment("staging")
            .with_database(true);

        let first = assemble_with(&options, &NoopDiagnostics).unwrap();
        let second = assemble_with(&options, &NoopDiagnostics).unwrap();

        assert_eq!(first.resource, second.resource);
        assert_eq!(first.instrumentations, second.instrumentations);
        assert_eq!(first.propagators.is_some(), second.propagators.is_some());
        assert_eq!(first.enrichment, second.enrichment);
    }

    #[tokio::test]
    async fn test_trace_endpoint_enables_propagators_and_pipeline() {
        let options =
            TelemetryOptions::new("svc").with_trace_endpoint("http://collector:4318");
        let config = assemble_with(&options, &NoopDiagnostics).unwrap();

        assert!(config.propagators.is_some());
        assert!(config.has_trace_pipeline());
        assert!(!config.has_metric_pipeline());
    }
}
