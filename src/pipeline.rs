use std::time::Duration;

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::PeriodicReader;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::BatchSpanProcessor;

use crate::error::AssemblyError;

/// Fixed metric collection interval.
pub const COLLECTION_INTERVAL: Duration = Duration::from_millis(1000);

/// Span export side of the configuration. The OTLP exporter is fused into
/// its batch processor at construction; there is no processor-without-
/// exporter state.
pub struct TracePipeline {
    pub endpoint: String,
    pub processor: BatchSpanProcessor<runtime::Tokio>,
}

impl std::fmt::Debug for TracePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracePipeline")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Metric export side. The periodic reader owns the exporter and collects on
/// a fixed interval with the SDK's default (ungrouped) aggregation: every
/// distinct attribute set exports as its own series.
pub struct MetricPipeline {
    pub endpoint: String,
    pub reader: PeriodicReader,
    pub interval: Duration,
}

impl std::fmt::Debug for MetricPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricPipeline")
            .field("endpoint", &self.endpoint)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Build the span pipeline iff a trace destination is configured. Exporter
/// construction failure is surfaced, never downgraded to "tracing off".
///
/// Requires a running Tokio runtime: the batch processor spawns its drain
/// task at construction time. Calling outside one is a construction error,
/// not a panic.
pub fn select_trace_exporter(
    trace_endpoint: Option<&str>,
) -> Result<Option<TracePipeline>, AssemblyError> {
    let Some(endpoint) = trace_endpoint else {
        return Ok(None);
    };
    require_tokio_runtime("trace", endpoint)?;

    let normalized = normalize_endpoint(endpoint, "/v1/traces");
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(normalized.clone())
        .build()
        .map_err(|e| AssemblyError::ExporterConstruction {
            signal: "trace",
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();
    tracing::debug!(endpoint = %normalized, "trace pipeline wired");

    Ok(Some(TracePipeline {
        endpoint: normalized,
        processor,
    }))
}

/// Build the metric pipeline iff a metrics destination is configured.
/// Independent of the trace switch. Same Tokio-runtime requirement as
/// [`select_trace_exporter`]: the periodic reader spawns its ticker on
/// construction.
pub fn select_metric_exporter(
    metrics_endpoint: Option<&str>,
) -> Result<Option<MetricPipeline>, AssemblyError> {
    let Some(endpoint) = metrics_endpoint else {
        return Ok(None);
    };
    require_tokio_runtime("metric", endpoint)?;

    let normalized = normalize_endpoint(endpoint, "/v1/metrics");
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_endpoint(normalized.clone())
        .build()
        .map_err(|e| AssemblyError::ExporterConstruction {
            signal: "metric",
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    let reader = PeriodicReader::builder(exporter, runtime::Tokio)
        .with_interval(COLLECTION_INTERVAL)
        .build();
    tracing::debug!(endpoint = %normalized, "metric pipeline wired");

    Ok(Some(MetricPipeline {
        endpoint: normalized,
        reader,
        interval: COLLECTION_INTERVAL,
    }))
}

/// The batch processor and periodic reader call `tokio::spawn` when built,
/// which panics without a reactor. Turn that into a reportable error before
/// constructing anything.
fn require_tokio_runtime(signal: &'static str, endpoint: &str) -> Result<(), AssemblyError> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| AssemblyError::ExporterConstruction {
            signal,
            endpoint: endpoint.to_string(),
            message: "batch export requires a running Tokio runtime".to_string(),
        })
}

fn normalize_endpoint(endpoint: &str, signal_path: &str) -> String {
    if endpoint.ends_with(signal_path) {
        endpoint.to_string()
    } else {
        format!("{}{}", endpoint.trim_end_matches('/'), signal_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_endpoints_yield_no_pipelines() {
        assert!(select_trace_exporter(None).unwrap().is_none());
        assert!(select_metric_exporter(None).unwrap().is_none());
    }

    #[test]
    fn test_endpoint_normalization() {
        assert_eq!(
            normalize_endpoint("http://localhost:4318", "/v1/traces"),
            "http://localhost:4318/v1/traces"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:4318/", "/v1/metrics"),
            "http://localhost:4318/v1/metrics"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:4318/v1/traces", "/v1/traces"),
            "http://localhost:4318/v1/traces"
        );
    }

    #[test]
    fn test_endpoint_outside_tokio_runtime_is_an_error_not_a_panic() {
        let result = select_trace_exporter(Some("http://collector:4318"));
        assert!(matches!(
            result,
            Err(AssemblyError::ExporterConstruction { signal: "trace", .. })
        ));

        let result = select_metric_exporter(Some("http://collector:4318"));
        assert!(matches!(
            result,
            Err(AssemblyError::ExporterConstruction { signal: "metric", .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_trace_endpoint_surfaces_construction_error() {
        let result = select_trace_exporter(Some("not a url at all"));

        match result {
            Err(AssemblyError::ExporterConstruction {
                signal, endpoint, ..
            }) => {
                assert_eq!(signal, "trace");
                assert_eq!(endpoint, "not a url at all");
            }
            other => panic!("expected ExporterConstruction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_metrics_endpoint_surfaces_construction_error() {
        let result = select_metric_exporter(Some("not a url at all"));

        assert!(matches!(
            result,
            Err(AssemblyError::ExporterConstruction { signal: "metric", .. })
        ));
    }

    #[tokio::test]
    async fn test_trace_pipeline_present_with_endpoint() {
        let pipeline = select_trace_exporter(Some("http://localhost:4318"))
            .unwrap()
            .expect("pipeline should be present");

        assert_eq!(pipeline.endpoint, "http://localhost:4318/v1/traces");
    }

    #[tokio::test]
    async fn test_metric_pipeline_fixed_interval() {
        let pipeline = select_metric_exporter(Some("http://localhost:4318"))
            .unwrap()
            .expect("pipeline should be present");

        assert_eq!(pipeline.interval, COLLECTION_INTERVAL);
        assert_eq!(pipeline.endpoint, "http://localhost:4318/v1/metrics");
    }
}
