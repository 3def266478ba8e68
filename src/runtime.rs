use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::assemble::TelemetryConfiguration;

const LOG_FILTER_DEFAULT: &str = "info";

/// Live telemetry built from an assembled configuration. Owns the providers
/// for the process lifetime; call [`Runtime::shutdown`] to flush on exit.
pub struct Runtime {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

impl Runtime {
    pub fn has_tracer(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn has_meter(&self) -> bool {
        self.meter.is_some()
    }

    pub fn shutdown(self) {
        if let Some(provider) = self.meter {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down meter provider: {e:?}");
            }
        }
        if let Some(provider) = self.tracer {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e:?}");
            }
        }
    }
}

/// Consume an assembled configuration: install the global propagator, build
/// and register the SDK providers, and wire the `tracing` subscriber. The
/// Tokio runtime requirement sits on assembly, where the batch processor and
/// periodic reader are constructed and spawn their drain tasks.
pub fn init(config: TelemetryConfiguration) -> Result<Runtime> {
    if let Some(stack) = config.propagators {
        global::set_text_map_propagator(stack);
    }

    let resource = config.resource.to_resource();

    let tracer_provider = config.trace_pipeline.map(|pipeline| {
        SdkTracerProvider::builder()
            .with_span_processor(pipeline.processor)
            .with_resource(resource.clone())
            .with_sampler(config.sampler.clone())
            .build()
    });

    let meter_provider = config.metric_pipeline.map(|pipeline| {
        SdkMeterProvider::builder()
            .with_reader(pipeline.reader)
            .with_resource(resource.clone())
            .build()
    });

    if let Some(ref provider) = tracer_provider {
        global::set_tracer_provider(provider.clone());
    }
    if let Some(ref provider) = meter_provider {
        global::set_meter_provider(provider.clone());
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER_DEFAULT));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    // try_init: assembly with debug may already have installed a subscriber.
    match tracer_provider.as_ref() {
        Some(provider) => {
            let tracer = provider.tracer(config.resource.service_name.clone());
            let _ = subscriber
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init();
        }
        None => {
            let _ = subscriber.try_init();
        }
    }

    Ok(Runtime {
        tracer: tracer_provider,
        meter: meter_provider,
    })
}
