mod b3;
mod jaeger;
mod xray;

pub use b3::B3Propagator;
pub use jaeger::JaegerPropagator;
pub use xray::XrayPropagator;

use opentelemetry::Context;
use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

/// Wire formats the stack speaks, in their composition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationFormat {
    Jaeger,
    TraceContext,
    Baggage,
    B3Single,
    B3Multi,
    Xray,
}

struct StackEntry {
    format: PropagationFormat,
    propagator: Box<dyn TextMapPropagator + Send + Sync>,
}

/// Ordered composite over the supported wire formats. Injection writes every
/// format's headers so any downstream convention is satisfied; extraction
/// takes the first format that yields a valid span context. Baggage carries
/// no span context and is always applied.
///
/// The ordering is a contract, not an iteration accident.
pub struct PropagatorStack {
    entries: Vec<StackEntry>,
    fields: Vec<String>,
}

impl PropagatorStack {
    /// The fixed stack: Jaeger, W3C trace context, W3C baggage, B3 single
    /// header, B3 multi header, AWS X-Ray.
    pub fn standard() -> Self {
        Self::from_entries(vec![
            StackEntry {
                format: PropagationFormat::Jaeger,
                propagator: Box::new(JaegerPropagator::new()),
            },
            StackEntry {
                format: PropagationFormat::TraceContext,
                propagator: Box::new(TraceContextPropagator::new()),
            },
            StackEntry {
                format: PropagationFormat::Baggage,
                propagator: Box::new(BaggagePropagator::new()),
            },
            StackEntry {
                format: PropagationFormat::B3Single,
                propagator: Box::new(B3Propagator::single_header()),
            },
            StackEntry {
                format: PropagationFormat::B3Multi,
                propagator: Box::new(B3Propagator::multiple_headers()),
            },
            StackEntry {
                format: PropagationFormat::Xray,
                propagator: Box::new(XrayPropagator::new()),
            },
        ])
    }

    fn from_entries(entries: Vec<StackEntry>) -> Self {
        let fields = entries
            .iter()
            .flat_map(|entry| entry.propagator.fields())
            .map(String::from)
            .collect();
        Self { entries, fields }
    }

    pub fn formats(&self) -> Vec<PropagationFormat> {
        self.entries.iter().map(|entry| entry.format).collect()
    }
}

impl std::fmt::Debug for PropagatorStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagatorStack")
            .field("formats", &self.formats())
            .finish()
    }
}

impl TextMapPropagator for PropagatorStack {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        for entry in &self.entries {
            entry.propagator.inject_context(cx, injector);
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        let mut cx = cx.clone();
        let mut matched = false;

        for entry in &self.entries {
            if entry.format == PropagationFormat::Baggage {
                cx = entry.propagator.extract_with_context(&cx, extractor);
                continue;
            }
            if matched {
                continue;
            }
            let candidate = entry.propagator.extract_with_context(&cx, extractor);
            if candidate.span().span_context().is_valid() {
                cx = candidate;
                matched = true;
            }
        }

        cx
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&self.fields)
    }
}

/// Build the composite only when a trace destination exists; propagation has
/// no business running when tracing is disabled.
pub fn compose(trace_endpoint: Option<&str>) -> Option<PropagatorStack> {
    trace_endpoint.map(|_| PropagatorStack::standard())
}
