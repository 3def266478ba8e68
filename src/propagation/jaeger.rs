use std::sync::LazyLock;

use opentelemetry::Context;
use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{
    SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
};

const JAEGER_HEADER: &str = "uber-trace-id";
/// The third field is the deprecated parent span id; always written as zero.
const DEPRECATED_PARENT_SPAN: &str = "0";

static JAEGER_FIELDS: LazyLock<[String; 1]> = LazyLock::new(|| [JAEGER_HEADER.to_string()]);

/// Codec for the Jaeger `uber-trace-id` header:
/// `{trace-id}:{span-id}:0:{flags}` with hex fields.
#[derive(Clone, Debug, Default)]
pub struct JaegerPropagator;

impl JaegerPropagator {
    pub fn new() -> Self {
        Self
    }

    fn extract_span_context(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let header = extractor.get(JAEGER_HEADER)?;
        // Callers forwarding the header through W3C-restricted carriers may
        // percent-encode the separator.
        let header = header.replace("%3A", ":");

        let mut parts = header.split(':');
        let trace_id = TraceId::from_hex(parts.next()?).ok()?;
        let span_id = SpanId::from_hex(parts.next()?).ok()?;
        let _parent = parts.next()?;
        let flags = u8::from_str_radix(parts.next()?, 16).ok()?;
        if parts.next().is_some() {
            return None;
        }

        let trace_flags = if flags & 0x01 == 0x01 {
            TraceFlags::SAMPLED
        } else {
            TraceFlags::default()
        };

        let span_context =
            SpanContext::new(trace_id, span_id, trace_flags, true, TraceState::default());
        span_context.is_valid().then_some(span_context)
    }
}

impl TextMapPropagator for JaegerPropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span_context = cx.span().span_context().clone();
        if !span_context.is_valid() {
            return;
        }

        let flags: u8 = if span_context.trace_flags().is_sampled() {
            1
        } else {
            0
        };
        injector.set(
            JAEGER_HEADER,
            format!(
                "{}:{}:{}:{:x}",
                span_context.trace_id(),
                span_context.span_id(),
                DEPRECATED_PARENT_SPAN,
                flags
            ),
        );
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        match self.extract_span_context(extractor) {
            Some(span_context) => cx.with_remote_span_context(span_context),
            None => cx.clone(),
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(JAEGER_FIELDS.as_ref())
    }
}
