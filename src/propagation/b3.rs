use std::sync::LazyLock;

use opentelemetry::Context;
use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{
    SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
};

const B3_SINGLE_HEADER: &str = "b3";
const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
const B3_SPAN_ID_HEADER: &str = "x-b3-spanid";
const B3_SAMPLED_HEADER: &str = "x-b3-sampled";

static B3_SINGLE_FIELDS: LazyLock<[String; 1]> =
    LazyLock::new(|| [B3_SINGLE_HEADER.to_string()]);
static B3_MULTI_FIELDS: LazyLock<[String; 3]> = LazyLock::new(|| {
    [
        B3_TRACE_ID_HEADER.to_string(),
        B3_SPAN_ID_HEADER.to_string(),
        B3_SAMPLED_HEADER.to_string(),
    ]
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    SingleHeader,
    MultipleHeaders,
}

/// Codec for Zipkin B3 headers. One instance per encoding; each variant
/// reads and writes only its own headers so the two can sit side by side in
/// a composite.
#[derive(Clone, Debug)]
pub struct B3Propagator {
    encoding: Encoding,
}

impl B3Propagator {
    /// `b3: {trace-id}-{span-id}-{sampling}`
    pub fn single_header() -> Self {
        Self {
            encoding: Encoding::SingleHeader,
        }
    }

    /// `x-b3-traceid` / `x-b3-spanid` / `x-b3-sampled`
    pub fn multiple_headers() -> Self {
        Self {
            encoding: Encoding::MultipleHeaders,
        }
    }

    fn extract_single(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let header = extractor.get(B3_SINGLE_HEADER)?;

        let mut parts = header.split('-');
        let trace_id = TraceId::from_hex(parts.next()?).ok()?;
        let span_id = SpanId::from_hex(parts.next()?).ok()?;
        let trace_flags = match parts.next() {
            Some(sampling) => sampling_flags(sampling)?,
            None => TraceFlags::default(),
        };
        // A fourth field (parent span id) is tolerated, anything further is not.
        let _parent = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let span_context =
            SpanContext::new(trace_id, span_id, trace_flags, true, TraceState::default());
        span_context.is_valid().then_some(span_context)
    }

    fn extract_multi(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let trace_id = TraceId::from_hex(extractor.get(B3_TRACE_ID_HEADER)?).ok()?;
        let span_id = SpanId::from_hex(extractor.get(B3_SPAN_ID_HEADER)?).ok()?;
        let trace_flags = match extractor.get(B3_SAMPLED_HEADER) {
            Some(sampled) => sampling_flags(sampled)?,
            None => TraceFlags::default(),
        };

        let span_context =
            SpanContext::new(trace_id, span_id, trace_flags, true, TraceState::default());
        span_context.is_valid().then_some(span_context)
    }
}

fn sampling_flags(value: &str) -> Option<TraceFlags> {
    match value {
        // "d" is B3's deferred/debug decision; treat it as sampled.
        "1" | "true" | "d" => Some(TraceFlags::SAMPLED),
        "0" | "false" => Some(TraceFlags::default()),
        _ => None,
    }
}

impl TextMapPropagator for B3Propagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span_context = cx.span().span_context().clone();
        if !span_context.is_valid() {
            return;
        }

        let sampled = if span_context.trace_flags().is_sampled() {
            "1"
        } else {
            "0"
        };
        match self.encoding {
            Encoding::SingleHeader => {
                injector.set(
                    B3_SINGLE_HEADER,
                    format!(
                        "{}-{}-{}",
                        span_context.trace_id(),
                        span_context.span_id(),
                        sampled
                    ),
                );
            }
            Encoding::MultipleHeaders => {
                injector.set(B3_TRACE_ID_HEADER, span_context.trace_id().to_string());
                injector.set(B3_SPAN_ID_HEADER, span_context.span_id().to_string());
                injector.set(B3_SAMPLED_HEADER, sampled.to_string());
            }
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        let extracted = match self.encoding {
            Encoding::SingleHeader => self.extract_single(extractor),
            Encoding::MultipleHeaders => self.extract_multi(extractor),
        };

        match extracted {
            Some(span_context) => cx.with_remote_span_context(span_context),
            None => cx.clone(),
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        match self.encoding {
            Encoding::SingleHeader => FieldIter::new(B3_SINGLE_FIELDS.as_ref()),
            Encoding::MultipleHeaders => FieldIter::new(B3_MULTI_FIELDS.as_ref()),
        }
    }
}
