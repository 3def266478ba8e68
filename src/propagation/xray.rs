use std::sync::LazyLock;

use opentelemetry::Context;
use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{
    SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
};

const XRAY_HEADER: &str = "x-amzn-trace-id";
const XRAY_VERSION: &str = "1";

static XRAY_FIELDS: LazyLock<[String; 1]> = LazyLock::new(|| [XRAY_HEADER.to_string()]);

/// Codec for the AWS X-Ray trace header:
/// `Root=1-{epoch-8hex}-{unique-24hex};Parent={span-16hex};Sampled={0|1}`.
/// The 128-bit trace id is the epoch and unique parts concatenated.
#[derive(Clone, Debug, Default)]
pub struct XrayPropagator;

impl XrayPropagator {
    pub fn new() -> Self {
        Self
    }

    fn extract_span_context(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        let header = extractor.get(XRAY_HEADER)?;

        let mut trace_id: Option<TraceId> = None;
        let mut span_id: Option<SpanId> = None;
        let mut trace_flags = TraceFlags::default();

        for part in header.split(';') {
            let part = part.trim();
            // A trailing `;` leaves an empty segment; not a malformed header.
            if part.is_empty() {
                continue;
            }
            let (key, value) = part.split_once('=')?;
            match key {
                "Root" => {
                    let mut segments = value.split('-');
                    if segments.next() != Some(XRAY_VERSION) {
                        return None;
                    }
                    let epoch = segments.next()?;
                    let unique = segments.next()?;
                    if segments.next().is_some() || epoch.len() != 8 || unique.len() != 24 {
                        return None;
                    }
                    trace_id = Some(TraceId::from_hex(&format!("{epoch}{unique}")).ok()?);
                }
                "Parent" => span_id = Some(SpanId::from_hex(value).ok()?),
                "Sampled" => {
                    trace_flags = match value {
                        "1" => TraceFlags::SAMPLED,
                        "0" => TraceFlags::default(),
                        _ => return None,
                    };
                }
                // Vendors append their own key=value pairs; ignore them.
                _ => {}
            }
        }

        let span_context = SpanContext::new(
            trace_id?,
            span_id?,
            trace_flags,
            true,
            TraceState::default(),
        );
        span_context.is_valid().then_some(span_context)
    }
}

impl TextMapPropagator for XrayPropagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span_context = cx.span().span_context().clone();
        if !span_context.is_valid() {
            return;
        }

        let trace_id = span_context.trace_id().to_string();
        let (epoch, unique) = trace_id.split_at(8);
        let sampled = if span_context.trace_flags().is_sampled() {
            "1"
        } else {
            "0"
        };
        injector.set(
            XRAY_HEADER,
            format!(
                "Root={}-{}-{};Parent={};Sampled={}",
                XRAY_VERSION,
                epoch,
                unique,
                span_context.span_id(),
                sampled
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
        FieldIter::new(XRAY_FIELDS.as_ref())
    }
}
