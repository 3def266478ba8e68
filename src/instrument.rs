use opentelemetry::{KeyValue, Value as OtelValue};
use serde_json::Value;

use crate::options::TelemetryOptions;

/// Auto-instrumentation plugins the runtime may hook in. Selection order is
/// fixed; the list is a contract for reproducible span attribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instrumentation {
    Http,
    WebFramework,
    RpcFramework,
    Database,
}

impl Instrumentation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::WebFramework => "web-framework",
            Self::RpcFramework => "rpc-framework",
            Self::Database => "database",
        }
    }
}

/// HTTP is always instrumented; the rest are opt-in, appended in a fixed
/// order regardless of how the flags were declared.
pub fn select(options: &TelemetryOptions) -> Vec<Instrumentation> {
    let mut selected = vec![Instrumentation::Http];
    if options.use_web_framework {
        selected.push(Instrumentation::WebFramework);
    }
    if options.use_rpc_framework {
        selected.push(Instrumentation::RpcFramework);
    }
    if options.use_database {
        selected.push(Instrumentation::Database);
    }
    selected
}

/// Response-enrichment policy for the database instrumentation hook.
///
/// Connection and timing metadata are safe to attach; the operation's result
/// payload may carry application data and is never turned into attributes.
/// Missing or oddly-shaped fields are omitted, never an error: enrichment
/// must not abort the instrumented call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnrichmentPolicy {
    pub debug: bool,
}

impl EnrichmentPolicy {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn response_attributes(&self, response: &Value) -> Vec<KeyValue> {
        let mut attrs = Vec::new();

        if let Some(connection) = response.get("connection").and_then(Value::as_object) {
            for (key, value) in connection {
                if let Some(value) = scalar(value) {
                    attrs.push(KeyValue::new(format!("db.connection.{key}"), value));
                }
            }
        }

        if let Some(time) = response
            .pointer("/result/operationTime")
            .and_then(operation_time)
        {
            attrs.push(KeyValue::new("db.operation_time", time));
        }

        if self.debug {
            attrs.push(KeyValue::new("config.debug", true));
        }

        attrs
    }
}

fn scalar(value: &Value) -> Option<OtelValue> {
    match value {
        Value::String(s) => Some(OtelValue::from(s.clone())),
        Value::Bool(b) => Some(OtelValue::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(OtelValue::from(i))
            } else {
                n.as_f64().map(OtelValue::from)
            }
        }
        // Nested structures are metadata we do not flatten further.
        _ => None,
    }
}

fn operation_time(value: &Value) -> Option<OtelValue> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(OtelValue::from(i))
            } else {
                n.as_f64().map(OtelValue::from)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_always_selected() {
        let selected = select(&TelemetryOptions::new("svc"));
        assert_eq!(selected, vec![Instrumentation::Http]);
    }

    #[test]
    fn test_selection_order_is_fixed() {
        // Flags declared "out of order"; selection order must not follow them.
        let options = TelemetryOptions::new("svc")
            .with_database(true)
            .with_web_framework(true);

        let selected = select(&options);

        assert_eq!(
            selected,
            vec![
                Instrumentation::Http,
                Instrumentation::WebFramework,
                Instrumentation::Database,
            ]
        );
    }

    #[test]
    fn test_all_flags_selected_in_order() {
        let options = TelemetryOptions::new("svc")
            .with_rpc_framework(true)
            .with_database(true)
            .with_web_framework(true);

        let names: Vec<&str> = select(&options).iter().map(|i| i.as_str()).collect();

        assert_eq!(names, vec!["http", "web-framework", "rpc-framework", "database"]);
    }

    #[test]
    fn test_enrichment_keeps_metadata_drops_payload() {
        let policy = EnrichmentPolicy::new(false);
        let response = json!({
            "connection": { "host": "db1" },
            "result": { "operationTime": 5, "secret": "x" }
        });

        let attrs = policy.response_attributes(&response);

        assert!(
            attrs
                .iter()
                .any(|kv| kv.key.as_str() == "db.connection.host" && kv.value.as_str() == "db1")
        );
        assert!(
            attrs
                .iter()
                .any(|kv| kv.key.as_str() == "db.operation_time")
        );
        for kv in &attrs {
            assert!(!kv.key.as_str().contains("secret"));
            assert_ne!(kv.value.as_str(), "x");
        }
    }

    #[test]
    fn test_enrichment_flattens_connection_scalars() {
        let policy = EnrichmentPolicy::new(false);
        let response = json!({
            "connection": { "host": "db1", "port": 5432, "tls": true, "pool": {"size": 8} }
        });

        let attrs = policy.response_attributes(&response);

        assert!(attrs.iter().any(|kv| kv.key.as_str() == "db.connection.port"));
        assert!(attrs.iter().any(|kv| kv.key.as_str() == "db.connection.tls"));
        // Nested objects are not flattened.
        assert!(!attrs.iter().any(|kv| kv.key.as_str().contains("pool")));
    }

    #[test]
    fn test_enrichment_missing_fields_are_omitted() {
        let policy = EnrichmentPolicy::new(false);

        assert!(policy.response_attributes(&json!({})).is_empty());
        assert!(
            policy
                .response_attributes(&json!({ "result": { "rows": [1, 2, 3] } }))
                .is_empty()
        );
    }

    #[test]
    fn test_enrichment_debug_marker() {
        let policy = EnrichmentPolicy::new(true);
        let attrs = policy.response_attributes(&json!({}));

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].key.as_str(), "config.debug");
    }
}
