use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use opentelemetry_semantic_conventions::resource;

use crate::options::TelemetryOptions;

const UNKNOWN: &str = "unknown";

/// Attribute key a downstream vendor's service map reads instead of the
/// semantic-convention environment key. Always mirrors the environment name.
const APPLICATION_KEY: &str = "application";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub service_name: String,
    pub environment_name: String,
    pub service_version: String,
    pub application_label: String,
}

/// Derive the resource identity from options. Pure and total: missing
/// optionals default to `"unknown"`. An empty service name is rejected by
/// the assembler, not here.
pub fn resolve(options: &TelemetryOptions) -> ResourceIdentity {
    let environment_name = options
        .environment
        .clone()
        .unwrap_or_else(|| UNKNOWN.to_string());

    ResourceIdentity {
        service_name: options.service.clone(),
        application_label: environment_name.clone(),
        environment_name,
        service_version: options
            .version
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

impl ResourceIdentity {
    pub fn to_resource(&self) -> Resource {
        Resource::new(vec![
            KeyValue::new(resource::SERVICE_NAME, self.service_name.clone()),
            KeyValue::new(resource::SERVICE_VERSION, self.service_version.clone()),
            KeyValue::new(
                resource::DEPLOYMENT_ENVIRONMENT_NAME,
                self.environment_name.clone(),
            ),
            KeyValue::new(APPLICATION_KEY, self.application_label.clone()),
        ])
    }
}
