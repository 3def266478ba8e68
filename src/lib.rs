pub mod assemble;
pub mod diagnostics;
pub mod error;
pub mod instrument;
pub mod options;
pub mod pipeline;
pub mod propagation;
pub mod resource;
pub mod runtime;

pub use assemble::{TelemetryConfiguration, assemble, assemble_with};
pub use diagnostics::{Diagnostics, NoopDiagnostics, StderrDiagnostics};
pub use error::AssemblyError;
pub use instrument::{EnrichmentPolicy, Instrumentation};
pub use options::TelemetryOptions;
pub use pipeline::{MetricPipeline, TracePipeline};
pub use propagation::{PropagationFormat, PropagatorStack};
pub use resource::ResourceIdentity;
pub use runtime::Runtime;
