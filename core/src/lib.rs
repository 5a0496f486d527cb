pub mod config;
pub mod registry;
pub mod runtime;

pub use config::{BridgeConfig, FailurePolicy};
pub use registry::{BridgeRecord, Registry};
pub use runtime::{Invocation, Runtime, ToolOutput};
