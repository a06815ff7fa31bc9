// Core functionality shared by the bridge daemon and the CLI:
// - Sidecar endpoint paths
// - Request/response data structures for the sidecar HTTP API
// - The sidecar client (agent) and the connection validator
// - Config entries, the entry store and the setup/options flows
// - Shared error types

// Export endpoint module - Sidecar base URL and derived paths
pub mod endpoint;
pub use endpoint::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export client module - Agent talking to the sidecar
pub mod client;
pub use client::*;

// Export validator module - Setup-time connection probe
pub mod validator;
pub use validator::*;

// Export config module - Config entries, timeouts and the entry store
pub mod config;
pub use config::*;

// Export config_flow module - Interactive setup and options flows
pub mod config_flow;
pub use config_flow::{ConfigFlow, FlowResult, OptionsFlow, UserInput};

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
