// Host side of the integration: holds the agents for the configured
// sidecars, registers the services that use them and publishes response
// events, all reachable over the daemon's HTTP API.

pub mod config;
pub mod events;
pub mod http_server;
pub mod integration;
pub mod services;
