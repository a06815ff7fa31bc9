// This crate centralizes the messages exchanged between the bridge daemon and its clients.

pub mod events; // Events published on the bus and streamed over SSE
pub mod service_messages; // Service call payloads and responses
