//! Clients for the remote voice API.
//!
//! [`UpstreamClient`] opens one authenticated WebSocket per call to
//! [`UpstreamClient::connect`] and adapts it into a relay
//! [`Connection`](voice_relay_core::Connection). [`SpeechClient`] covers the
//! one-shot text-to-speech REST endpoint.

mod client;
mod speech;

pub use client::{DEFAULT_CONNECT_TIMEOUT, UpstreamClient};
pub use speech::{DEFAULT_SPEECH_URL, SpeechClient};
