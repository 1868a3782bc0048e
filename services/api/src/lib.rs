//! Voice Relay API Library Crate
//!
//! This library contains the web service around the relay core: configuration,
//! application state, HTTP handlers, the streaming WebSocket proxies and
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
