//! Realtime adapter
//!
//! Change-stream subscriptions over the backend's Phoenix-channel websocket.

pub mod client;
pub mod protocol;

pub use client::RealtimeClient;
