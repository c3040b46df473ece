//! Domain layer
//!
//! Contains the client's value types and the ports it needs from the backend.
//! - `entities`: typed posts, profiles, feed views, like/notification inserts
//! - `ports`: Trait definitions for the hosted backend

pub mod entities;
pub mod ports;
