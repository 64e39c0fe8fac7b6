//! Room and session service around `mineroom-core`: persistence, per-id locking, identity and configuration.

pub use config::*;
pub use error::*;
pub use hub::*;
pub use identity::*;
pub use locks::*;
pub use rooms::*;
pub use sessions::*;
pub use store::*;

pub mod clock;
mod config;
mod error;
mod hub;
pub mod ids;
mod identity;
mod locks;
mod rooms;
mod sessions;
pub mod store;
