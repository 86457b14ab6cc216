//! HTTP handlers.

pub mod auth;

pub use auth::{login, register, AppJson};
