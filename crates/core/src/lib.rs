//! Core business logic for playtube.

pub mod services;

pub use services::*;
