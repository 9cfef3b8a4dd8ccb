//! Shared foundation for the PlayTube backend.
//!
//! This crate provides the pieces every other crate leans on:
//!
//! - **Config**: layered file + environment configuration
//! - **Errors**: the application error taxonomy and HTTP mapping
//! - **IDs**: ULID-based identifier generation
//! - **Crypto**: password hashing and the access/refresh token pair
//! - **Storage**: media upload backends (local filesystem or remote host)

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
