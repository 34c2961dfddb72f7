//! # API Shared
//!
//! Pieces shared by API surfaces and binaries:
//! - the response envelope every endpoint returns
//! - the health check
//! - JWT minting/verification for access and password-reset tokens
//!
//! This crate knows nothing about the domain; `api-rest` wires it to the
//! core services.

pub mod envelope;
pub mod health;
pub mod token;

pub use envelope::Envelope;
pub use health::{HealthRes, HealthService};
pub use token::{Claims, TokenError, TokenService, RESET_TOKEN_HEADER};
