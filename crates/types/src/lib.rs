//! Validated value types shared across the workspace.
//!
//! These newtypes make "already checked" part of the type: a constructed
//! value is guaranteed to satisfy its format, so services never re-validate
//! strings they receive from other crates.

mod nik;

pub use nik::Nik;

/// Errors produced when constructing validated value types.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
    /// The input did not match the 16-digit NIK format.
    #[error("NIK must be exactly 16 digits")]
    InvalidNik,
}
