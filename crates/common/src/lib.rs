//! Common types, protocol definitions, and errors shared by the token service crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
