//! Credential handling, bearer token state, and the refresh manager.

pub mod manager;
pub mod secret;
pub mod token;

pub use manager::*;
pub use secret::*;
pub use token::*;
