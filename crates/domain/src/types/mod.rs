//! Core domain types
//!
//! - [`token`]: credentials owned by the credential store
//! - [`request`]: one logical API call and its replay state

pub mod request;
pub mod token;

pub use request::{HttpMethod, RequestContext};
pub use token::TokenPair;
