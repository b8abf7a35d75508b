//! API client surface
//!
//! - [`ApiClient`]: typed get/post/put/patch/delete over the request pipeline
//! - [`AuthService`]: login, logout and CSRF bootstrap
//! - [`HttpTokenRefresher`]: the refresh-endpoint call used by the refresh
//!   coordinator

pub mod auth;
pub mod client;
pub mod refresh;

pub use auth::{AuthError, AuthService, Credentials};
pub use client::{ApiClient, ApiClientBuilder};
pub use refresh::HttpTokenRefresher;
