//! Domain constants
//!
//! Centralized location for error codes and header names used across the
//! request pipeline.

// Error codes attached to locally produced structured errors
pub const NETWORK_ERROR_CODE: &str = "network_error";
pub const TIMEOUT_ERROR_CODE: &str = "timeout";
pub const MALFORMED_RESPONSE_CODE: &str = "malformed_response";
pub const SESSION_EXPIRED_CODE: &str = "session_expired";
pub const INVALID_REQUEST_CODE: &str = "invalid_request";

// Fallback text when a failed response carries nothing usable
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: unable to reach the server";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "The server returned a response that could not be read";

// Header names (lower-case, HTTP header names are case-insensitive)
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
