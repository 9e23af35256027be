pub mod set_cors_headers;
pub mod set_security_headers;
pub mod rate_limit;
