//! Standard and application JSON-RPC 2.0 error codes.

/// Invalid JSON was received by the agent.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// Application error codes (ftpgate-specific).

/// A `files.*` method was called before a successful `auth.login`.
pub const NOT_LOGGED_IN: i64 = -32001;

/// `auth.login` params left out a field and the agent config has no
/// default for it.
pub const INCOMPLETE_CREDENTIALS: i64 = -32002;
