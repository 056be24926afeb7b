//! Pipeline constants
//!
//! Centralized location for the limits, header names and endpoint paths the
//! dispatch pipeline relies on.

// Retry limits
pub const MAX_AUTH_RETRIES: u32 = 4;
pub const MAX_RATE_LIMIT_RETRIES: u32 = 10;
pub const DEFAULT_MAX_RATE_LIMIT_DELAY_SECS: u64 = 300;

// Transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("gamelink/", env!("CARGO_PKG_VERSION"));
pub const TRANSPORT_FAULT_STATUS: u16 = 0;
pub const UNAUTHORIZED_STATUS: u16 = 401;

// Credential headers (distinct so both domains can share one transport)
pub const PLAYER_AUTH_HEADER: &str = "x-session-token";
pub const ADMIN_AUTH_HEADER: &str = "x-auth-token";

// Authentication endpoints
pub const PLAYER_SESSION_PATH: &str = "/v2/session";
pub const ADMIN_LOGIN_PATH: &str = "/v1/login";
pub const ADMIN_TWO_FACTOR_PATH: &str = "/v1/2fa";

// Multipart field carrying the uploaded file
pub const UPLOAD_FILE_FIELD: &str = "file";

// Terminal envelope messages
pub const CREDENTIAL_EXPIRED_MESSAGE: &str = "credential expired";
pub const RETRY_BUDGET_EXCEEDED_MESSAGE: &str = "exceeded retry budget";
pub const DISPATCH_ABORTED_MESSAGE: &str = "dispatch task aborted";
