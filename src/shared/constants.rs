// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - can list every principal's files
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// API KEYS
// =============================================================================

/// Prefix of every issued API key
pub const API_KEY_PREFIX: &str = "fvk_";

/// Hex characters following the prefix
pub const API_KEY_SECRET_LEN: usize = 64;

/// Leading characters of a key kept in clear for display
pub const API_KEY_DISPLAY_LEN: usize = 12;

// =============================================================================
// FILES
// =============================================================================

/// Content type stored when the upload does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extra request body allowance over the file size limit for multipart framing
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;
