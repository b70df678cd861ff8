//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 120;
pub const TOKEN_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub const DEFAULT_SLUG: &str = "hotglue";
pub const NATIONBUILDER_DOMAIN: &str = "nationbuilder.com";

// Rotated config keys
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const EXPIRES_IN_KEY: &str = "expires_in";
