//! Platform constants
//!
//! Centralized location for the platform's wire conventions and the default
//! values used when configuration leaves a field unset.

// Query parameter keys understood by the REST API
pub const QUERY_WHERE: &str = "q.where";
pub const QUERY_SELECT: &str = "q.select";
pub const QUERY_ORDER_BY: &str = "q.orderby";
pub const QUERY_LIMIT: &str = "q.limit";
pub const QUERY_SKIP: &str = "q.skip";
pub const QUERY_GROUP_BY: &str = "q.groupBy";
pub const QUERY_DISTINCT: &str = "q.distinct";

// Response envelope fields
pub const ENVELOPE_RESULT_FIELD: &str = "Result";
pub const ENVELOPE_NEXT_PAGE_FIELD: &str = "@nextpage";

// Pagination defaults
pub const DEFAULT_PAGE_LIMIT: u32 = 1000;
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_TOTAL_TIMEOUT_MS: u64 = 25_000;

// Token defaults
pub const DEFAULT_TOKEN_BUFFER_SECS: u64 = 60;
pub const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 10_000;
/// Lifetime assumed when the token endpoint omits `expires_in`
pub const FALLBACK_TOKEN_TTL_SECS: u64 = 300;
/// Longer `expires_in` values are cut to this lifetime
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

// Endpoint layout relative to the account domain
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth/token";
pub const REST_API_PATH: &str = "/rest/v2";
