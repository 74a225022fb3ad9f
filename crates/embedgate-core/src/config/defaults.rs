// Single source of truth for all default values.

// --- Model ---
pub const DEFAULT_OUTPUT_DIMENSIONS: u32 = 1024;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BATCH_TOKEN_LIMIT: u32 = 120_000;

// --- Error handling ---
pub const DEFAULT_MAX_RETRIES: u32 = 50;
pub const DEFAULT_INITIAL_RETRY_WAIT_MS: u64 = 200;
pub const DEFAULT_MAX_RETRY_WAIT_MS: u64 = 10_000;
pub const DEFAULT_JITTER: f64 = 0.1; // 10%
pub const DEFAULT_BACKOFF_FACTOR: u32 = 2;

// --- Dispatch ---
pub const DEFAULT_RPS_PER_PROVIDER: u32 = 30;
pub const DEFAULT_AVG_CHARS_PER_TOKEN: f64 = 3.0;
// Most extreme case: one multi-byte char per token, e.g. "\u{ffff}".
pub const FALLBACK_AVG_CHARS_PER_TOKEN: f64 = 0.33;

// --- Cluster ---
pub const DEFAULT_IS_DEDICATED_CLUSTER: bool = true;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_FILTER_ENV: &str = "EMBEDGATE_LOG";
