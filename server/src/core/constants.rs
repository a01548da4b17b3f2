// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "Pulseboard";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".pulseboard";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "pulseboard.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "PULSEBOARD_CONFIG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "PULSEBOARD_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "PULSEBOARD_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "PULSEBOARD_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PULSEBOARD_LOG";

/// Environment variable to toggle server-side chart aggregation
pub const ENV_SERVER_SIDE_AGGREGATION: &str = "PULSEBOARD_SERVER_SIDE_AGGREGATION";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5480;

/// Default request body limit (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "PULSEBOARD_DATA_DIR";

/// Environment variable providing the API key hashing secret (hex)
pub const ENV_API_KEY_SECRET: &str = "PULSEBOARD_API_KEY_SECRET";

/// File name of the generated API key secret inside the data directory
pub const API_KEY_SECRET_FILENAME: &str = "api_key.secret";

/// Length in bytes of a generated API key secret
pub const API_KEY_SECRET_LENGTH: usize = 32;

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database file name
pub const SQLITE_DB_FILENAME: &str = "pulseboard.db";

/// Maximum pool connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 8;

/// Busy timeout for locked database
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

/// Pages written before automatic WAL checkpoint
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval between explicit WAL checkpoints
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Organizations
// =============================================================================

/// Organization used when authentication is disabled
pub const DEFAULT_ORG_ID: &str = "default";

// =============================================================================
// API Keys
// =============================================================================

/// Prefix of every issued API key
pub const API_KEY_PREFIX: &str = "pb-";

/// Number of random characters after the prefix
pub const API_KEY_RANDOM_LENGTH: usize = 48;

/// Characters of the key shown in listings
pub const API_KEY_PREFIX_DISPLAY_LEN: usize = 10;

/// Longest lifetime a key can be issued with
pub const API_KEY_MAX_EXPIRY_DAYS: u32 = 3650;

/// Maximum keys per organization
pub const API_KEY_MAX_PER_ORG: usize = 100;

// =============================================================================
// Records
// =============================================================================

/// Hard cap applied by the record store to any single query
pub const RECORD_QUERY_MAX: usize = 10_000;

/// Maximum number of fields accepted in one streamed record
pub const RECORD_MAX_FIELDS: usize = 256;

/// Maximum charts per dashboard
pub const DASHBOARD_MAX_CHARTS: usize = 50;

/// Minimum seconds between `last_used_at` updates of one API key
pub const API_KEY_TOUCH_DEBOUNCE_SECS: i64 = 60;
