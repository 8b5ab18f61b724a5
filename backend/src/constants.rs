// =============================================================================
// Kindred Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// MATCH REQUEST FLOW
// =============================================================================

/// Minimum seconds between two find requests from the same user
pub const MATCH_COMMAND_COOLDOWN_SECS: i64 = 300;

/// Minimum compatibility score required before a candidate can be proposed
pub const MIN_MATCH_THRESHOLD: i64 = 25;

/// How long a proposed match waits for the target's response before expiring
pub const MATCH_ACCEPTANCE_TIMEOUT_HOURS: i64 = 24;

// =============================================================================
// EXPIRY SWEEP
// =============================================================================

/// How often the sweeper transitions overdue pending matches to expired
pub const MATCH_CLEANUP_INTERVAL_MINUTES: u64 = 30;

// =============================================================================
// EXCLUSION WINDOW
// =============================================================================

/// Days a declined or unmatched pairing stays hidden from both sides
pub const DECLINED_MATCHES_EXCLUSION_DAYS: i64 = 7;

// =============================================================================
// TIER LIMITS
// =============================================================================

/// Concurrent accepted matches for users with no tier tag
pub const DEFAULT_MATCH_LIMIT: u32 = 5;

/// Concurrent accepted matches for users holding a booster tag
pub const BOOSTER_MATCH_LIMIT: u32 = 10;

/// Concurrent accepted matches for users holding a premium tag (0 = unlimited)
pub const PREMIUM_MATCH_LIMIT: u32 = 0;

// =============================================================================
// SCORING
// =============================================================================

/// Maximum number of overlapping personality traits that earn points
pub const MAX_TRAIT_MATCHES: usize = 3;

/// Maximum number of overlapping hobbies that earn points
pub const MAX_HOBBY_MATCHES: usize = 3;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Database used when DATABASE_URL is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://kindred.db?mode=rwc";
