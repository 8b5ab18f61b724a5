use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user matchmaking preferences, upserted lazily on first access.
/// `blocked_users` is permanent; there is no unblock expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: i64,
    pub opt_out: bool,
    pub blocked_users: Vec<i64>,
    pub last_match_time: Option<DateTime<Utc>>,
    pub preferences_json: Option<String>,
}

impl UserPreferences {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            opt_out: false,
            blocked_users: Vec::new(),
            last_match_time: None,
            preferences_json: None,
        }
    }

    pub fn has_blocked(&self, other: i64) -> bool {
        self.blocked_users.contains(&other)
    }
}
