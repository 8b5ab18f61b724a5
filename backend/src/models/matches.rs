use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::profile::ProfileSummary;

/// Lifecycle state of a proposed pairing. A pending row is mutated exactly
/// once, by the target's response or by the expiry sweep, and never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Blocked,
}

/// Status recorded in the append-only history log. Unmatching writes new
/// rows with the two unmatched statuses instead of touching older entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum HistoryStatus {
    Pending,
    Accepted,
    Declined,
    UnmatchedByUser,
    UnmatchedByOther,
    Expired,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PendingMatch {
    pub id: i64,
    pub requester_id: i64,
    pub target_id: i64,
    pub score: i64,
    pub notification_ref: Option<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub other_user_id: i64,
    pub score: i64,
    pub status: HistoryStatus,
    pub created_at: DateTime<Utc>,
}

/// One currently accepted pairing, seen from one side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveMatch {
    pub other_user_id: i64,
    pub match_id: i64,
}

/// The target's answer to a match proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResponse {
    Accept,
    Decline,
    Block,
}

/// Data contract handed to the notification layer when a match is proposed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProposal {
    pub match_id: i64,
    pub requester_summary: ProfileSummary,
    pub target_summary: ProfileSummary,
    pub score: i64,
    pub percentage: f64,
    pub expires_at: DateTime<Utc>,
}

/// Result of a target's response, for notifying both parties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: i64,
    pub status: MatchStatus,
    pub requester_id: i64,
    pub target_id: i64,
}
