use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::catalog::TagId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Woman,
    Man,
    NonBinary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sexuality {
    Straight,
    Gay,
    Lesbian,
    Bisexual,
    Pansexual,
    Asexual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    MiddleEast,
    Oceania,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Single,
    Taken,
    Complicated,
    NotLooking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Open,
    Closed,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgePreference {
    Older,
    Younger,
    SameAge,
    NoPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightPreference {
    Taller,
    Shorter,
    NoPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistancePreference {
    Local,
    LongDistance,
}

/// A guild member as supplied by the external membership provider:
/// the platform id plus the ordered tag snapshot taken for this request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub user_id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Structured view of one user's tags, derived fresh from a single tag
/// snapshot per extraction call. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    pub user_id: i64,
    pub gender: Option<Gender>,
    pub sexuality: Option<Sexuality>,
    pub age: Option<i32>,
    pub height: Option<i32>,
    pub region: Option<Region>,
    pub relationship_status: Option<RelationshipStatus>,
    pub visibility: Option<Visibility>,
    pub age_preference: Option<AgePreference>,
    pub height_preference: Option<HeightPreference>,
    pub distance_preference: Option<DistancePreference>,
    pub personality: BTreeSet<String>,
    pub hobbies: BTreeSet<String>,
    pub personality_preference: BTreeSet<String>,
    pub hobby_preference: BTreeSet<String>,
    /// User holds a tag that makes them categorically unmatchable
    pub excluded: bool,
}

impl UserProfile {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            user_id: self.user_id,
            gender: self.gender,
            age: self.age,
            height: self.height,
            region: self.region,
            personality: self.personality.iter().cloned().collect(),
            hobbies: self.hobbies.iter().cloned().collect(),
        }
    }
}

/// Compact profile rendering handed to the notification layer alongside a
/// match proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub user_id: i64,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub height: Option<i32>,
    pub region: Option<Region>,
    pub personality: Vec<String>,
    pub hobbies: Vec<String>,
}
