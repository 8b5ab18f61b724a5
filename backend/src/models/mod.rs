pub mod catalog;
pub mod matches;
pub mod preferences;
pub mod profile;

pub use catalog::{CategoryWeights, MatchConfig, TagCatalog, TagId};
pub use matches::{
    ActiveMatch, HistoryStatus, MatchHistoryEntry, MatchOutcome, MatchProposal, MatchResponse,
    MatchStatus, PendingMatch,
};
pub use preferences::UserPreferences;
pub use profile::{
    AgePreference, DistancePreference, Gender, HeightPreference, MemberRecord, ProfileSummary,
    Region, RelationshipStatus, Sexuality, UserProfile, Visibility,
};
