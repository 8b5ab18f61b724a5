pub mod matchmaking;

pub use matchmaking::{
    find_match, match_status, record_notification, respond, set_preferences, unmatch,
};
