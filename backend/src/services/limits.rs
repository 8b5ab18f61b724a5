use crate::constants::{BOOSTER_MATCH_LIMIT, DEFAULT_MATCH_LIMIT, PREMIUM_MATCH_LIMIT};
use crate::models::catalog::{TagCatalog, TagId};

/// Maximum concurrent accepted matches for a user, from their tier tags.
/// 0 means unlimited. The highest applicable tier wins.
pub fn match_limit(tags: &[TagId], catalog: &TagCatalog) -> u32 {
    if tags.iter().any(|tag| catalog.premium_tags.contains(tag)) {
        PREMIUM_MATCH_LIMIT
    } else if tags.iter().any(|tag| catalog.booster_tags.contains(tag)) {
        BOOSTER_MATCH_LIMIT
    } else {
        DEFAULT_MATCH_LIMIT
    }
}

pub fn is_at_limit(active: u32, limit: u32) -> bool {
    limit != 0 && active >= limit
}

/// Current-usage text shown when reporting status or refusing a find
pub fn usage_summary(active: u32, limit: u32) -> String {
    if limit == 0 {
        format!("{} active matches (unlimited)", active)
    } else {
        format!("{} of {} match slots used", active, limit)
    }
}
