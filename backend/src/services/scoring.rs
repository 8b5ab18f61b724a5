use crate::constants::{MAX_HOBBY_MATCHES, MAX_TRAIT_MATCHES};
use crate::models::catalog::{CategoryWeights, MatchConfig};
use crate::models::profile::{AgePreference, DistancePreference, HeightPreference, UserProfile, Visibility};

/// Candidates rejected outright, independent of how well they score:
/// closed visibility, an unavailable relationship status, or an exclusion tag.
pub fn is_hard_excluded(profile: &UserProfile, config: &MatchConfig) -> bool {
    profile.excluded
        || profile.visibility == Some(Visibility::Closed)
        || profile
            .relationship_status
            .is_some_and(|status| config.unavailable_statuses.contains(&status))
}

/// Does `other` satisfy the age direction `of` asked for? A missing age on
/// either side fails a directional check; "no preference" (stated or
/// absent) is satisfied without the numbers.
fn age_direction_ok(of: &UserProfile, other: &UserProfile) -> bool {
    let Some(pref) = of.age_preference else {
        return true;
    };
    if pref == AgePreference::NoPreference {
        return true;
    }
    let (Some(own), Some(theirs)) = (of.age, other.age) else {
        return false;
    };
    match pref {
        AgePreference::Older => theirs > own,
        AgePreference::Younger => theirs < own,
        AgePreference::SameAge => theirs == own,
        AgePreference::NoPreference => true,
    }
}

fn height_direction_ok(of: &UserProfile, other: &UserProfile) -> bool {
    let Some(pref) = of.height_preference else {
        return true;
    };
    if pref == HeightPreference::NoPreference {
        return true;
    }
    let (Some(own), Some(theirs)) = (of.height, other.height) else {
        return false;
    };
    match pref {
        HeightPreference::Taller => theirs > own,
        HeightPreference::Shorter => theirs < own,
        HeightPreference::NoPreference => true,
    }
}

fn distance_ok(requester: &UserProfile, candidate: &UserProfile) -> bool {
    match requester.distance_preference {
        Some(DistancePreference::Local) => {
            requester.region.is_some() && requester.region == candidate.region
        }
        Some(DistancePreference::LongDistance) => {
            candidate.distance_preference == Some(DistancePreference::LongDistance)
        }
        None => false,
    }
}

/// Weighted compatibility of `candidate` for `requester`. Directional, so
/// score(a, b) and score(b, a) differ in general. Integer arithmetic only;
/// the percentage shown to users is computed separately.
pub fn score(requester: &UserProfile, candidate: &UserProfile, config: &MatchConfig) -> i64 {
    if is_hard_excluded(candidate, config) {
        return 0;
    }

    let w = &config.weights;
    let mut total = 0i64;

    if matches!(candidate.visibility, Some(Visibility::Open) | Some(Visibility::Ask)) {
        total += w.dms;
    }

    if !candidate
        .relationship_status
        .is_some_and(|status| config.unavailable_statuses.contains(&status))
    {
        total += w.relationship;
    }

    // both directions must hold: the candidate's own stated direction may
    // not contradict the requester's
    if age_direction_ok(requester, candidate) && age_direction_ok(candidate, requester) {
        total += w.age;
    }

    if height_direction_ok(requester, candidate) && height_direction_ok(candidate, requester) {
        total += w.height;
    }

    if distance_ok(requester, candidate) {
        total += w.distance;
    }

    let trait_overlap = requester
        .personality_preference
        .intersection(&candidate.personality)
        .count()
        .min(MAX_TRAIT_MATCHES);
    total += trait_overlap as i64 * w.personality;

    let hobby_overlap = requester
        .hobby_preference
        .intersection(&candidate.hobbies)
        .count()
        .min(MAX_HOBBY_MATCHES);
    total += hobby_overlap as i64 * w.hobbies;

    total
}

pub fn max_possible_score(weights: &CategoryWeights) -> i64 {
    weights.dms
        + weights.relationship
        + weights.age
        + weights.height
        + weights.distance
        + MAX_TRAIT_MATCHES as i64 * weights.personality
        + MAX_HOBBY_MATCHES as i64 * weights.hobbies
}

/// Display percentage, rounded to two decimals
pub fn score_percentage(score: i64, weights: &CategoryWeights) -> f64 {
    let max = max_possible_score(weights);
    if max <= 0 {
        return 0.0;
    }
    (score as f64 / max as f64 * 100.0 * 100.0).round() / 100.0
}
