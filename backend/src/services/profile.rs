use crate::models::catalog::{TagCatalog, TagId};
use crate::models::profile::UserProfile;

/// Builds a profile from one ordered tag snapshot. Pure: the same snapshot
/// always yields the same profile. Unmapped tags are skipped; for
/// single-valued categories the first matching tag in snapshot order wins.
pub fn extract(user_id: i64, tags: &[TagId], catalog: &TagCatalog) -> UserProfile {
    let mut profile = UserProfile::new(user_id);

    for tag in tags {
        if catalog.exclusion_tags.contains(tag) {
            profile.excluded = true;
            continue;
        }

        if profile.gender.is_none() {
            if let Some(gender) = catalog.gender.get(tag) {
                profile.gender = Some(*gender);
                continue;
            }
        }
        if profile.sexuality.is_none() {
            if let Some(sexuality) = catalog.sexuality.get(tag) {
                profile.sexuality = Some(*sexuality);
                continue;
            }
        }
        if profile.age.is_none() {
            if let Some(age) = catalog.age.get(tag) {
                profile.age = Some(*age);
                continue;
            }
        }
        if profile.height.is_none() {
            if let Some(height) = catalog.height.get(tag) {
                profile.height = Some(*height);
                continue;
            }
        }
        if profile.region.is_none() {
            if let Some(region) = catalog.region.get(tag) {
                profile.region = Some(*region);
                continue;
            }
        }
        if profile.relationship_status.is_none() {
            if let Some(status) = catalog.relationship.get(tag) {
                profile.relationship_status = Some(*status);
                continue;
            }
        }
        if profile.visibility.is_none() {
            if let Some(visibility) = catalog.visibility.get(tag) {
                profile.visibility = Some(*visibility);
                continue;
            }
        }
        if profile.age_preference.is_none() {
            if let Some(pref) = catalog.age_preference.get(tag) {
                profile.age_preference = Some(*pref);
                continue;
            }
        }
        if profile.height_preference.is_none() {
            if let Some(pref) = catalog.height_preference.get(tag) {
                profile.height_preference = Some(*pref);
                continue;
            }
        }
        if profile.distance_preference.is_none() {
            if let Some(pref) = catalog.distance_preference.get(tag) {
                profile.distance_preference = Some(*pref);
                continue;
            }
        }

        if let Some(trait_name) = catalog.personality.get(tag) {
            profile.personality.insert(trait_name.clone());
        } else if let Some(hobby) = catalog.hobbies.get(tag) {
            profile.hobbies.insert(hobby.clone());
        } else if let Some(trait_name) = catalog.personality_preference.get(tag) {
            profile.personality_preference.insert(trait_name.clone());
        } else if let Some(hobby) = catalog.hobby_preference.get(tag) {
            profile.hobby_preference.insert(hobby.clone());
        }
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchConfig;
    use crate::models::profile::{AgePreference, Gender, RelationshipStatus, Visibility};

    #[test]
    fn extraction_is_deterministic() {
        let config = MatchConfig::builtin();
        let tags = vec![102, 122, 133, 143, 151, 161, 171, 201, 203, 221, 231];
        let first = extract(9, &tags, &config.catalog);
        let second = extract(9, &tags, &config.catalog);
        assert_eq!(first, second);
    }

    #[test]
    fn fields_come_from_the_catalog() {
        let config = MatchConfig::builtin();
        let tags = vec![101, 122, 151, 161, 171, 201, 221];
        let profile = extract(3, &tags, &config.catalog);

        assert_eq!(profile.gender, Some(Gender::Woman));
        assert_eq!(profile.age, Some(22));
        assert_eq!(profile.relationship_status, Some(RelationshipStatus::Single));
        assert_eq!(profile.visibility, Some(Visibility::Open));
        assert_eq!(profile.age_preference, Some(AgePreference::Older));
        assert!(profile.personality.contains("introvert"));
        assert!(profile.hobbies.contains("gaming"));
        assert!(!profile.excluded);
    }

    #[test]
    fn first_matching_tag_wins_for_single_valued_categories() {
        let config = MatchConfig::builtin();
        // user somehow holds two age tags; the earlier one in the snapshot wins
        let profile = extract(3, &[123, 121], &config.catalog);
        assert_eq!(profile.age, Some(27));

        let reversed = extract(3, &[121, 123], &config.catalog);
        assert_eq!(reversed.age, Some(18));
    }

    #[test]
    fn multi_valued_categories_accumulate() {
        let config = MatchConfig::builtin();
        let profile = extract(3, &[201, 202, 203, 221, 222], &config.catalog);
        assert_eq!(profile.personality.len(), 3);
        assert_eq!(profile.hobbies.len(), 2);
    }

    #[test]
    fn unmapped_tags_are_ignored() {
        let config = MatchConfig::builtin();
        let profile = extract(3, &[999_999, 102], &config.catalog);
        assert_eq!(profile.gender, Some(Gender::Man));
        assert_eq!(profile.age, None);
    }

    #[test]
    fn exclusion_tag_marks_profile_unmatchable() {
        let config = MatchConfig::builtin();
        let profile = extract(3, &[102, 301], &config.catalog);
        assert!(profile.excluded);
    }
}
