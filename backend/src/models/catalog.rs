use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::constants::MIN_MATCH_THRESHOLD;
use crate::models::profile::{
    AgePreference, DistancePreference, Gender, HeightPreference, Region, RelationshipStatus,
    Sexuality, Visibility,
};

/// Externally managed attribute marker id (a "role" on the source platform)
pub type TagId = i64;

/// Maps every deployment-assigned tag id to the profile field it sets.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagCatalog {
    #[serde(default)]
    pub gender: HashMap<TagId, Gender>,
    #[serde(default)]
    pub sexuality: HashMap<TagId, Sexuality>,
    /// Age tags map to the representative age of their bracket
    #[serde(default)]
    pub age: HashMap<TagId, i32>,
    /// Height tags map to centimeters
    #[serde(default)]
    pub height: HashMap<TagId, i32>,
    #[serde(default)]
    pub region: HashMap<TagId, Region>,
    #[serde(default)]
    pub relationship: HashMap<TagId, RelationshipStatus>,
    #[serde(default)]
    pub visibility: HashMap<TagId, Visibility>,
    #[serde(default)]
    pub age_preference: HashMap<TagId, AgePreference>,
    #[serde(default)]
    pub height_preference: HashMap<TagId, HeightPreference>,
    #[serde(default)]
    pub distance_preference: HashMap<TagId, DistancePreference>,
    #[serde(default)]
    pub personality: HashMap<TagId, String>,
    #[serde(default)]
    pub hobbies: HashMap<TagId, String>,
    #[serde(default)]
    pub personality_preference: HashMap<TagId, String>,
    #[serde(default)]
    pub hobby_preference: HashMap<TagId, String>,
    /// Tags that make their holder categorically unmatchable
    #[serde(default)]
    pub exclusion_tags: HashSet<TagId>,
    #[serde(default)]
    pub booster_tags: HashSet<TagId>,
    #[serde(default)]
    pub premium_tags: HashSet<TagId>,
}

impl TagCatalog {
    /// Keys of every single-valued category, used to reject a tag id that is
    /// mapped in two of them (a user cannot hold one tag meaning two things).
    fn single_valued_keys(&self) -> impl Iterator<Item = TagId> + '_ {
        self.gender
            .keys()
            .chain(self.sexuality.keys())
            .chain(self.age.keys())
            .chain(self.height.keys())
            .chain(self.region.keys())
            .chain(self.relationship.keys())
            .chain(self.visibility.keys())
            .chain(self.age_preference.keys())
            .chain(self.height_preference.keys())
            .chain(self.distance_preference.keys())
            .copied()
    }
}

/// Integer score contribution per category. All scoring is integer math;
/// percentages are computed downstream for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub dms: i64,
    pub relationship: i64,
    pub age: i64,
    pub height: i64,
    pub distance: i64,
    pub personality: i64,
    pub hobbies: i64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            dms: 10,
            relationship: 10,
            age: 15,
            height: 10,
            distance: 10,
            personality: 5,
            hobbies: 5,
        }
    }
}

fn default_unavailable_statuses() -> HashSet<RelationshipStatus> {
    HashSet::from([RelationshipStatus::Taken, RelationshipStatus::NotLooking])
}

fn default_min_score_threshold() -> i64 {
    MIN_MATCH_THRESHOLD
}

/// Full matchmaking configuration: the tag catalog, category weights and
/// the deployment-tuned eligibility knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub catalog: TagCatalog,
    #[serde(default)]
    pub weights: CategoryWeights,
    /// Relationship statuses that make a candidate unavailable outright
    #[serde(default = "default_unavailable_statuses")]
    pub unavailable_statuses: HashSet<RelationshipStatus>,
    #[serde(default = "default_min_score_threshold")]
    pub min_score_threshold: i64,
}

impl MatchConfig {
    /// Loads and validates a catalog file. Any malformed or ambiguous
    /// mapping aborts startup rather than producing silent None fields.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read matching config at {}", path))?;
        let config: MatchConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse matching config at {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.gender.is_empty() {
            bail!("Matching config has no gender tags; cannot honor gender preferences");
        }

        let w = &self.weights;
        for (name, value) in [
            ("dms", w.dms),
            ("relationship", w.relationship),
            ("age", w.age),
            ("height", w.height),
            ("distance", w.distance),
            ("personality", w.personality),
            ("hobbies", w.hobbies),
        ] {
            if value < 0 {
                bail!("Category weight '{}' is negative ({})", name, value);
            }
        }

        if self.min_score_threshold < 0 {
            bail!(
                "min_score_threshold is negative ({})",
                self.min_score_threshold
            );
        }

        let mut seen: HashSet<TagId> = HashSet::new();
        for tag in self.catalog.single_valued_keys() {
            if !seen.insert(tag) {
                bail!(
                    "Tag {} is mapped in more than one single-valued category",
                    tag
                );
            }
        }

        Ok(())
    }

    /// Built-in catalog used by tests and local development
    pub fn builtin() -> Self {
        BUILTIN_CONFIG.clone()
    }
}

static BUILTIN_CONFIG: Lazy<MatchConfig> = Lazy::new(|| {
    let catalog = TagCatalog {
        gender: HashMap::from([
            (101, Gender::Woman),
            (102, Gender::Man),
            (103, Gender::NonBinary),
        ]),
        sexuality: HashMap::from([
            (111, Sexuality::Straight),
            (112, Sexuality::Bisexual),
            (113, Sexuality::Gay),
            (114, Sexuality::Lesbian),
            (115, Sexuality::Pansexual),
            (116, Sexuality::Asexual),
        ]),
        age: HashMap::from([(121, 18), (122, 22), (123, 27), (124, 32), (125, 40)]),
        height: HashMap::from([(131, 155), (132, 165), (133, 175), (134, 185), (135, 195)]),
        region: HashMap::from([
            (141, Region::NorthAmerica),
            (142, Region::SouthAmerica),
            (143, Region::Europe),
            (144, Region::Africa),
            (145, Region::Asia),
            (146, Region::MiddleEast),
            (147, Region::Oceania),
        ]),
        relationship: HashMap::from([
            (151, RelationshipStatus::Single),
            (152, RelationshipStatus::Taken),
            (153, RelationshipStatus::Complicated),
            (154, RelationshipStatus::NotLooking),
        ]),
        visibility: HashMap::from([
            (161, Visibility::Open),
            (162, Visibility::Ask),
            (163, Visibility::Closed),
        ]),
        age_preference: HashMap::from([
            (171, AgePreference::Older),
            (172, AgePreference::Younger),
            (173, AgePreference::SameAge),
            (174, AgePreference::NoPreference),
        ]),
        height_preference: HashMap::from([
            (181, HeightPreference::Taller),
            (182, HeightPreference::Shorter),
            (183, HeightPreference::NoPreference),
        ]),
        distance_preference: HashMap::from([
            (191, DistancePreference::Local),
            (192, DistancePreference::LongDistance),
        ]),
        personality: HashMap::from([
            (201, "introvert".to_string()),
            (202, "extrovert".to_string()),
            (203, "adventurous".to_string()),
            (204, "homebody".to_string()),
            (205, "creative".to_string()),
            (206, "analytical".to_string()),
        ]),
        hobbies: HashMap::from([
            (221, "gaming".to_string()),
            (222, "music".to_string()),
            (223, "fitness".to_string()),
            (224, "cooking".to_string()),
            (225, "travel".to_string()),
            (226, "reading".to_string()),
            (227, "art".to_string()),
        ]),
        personality_preference: HashMap::from([
            (211, "introvert".to_string()),
            (212, "extrovert".to_string()),
            (213, "adventurous".to_string()),
            (214, "homebody".to_string()),
            (215, "creative".to_string()),
            (216, "analytical".to_string()),
        ]),
        hobby_preference: HashMap::from([
            (231, "gaming".to_string()),
            (232, "music".to_string()),
            (233, "fitness".to_string()),
            (234, "cooking".to_string()),
            (235, "travel".to_string()),
            (236, "reading".to_string()),
            (237, "art".to_string()),
        ]),
        exclusion_tags: HashSet::from([301]),
        booster_tags: HashSet::from([311]),
        premium_tags: HashSet::from([312]),
    };

    let config = MatchConfig {
        catalog,
        weights: CategoryWeights::default(),
        unavailable_statuses: default_unavailable_statuses(),
        min_score_threshold: MIN_MATCH_THRESHOLD,
    };
    config
        .validate()
        .expect("built-in matching config must validate");
    config
});
