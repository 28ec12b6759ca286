//! Coarse condition buckets used for styling.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    Sunny,
    #[default]
    Cloudy,
    Rainy,
    Snowy,
}

const SUNNY_CODES: &[i32] = &[1000];

const CLOUDY_CODES: &[i32] = &[1003, 1006, 1009];

const RAINY_CODES: &[i32] = &[
    1063, 1150, 1153, 1168, 1171, 1180, 1183, 1186, 1189, 1192, 1195, 1198, 1201, 1240, 1243,
    1246, 1273, 1276, 1279, 1282,
];

const SNOWY_CODES: &[i32] = &[
    1066, 1069, 1072, 1114, 1117, 1210, 1213, 1216, 1219, 1222, 1225, 1237, 1249, 1252, 1255,
    1258, 1261, 1264,
];

/// Lookup order matters only if a code were listed twice; the lists are disjoint.
const CONDITION_TABLE: &[(ConditionType, &[i32])] = &[
    (ConditionType::Sunny, SUNNY_CODES),
    (ConditionType::Cloudy, CLOUDY_CODES),
    (ConditionType::Rainy, RAINY_CODES),
    (ConditionType::Snowy, SNOWY_CODES),
];

/// Map a WeatherAPI condition code to its bucket.
///
/// Total over every integer: unknown codes (fog, mist, thunder without
/// precipitation, garbage) land in [`ConditionType::Cloudy`].
pub fn classify_condition(code: i32) -> ConditionType {
    CONDITION_TABLE
        .iter()
        .find(|(_, codes)| codes.contains(&code))
        .map(|(kind, _)| *kind)
        .unwrap_or_default()
}

impl ConditionType {
    pub fn from_code(code: i32) -> Self {
        classify_condition(code)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Cloudy => "Cloudy",
            Self::Rainy => "Rainy",
            Self::Snowy => "Snowy",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Cloudy => "cloud",
            Self::Rainy => "cloud_rain",
            Self::Snowy => "cloud_snow",
        }
    }
}
