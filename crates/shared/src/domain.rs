use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize};

/// Severity label that unlocks the evacuation and dispatch sections.
pub const HIGH_SEVERITY: &str = "High";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    City,
    Profession,
    Concern,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::City, Field::Profession, Field::Concern];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::City => "city",
            Field::Profession => "profession",
            Field::Concern => "concern",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text of the three form inputs, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub city: String,
    pub profession: String,
    pub concern: String,
}

impl FormFields {
    pub fn new(
        city: impl Into<String>,
        profession: impl Into<String>,
        concern: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            profession: profession.into(),
            concern: concern.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::City => &self.city,
            Field::Profession => &self.profession,
            Field::Concern => &self.concern,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::City => self.city = value,
            Field::Profession => self.profession = value,
            Field::Concern => self.concern = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityBaseline {
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub population: Option<u64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveWeather {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default, alias = "description")]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub aqi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub max_temp: Option<f64>,
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeCity {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    pub plan: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefLogistics {
    #[serde(default, deserialize_with = "lenient_count")]
    pub water_liters: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub tents: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub medical_kits: Option<u64>,
}

/// Whole non-negative numbers arrive as integers or as floats such as
/// `14835000.0`; anything else degrades to `None` instead of failing the
/// whole report.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(whole_number))
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_count(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

fn whole_number(value: &serde_json::Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    })
}

/// Analysis result as returned by `POST /api/analyze-risk`.
///
/// Only `overall_severity` is mandatory; every other section may be missing
/// from a well-formed response and deserializes to its empty form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub overall_severity: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub concern: String,
    #[serde(default)]
    pub city_baseline: Option<CityBaseline>,
    #[serde(default)]
    pub live_weather: Option<LiveWeather>,
    #[serde(default)]
    pub forecast_weather: Vec<ForecastDay>,
    #[serde(default)]
    pub risk_assessments: BTreeMap<String, String>,
    #[serde(default)]
    pub general_recommendations: Vec<String>,
    #[serde(default)]
    pub personalized_recommendations: Vec<String>,
    #[serde(default)]
    pub survival_kit: Option<Vec<String>>,
    #[serde(default)]
    pub safe_cities: Option<Vec<SafeCity>>,
    #[serde(default)]
    pub official_dispatch: Option<String>,
    #[serde(default)]
    pub relief_logistics: Option<ReliefLogistics>,
}

impl RiskReport {
    pub fn is_high_severity(&self) -> bool {
        self.overall_severity == HIGH_SEVERITY
    }
}
