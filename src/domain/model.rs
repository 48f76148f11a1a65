use crate::utils::error::{LookupError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Numeric service number identifying a soldier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SoldierId(pub u64);

impl<'de> Deserialize<'de> for SoldierId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::from(StringOrNumber::deserialize(deserializer)?);
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl SoldierId {
    /// Pulls the numeric `id` out of a raw store document. Stores are not
    /// consistent about typing, so both `42` and `"42"` are accepted.
    pub fn from_document(document: &serde_json::Value) -> Result<Self> {
        match document.get("id") {
            Some(serde_json::Value::Number(n)) => {
                n.as_u64().map(SoldierId).ok_or_else(LookupError::invalid_identifier)
            }
            Some(serde_json::Value::String(s)) => s.parse(),
            _ => Err(LookupError::invalid_identifier()),
        }
    }
}

impl FromStr for SoldierId {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // u64::from_str tolerates a leading '+', a service number does not
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LookupError::invalid_identifier());
        }
        trimmed
            .parse::<u64>()
            .map(SoldierId)
            .map_err(|_| LookupError::invalid_identifier())
    }
}

impl fmt::Display for SoldierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soldier {
    pub id: SoldierId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub birth_postal_code: Option<String>,
    /// Any document fields not modelled above.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Soldier {
    /// Postal code exactly as stored, blank values treated as absent.
    pub fn postal_code(&self) -> Option<&str> {
        self.birth_postal_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub soldier_id: SoldierId,
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub soldier_id: SoldierId,
    pub location: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedLocation {
    pub soldier_id: SoldierId,
    pub place: String,
    #[serde(default)]
    pub visited_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "required_string_or_number")]
    pub postal_code: String,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Aggregate shown on the lookup screen for one query.
///
/// A bundle is always built whole and swapped in; failed queries publish
/// `ResultBundle::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub soldier: Option<Soldier>,
    pub status: Option<Status>,
    pub postings: Vec<Posting>,
    pub visits: Vec<VisitedLocation>,
    pub birth_location: Option<Location>,
}

impl ResultBundle {
    pub fn is_empty(&self) -> bool {
        self.soldier.is_none()
            && self.status.is_none()
            && self.postings.is_empty()
            && self.visits.is_empty()
            && self.birth_location.is_none()
    }
}

/// Where a query currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    #[default]
    Idle,
    Validating,
    Fetching,
    Assembling,
    Ready,
    Error,
}

impl QueryPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, QueryPhase::Ready | QueryPhase::Error)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

// 郵遞區號有時存成數字
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(String::from))
}

fn required_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}
