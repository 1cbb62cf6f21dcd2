//! Core identifier and calendar types.

use std::borrow::Borrow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Dates on the simulation calendar (serialized as `YYYY-MM-DD`).
pub type GameDate = NaiveDate;

/// A three-letter nation tag (`ITA`, `GER`, `ENG`, ...).
///
/// Codes are normalized to uppercase ASCII on construction so lookups into
/// the registry and the per-save nation map never miss on case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NationCode(String);

impl NationCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl Borrow<str> for NationCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How far a single turn advances the simulation clock.
///
/// Parsed from the named tokens the client sends (`1_week`, `1_month`,
/// `3_months`, `6_months`, `1_year`). Anything else is read as a bare day
/// count if numeric, and falls back to a single day otherwise; a turn
/// request never fails on an unrecognized token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeJump {
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    Days(i64),
}

impl TimeJump {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "1_week" => TimeJump::Week,
            "1_month" => TimeJump::Month,
            "3_months" => TimeJump::ThreeMonths,
            "6_months" => TimeJump::SixMonths,
            "1_year" => TimeJump::Year,
            other => match other.parse::<i64>() {
                Ok(days) => TimeJump::Days(days),
                Err(_) => TimeJump::Days(1),
            },
        }
    }

    /// The canonical request token for this jump.
    pub fn token(&self) -> String {
        match self {
            TimeJump::Week => "1_week".to_string(),
            TimeJump::Month => "1_month".to_string(),
            TimeJump::ThreeMonths => "3_months".to_string(),
            TimeJump::SixMonths => "6_months".to_string(),
            TimeJump::Year => "1_year".to_string(),
            TimeJump::Days(n) => n.to_string(),
        }
    }
}

impl fmt::Display for TimeJump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl Serialize for TimeJump {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for TimeJump {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(TimeJump::parse(&token))
    }
}
