use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

/// Stripe environment a plan is synchronized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingMode {
    Test,
    Live,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::Test => "test",
            BillingMode::Live => "live",
        }
    }

    /// Site default: the stored `test_mode` flag picks test, otherwise live.
    pub fn from_test_flag(test_mode: bool) -> Self {
        if test_mode {
            BillingMode::Test
        } else {
            BillingMode::Live
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "test" => Some(BillingMode::Test),
            "live" => Some(BillingMode::Live),
            _ => None,
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Quarterly => "quarterly",
            BillingPeriod::Semiannual => "semiannual",
            BillingPeriod::Annual => "annual",
        }
    }

    /// Unknown or missing values read as monthly.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("annual") => BillingPeriod::Annual,
            Some("semiannual") => BillingPeriod::Semiannual,
            Some("quarterly") => BillingPeriod::Quarterly,
            _ => BillingPeriod::Monthly,
        }
    }

    /// Remote recurring interval for this period.
    pub fn interval(&self) -> RecurringInterval {
        map_interval(Some(self.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(IntervalUnit::Day),
            "week" => Some(IntervalUnit::Week),
            "month" => Some(IntervalUnit::Month),
            "year" => Some(IntervalUnit::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringInterval {
    pub unit: IntervalUnit,
    pub count: u64,
}

/// Maps a stored billing period onto the remote (unit, count) pair.
///
/// Both the create and the update path go through this function, so price
/// change detection compares against exactly what a fresh price would carry.
pub fn map_interval(billing_period: Option<&str>) -> RecurringInterval {
    let (unit, count) = match billing_period {
        Some("annual") => (IntervalUnit::Year, 1),
        Some("semiannual") => (IntervalUnit::Month, 6),
        Some("quarterly") => (IntervalUnit::Month, 3),
        _ => (IntervalUnit::Month, 1),
    };
    RecurringInterval { unit, count }
}

/// Converts a major-unit amount (euros) to minor units (cents).
///
/// Rounds half away from zero. This is lossy for sub-cent inputs; plans store
/// the converted integer so later comparisons never round again.
pub fn to_minor_units(amount: f64) -> Res<i64> {
    if !amount.is_finite() {
        return Err(AppError::BadRequest(
            "priceAmount must be a finite number".to_string(),
        ));
    }
    if amount < 0.0 {
        return Err(AppError::BadRequest(
            "priceAmount must be greater than or equal to 0".to_string(),
        ));
    }
    let cents = (amount * 100.0).round();
    if cents > i64::MAX as f64 {
        return Err(AppError::BadRequest("priceAmount is too large".to_string()));
    }
    Ok(cents as i64)
}

pub fn from_minor_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Stripe secret key. Never printed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        SecretKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Present and not blank.
    pub fn from_optional(key: Option<&str>) -> Option<Self> {
        key.map(str::trim)
            .filter(|k| !k.is_empty())
            .map(SecretKey::new)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(****)")
    }
}
