//! Billing durations, the duration price table, and enrollment totals.
//!
//! A student picks one [`BillingDuration`] per program. The price for a
//! duration comes from [`DurationPricing`], a static table that can be
//! overridden from configuration; changing a price is a data edit, never a
//! logic edit. [`compute_total`] sums the chosen prices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Amount, ProgramId};

// ---------------------------------------------------------------------------
// Billing duration
// ---------------------------------------------------------------------------

/// How often a program is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingDuration {
    Monthly,
    Annually,
}

impl BillingDuration {
    /// All durations, in display order.
    pub const ALL: [BillingDuration; 2] = [BillingDuration::Monthly, BillingDuration::Annually];

    /// Parse a duration from its wire value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "annually" => Ok(Self::Annually),
            _ => Err(CoreError::Validation(format!(
                "Invalid duration '{s}'. Must be one of: monthly, annually"
            ))),
        }
    }

    /// Wire value stored in the session.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annually => "annually",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Annually => "Annually",
        }
    }
}

// ---------------------------------------------------------------------------
// Price table
// ---------------------------------------------------------------------------

/// Default monthly price in naira.
pub const DEFAULT_MONTHLY_PRICE: Amount = 5_000;

/// Default annual price in naira.
pub const DEFAULT_ANNUAL_PRICE: Amount = 50_000;

/// Price per billing duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationPricing {
    prices: BTreeMap<BillingDuration, Amount>,
}

impl DurationPricing {
    pub fn new(monthly: Amount, annually: Amount) -> Self {
        let prices = BTreeMap::from([
            (BillingDuration::Monthly, monthly),
            (BillingDuration::Annually, annually),
        ]);
        Self { prices }
    }

    /// Price for `duration`. Every duration has an entry by construction.
    pub fn price(&self, duration: BillingDuration) -> Amount {
        self.prices.get(&duration).copied().unwrap_or_default()
    }

    /// Build the stored choice for `duration`.
    pub fn choice(&self, duration: BillingDuration) -> DurationChoice {
        DurationChoice {
            duration,
            price: self.price(duration),
        }
    }

    /// `(duration, price)` pairs in display order.
    pub fn options(&self) -> Vec<(BillingDuration, Amount)> {
        BillingDuration::ALL
            .iter()
            .map(|d| (*d, self.price(*d)))
            .collect()
    }
}

impl Default for DurationPricing {
    fn default() -> Self {
        Self::new(DEFAULT_MONTHLY_PRICE, DEFAULT_ANNUAL_PRICE)
    }
}

// ---------------------------------------------------------------------------
// Duration selections
// ---------------------------------------------------------------------------

/// A program's chosen duration and the price captured when it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationChoice {
    pub duration: BillingDuration,
    pub price: Amount,
}

/// Chosen duration per program, persisted under `trainingDurations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationSelectionMap(BTreeMap<ProgramId, DurationChoice>);

impl DurationSelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the choice for `program`, replacing any earlier one.
    pub fn set(&mut self, program: ProgramId, choice: DurationChoice) {
        self.0.insert(program, choice);
    }

    pub fn get(&self, program: ProgramId) -> Option<&DurationChoice> {
        self.0.get(&program)
    }

    /// Programs from `required` without a chosen duration.
    pub fn missing_programs(&self, required: &[ProgramId]) -> Vec<ProgramId> {
        required
            .iter()
            .copied()
            .filter(|id| !self.0.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProgramId, &DurationChoice)> {
        self.0.iter()
    }
}

impl FromIterator<(ProgramId, DurationChoice)> for DurationSelectionMap {
    fn from_iter<I: IntoIterator<Item = (ProgramId, DurationChoice)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sum of the prices of every chosen duration. `0` for an empty map.
///
/// Saturates instead of wrapping on overflow.
pub fn compute_total(selections: &DurationSelectionMap) -> Amount {
    selections
        .iter()
        .fold(0, |sum: Amount, (_, choice)| sum.saturating_add(choice.price))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
