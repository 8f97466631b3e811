//! Payment gateways and the payload handed to them.
//!
//! The wizard never talks to a gateway directly. It builds a
//! [`PaymentRequest`] for the active gateway's widget and receives a
//! [`GatewayResponse`] through the widget's success callback. The response
//! is provisional: verifying the charge is a server-side concern handled
//! elsewhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Amount, Timestamp};

/// Prefix of every payment reference.
pub const REFERENCE_PREFIX: &str = "TC";

/// Metadata `source` tag attached to training payments.
pub const PAYMENT_SOURCE: &str = "training_payment";

/// Minor units (kobo) per naira.
pub const MINOR_UNITS_PER_MAJOR: Amount = 100;

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

/// Payment providers offered on the payment page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentGateway {
    Paystack,
    Flutterwave,
    PayPal,
    Interswitch,
}

impl PaymentGateway {
    /// Gateways in display order.
    pub const ALL: [PaymentGateway; 4] = [
        PaymentGateway::Paystack,
        PaymentGateway::Flutterwave,
        PaymentGateway::PayPal,
        PaymentGateway::Interswitch,
    ];

    /// Parse a gateway from its display name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown payment gateway '{name}'. Must be one of: Paystack, Flutterwave, PayPal, Interswitch"
                ))
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Paystack => "Paystack",
            Self::Flutterwave => "Flutterwave",
            Self::PayPal => "PayPal",
            Self::Interswitch => "Interswitch",
        }
    }

    /// Whether a widget exists for this gateway. Only Paystack is wired up.
    pub fn is_integrated(self) -> bool {
        matches!(self, Self::Paystack)
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Payload supplied to a gateway widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub gateway: PaymentGateway,
    /// Total in naira.
    pub amount: Amount,
    /// Total in kobo, the unit gateway APIs charge in.
    pub amount_minor: Amount,
    pub payer_email: String,
    pub reference: String,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentRequest {
    pub fn new(
        gateway: PaymentGateway,
        amount: Amount,
        payer_email: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            gateway,
            amount,
            amount_minor: amount.saturating_mul(MINOR_UNITS_PER_MAJOR),
            payer_email: payer_email.into(),
            reference: payment_reference(at),
            metadata: BTreeMap::from([("source".to_string(), PAYMENT_SOURCE.to_string())]),
        }
    }
}

/// Reference of the form `TC-{unix millis}`.
pub fn payment_reference(at: Timestamp) -> String {
    format!("{REFERENCE_PREFIX}-{}", at.timestamp_millis())
}

/// What a gateway widget reports on success. Unverified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
