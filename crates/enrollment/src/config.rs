use tc_core::billing::{DurationPricing, DEFAULT_ANNUAL_PRICE, DEFAULT_MONTHLY_PRICE};

/// Payer email used when the student profile carries none.
pub const DEFAULT_PAYER_EMAIL: &str = "student@email.com";

/// Wizard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnrollmentConfig {
    /// Price per billing duration.
    pub pricing: DurationPricing,
    /// Fallback payer email for the gateway payload.
    pub default_payer_email: String,
}

impl EnrollmentConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default             |
    /// |-----------------------|---------------------|
    /// | `PRICE_MONTHLY`       | `5000`              |
    /// | `PRICE_ANNUALLY`      | `50000`             |
    /// | `DEFAULT_PAYER_EMAIL` | `student@email.com` |
    pub fn from_env() -> Self {
        let monthly: u64 = std::env::var("PRICE_MONTHLY")
            .map(|v| v.parse().expect("PRICE_MONTHLY must be a valid u64"))
            .unwrap_or(DEFAULT_MONTHLY_PRICE);

        let annually: u64 = std::env::var("PRICE_ANNUALLY")
            .map(|v| v.parse().expect("PRICE_ANNUALLY must be a valid u64"))
            .unwrap_or(DEFAULT_ANNUAL_PRICE);

        let default_payer_email =
            std::env::var("DEFAULT_PAYER_EMAIL").unwrap_or_else(|_| DEFAULT_PAYER_EMAIL.into());

        Self {
            pricing: DurationPricing::new(monthly, annually),
            default_payer_email,
        }
    }
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            pricing: DurationPricing::default(),
            default_payer_email: DEFAULT_PAYER_EMAIL.to_string(),
        }
    }
}
