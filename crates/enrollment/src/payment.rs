//! Payment stage.
//!
//! Shows the per-program durations and their total, lets the student pick
//! a gateway, and builds the payload the gateway widget needs. A success
//! report from the gateway sends the student to the dashboard once.
//!
//! The gateway's success report is not verified here. Verification against
//! the provider belongs to the backend and is still pending.

use serde::Serialize;
use tc_core::billing::{compute_total, BillingDuration, DurationSelectionMap};
use tc_core::error::CoreError;
use tc_core::payment::{GatewayResponse, PaymentGateway, PaymentRequest};
use tc_core::stage::Stage;
use tc_core::types::{Amount, ProgramId, Timestamp};
use tc_events::bus;

use crate::config::EnrollmentConfig;
use crate::context::StageContext;
use crate::entry::{self, StageEntry};
use crate::error::FlowError;

/// What happened to a gateway success report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessOutcome {
    /// First report: the student was sent to the dashboard.
    Navigated,
    /// A repeat report; nothing happened.
    AlreadyCompleted,
    /// The stage was torn down before the report arrived.
    Discarded,
}

pub struct PaymentStage {
    ctx: StageContext,
    durations: DurationSelectionMap,
    payer_email: String,
    active_gateway: Option<PaymentGateway>,
    surface_open: bool,
    completed: bool,
}

impl PaymentStage {
    pub fn enter(
        ctx: StageContext,
        config: &EnrollmentConfig,
    ) -> Result<StageEntry<Self>, FlowError> {
        let upstream = match entry::payment_entry(&ctx.data)? {
            StageEntry::Ready(upstream) => upstream,
            StageEntry::Redirect(to) => {
                ctx.redirect(Stage::PaymentSelection, to);
                return Ok(StageEntry::Redirect(to));
            }
        };

        let total = compute_total(&upstream.durations);
        ctx.publish(
            Stage::PaymentSelection,
            bus::STAGE_ENTERED,
            serde_json::json!({ "total": total }),
        );

        Ok(StageEntry::Ready(Self {
            ctx,
            durations: upstream.durations,
            payer_email: upstream
                .payer_email
                .unwrap_or_else(|| config.default_payer_email.clone()),
            active_gateway: None,
            surface_open: false,
            completed: false,
        }))
    }

    /// Sum of every chosen duration's price.
    pub fn total(&self) -> Amount {
        compute_total(&self.durations)
    }

    /// Make `gateway` active and open its payment surface.
    pub fn select_gateway(&mut self, gateway: PaymentGateway) -> Result<(), CoreError> {
        if self.completed {
            return Err(CoreError::Conflict("Payment has already been completed".into()));
        }

        self.active_gateway = Some(gateway);
        self.surface_open = true;
        self.ctx.publish(
            Stage::PaymentSelection,
            bus::PAYMENT_GATEWAY_SELECTED,
            serde_json::json!({ "gateway": gateway.name(), "integrated": gateway.is_integrated() }),
        );
        Ok(())
    }

    /// Payload for the active gateway's widget.
    pub fn payment_request(&self, at: Timestamp) -> Result<PaymentRequest, CoreError> {
        if self.completed {
            return Err(CoreError::Conflict("Payment has already been completed".into()));
        }

        let gateway = self
            .active_gateway
            .filter(|_| self.surface_open)
            .ok_or_else(|| CoreError::Validation("Select a payment gateway first".into()))?;

        if !gateway.is_integrated() {
            return Err(CoreError::Validation(format!(
                "{} is not available yet",
                gateway.name()
            )));
        }

        Ok(PaymentRequest::new(gateway, self.total(), &self.payer_email, at))
    }

    /// Handle the gateway's success report.
    ///
    /// Only the first report navigates; repeats are ignored.
    pub fn on_gateway_success(&mut self, response: &GatewayResponse) -> SuccessOutcome {
        if self.ctx.is_torn_down() {
            tracing::debug!(
                session_id = %self.ctx.session_id,
                reference = %response.reference,
                "Success report for torn-down stage dropped"
            );
            return SuccessOutcome::Discarded;
        }
        if self.completed {
            tracing::debug!(
                session_id = %self.ctx.session_id,
                reference = %response.reference,
                "Duplicate success report ignored"
            );
            return SuccessOutcome::AlreadyCompleted;
        }

        self.completed = true;
        self.surface_open = false;

        tracing::warn!(
            session_id = %self.ctx.session_id,
            reference = %response.reference,
            status = ?response.status,
            total = self.total(),
            "Gateway reported payment success, server-side verification pending"
        );
        self.ctx.publish(
            Stage::PaymentSelection,
            bus::PAYMENT_SUCCEEDED,
            serde_json::json!({
                "reference": response.reference,
                "gateway": self.active_gateway.map(PaymentGateway::name),
                "total": self.total(),
                "verified": false,
            }),
        );
        self.ctx.navigate(Stage::Dashboard);

        SuccessOutcome::Navigated
    }

    /// Close the payment surface. Durations and total are untouched.
    pub fn on_gateway_cancel_or_close(&mut self) {
        self.surface_open = false;
        self.active_gateway = None;
        self.ctx.publish(
            Stage::PaymentSelection,
            bus::PAYMENT_CLOSED,
            serde_json::json!({}),
        );
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn durations(&self) -> &DurationSelectionMap {
        &self.durations
    }

    pub fn payer_email(&self) -> &str {
        &self.payer_email
    }

    pub fn active_gateway(&self) -> Option<PaymentGateway> {
        self.active_gateway
    }

    pub fn is_surface_open(&self) -> bool {
        self.surface_open
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn view(&self) -> PaymentStageView {
        PaymentStageView {
            stage: Stage::PaymentSelection,
            items: self
                .durations
                .iter()
                .map(|(program, choice)| PaymentLineItem {
                    program: *program,
                    duration: choice.duration,
                    label: choice.duration.label(),
                    price: choice.price,
                })
                .collect(),
            total: self.total(),
            gateways: PaymentGateway::ALL
                .into_iter()
                .map(|gateway| GatewayOption {
                    gateway,
                    name: gateway.name(),
                    integrated: gateway.is_integrated(),
                })
                .collect(),
            active_gateway: self.active_gateway,
            surface_open: self.surface_open,
            completed: self.completed,
        }
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStageView {
    pub stage: Stage,
    pub items: Vec<PaymentLineItem>,
    pub total: Amount,
    pub gateways: Vec<GatewayOption>,
    pub active_gateway: Option<PaymentGateway>,
    pub surface_open: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentLineItem {
    pub program: ProgramId,
    pub duration: BillingDuration,
    pub label: &'static str,
    pub price: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayOption {
    pub gateway: PaymentGateway,
    pub name: &'static str,
    pub integrated: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
