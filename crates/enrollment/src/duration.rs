//! Duration selection stage.
//!
//! The student picks a billing duration for every selected program. Each
//! choice captures the configured price at the time it is made. Confirming
//! persists `trainingDurations` and moves on to payment.

use serde::Serialize;
use tc_catalog::CatalogApi;
use tc_core::billing::{BillingDuration, DurationChoice, DurationPricing, DurationSelectionMap};
use tc_core::program::Program;
use tc_core::stage::Stage;
use tc_core::types::{Amount, ProgramId};
use tc_events::bus;

use crate::context::StageContext;
use crate::entry::{self, ConfirmOutcome, StageEntry};
use crate::error::FlowError;

/// Shown when a program has no duration on confirm.
pub const DURATION_REQUIRED_MESSAGE: &str = "Please select a duration for each examination";

pub struct DurationSelectionStage {
    ctx: StageContext,
    pricing: DurationPricing,
    programs: Vec<Program>,
    selection: DurationSelectionMap,
    validation_failed: bool,
}

impl DurationSelectionStage {
    /// Run the entry guard and, when ready, resolve program titles.
    ///
    /// Choices already stored for programs still in the selection are
    /// carried over, so stepping back from payment keeps them.
    pub async fn enter(
        ctx: StageContext,
        catalog: &dyn CatalogApi,
        pricing: &DurationPricing,
    ) -> Result<StageEntry<Self>, FlowError> {
        let ids = match entry::duration_entry(&ctx.data)? {
            StageEntry::Ready(ids) => ids,
            StageEntry::Redirect(to) => {
                ctx.redirect(Stage::DurationSelection, to);
                return Ok(StageEntry::Redirect(to));
            }
        };

        ctx.publish(
            Stage::DurationSelection,
            bus::STAGE_ENTERED,
            serde_json::json!({ "programs": ids }),
        );

        let selection: DurationSelectionMap = ctx
            .data
            .training_durations()?
            .map(|stored| {
                stored
                    .iter()
                    .filter(|(id, _)| ids.contains(*id))
                    .map(|(id, choice)| (*id, *choice))
                    .collect()
            })
            .unwrap_or_default();

        let programs = match ctx
            .load_programs(Stage::DurationSelection, catalog, &ids)
            .await
        {
            Some(loaded) => loaded.programs,
            None => ids.iter().map(|id| Program::placeholder(*id)).collect(),
        };

        Ok(StageEntry::Ready(Self {
            ctx,
            pricing: pricing.clone(),
            programs,
            selection,
            validation_failed: false,
        }))
    }

    /// Record `duration` for `program` at the configured price.
    ///
    /// Returns `false`, changing nothing, if `program` is not selected.
    pub fn select_duration(&mut self, program: ProgramId, duration: BillingDuration) -> bool {
        if self.program(program).is_none() {
            tracing::debug!(
                session_id = %self.ctx.session_id,
                program,
                "Duration for unselected program ignored"
            );
            return false;
        }
        self.selection.set(program, self.pricing.choice(duration));
        true
    }

    /// Persist the durations and advance, or flag which programs lack one.
    pub fn confirm_and_advance(&mut self) -> Result<ConfirmOutcome, FlowError> {
        if self.ctx.is_torn_down() {
            return Ok(ConfirmOutcome::TornDown);
        }

        let ids: Vec<ProgramId> = self.programs.iter().map(|p| p.id).collect();
        let missing = self.selection.missing_programs(&ids);
        if !missing.is_empty() {
            self.validation_failed = true;
            return Ok(ConfirmOutcome::Invalid {
                message: DURATION_REQUIRED_MESSAGE,
                missing,
            });
        }

        self.validation_failed = false;
        self.ctx.data.set_training_durations(&self.selection)?;
        self.ctx.publish(
            Stage::DurationSelection,
            bus::DURATIONS_CONFIRMED,
            serde_json::json!({ "durations": self.selection }),
        );
        self.ctx.navigate(Stage::PaymentSelection);

        Ok(ConfirmOutcome::Advanced {
            next: Stage::PaymentSelection,
        })
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn selection(&self) -> &DurationSelectionMap {
        &self.selection
    }

    pub fn validation_failed(&self) -> bool {
        self.validation_failed
    }

    pub fn view(&self) -> DurationStageView {
        DurationStageView {
            stage: Stage::DurationSelection,
            programs: self
                .programs
                .iter()
                .map(|p| ProgramDurationView {
                    id: p.id,
                    title: p.title.clone(),
                    selected: self.selection.get(p.id).copied(),
                })
                .collect(),
            options: self
                .pricing
                .options()
                .into_iter()
                .map(|(duration, price)| DurationOption {
                    duration,
                    label: duration.label(),
                    price,
                })
                .collect(),
            validation_message: self
                .validation_failed
                .then_some(DURATION_REQUIRED_MESSAGE),
        }
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DurationStageView {
    pub stage: Stage,
    pub programs: Vec<ProgramDurationView>,
    pub options: Vec<DurationOption>,
    pub validation_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDurationView {
    pub id: ProgramId,
    pub title: String,
    pub selected: Option<DurationChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DurationOption {
    pub duration: BillingDuration,
    pub label: &'static str,
    pub price: Amount,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tc_catalog::InMemoryCatalog;

    use super::*;
    use crate::context::test_helpers::context;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_course(Program::new(1, "JAMB"))
            .with_course(Program::new(2, "WAEC"))
    }

    async fn ready_stage(ctx: StageContext) -> DurationSelectionStage {
        match DurationSelectionStage::enter(ctx, &catalog(), &DurationPricing::default())
            .await
            .unwrap()
        {
            StageEntry::Ready(stage) => stage,
            StageEntry::Redirect(to) => panic!("unexpected redirect to {to:?}"),
        }
    }

    #[tokio::test]
    async fn missing_programs_redirects_without_error() {
        let (ctx, nav) = context();
        let entry = DurationSelectionStage::enter(ctx, &catalog(), &DurationPricing::default())
            .await
            .unwrap();

        assert_eq!(entry.redirect_target(), Some(Stage::ProgramSelection));
        assert_eq!(nav.last(), Some(Stage::ProgramSelection));
    }

    #[tokio::test]
    async fn enters_without_subject_selections() {
        let (ctx, _) = context();
        ctx.data.set_selected_training(&[1, 2]).unwrap();
        let stage = ready_stage(ctx).await;

        let titles: Vec<&str> = stage.programs().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["JAMB", "WAEC"]);
        assert!(stage.selection().is_empty());
    }

    #[tokio::test]
    async fn last_selection_wins_at_configured_price() {
        let (ctx, _) = context();
        ctx.data.set_selected_training(&[1]).unwrap();
        let mut stage = ready_stage(ctx).await;

        assert!(stage.select_duration(1, BillingDuration::Monthly));
        assert!(stage.select_duration(1, BillingDuration::Annually));

        assert_eq!(
            stage.selection().get(1),
            Some(&DurationChoice {
                duration: BillingDuration::Annually,
                price: 50000,
            })
        );
    }

    #[tokio::test]
    async fn unselected_program_is_ignored() {
        let (ctx, _) = context();
        ctx.data.set_selected_training(&[1]).unwrap();
        let mut stage = ready_stage(ctx).await;

        assert!(!stage.select_duration(7, BillingDuration::Monthly));
        assert!(stage.selection().is_empty());
    }

    #[tokio::test]
    async fn confirm_requires_every_program() {
        let (ctx, nav) = context();
        ctx.data.set_selected_training(&[1, 2]).unwrap();
        let data = ctx.data.clone();
        let mut stage = ready_stage(ctx).await;
        stage.select_duration(1, BillingDuration::Monthly);

        assert_matches!(
            stage.confirm_and_advance().unwrap(),
            ConfirmOutcome::Invalid { missing, .. } if missing == vec![2]
        );
        assert_eq!(stage.view().validation_message, Some(DURATION_REQUIRED_MESSAGE));
        assert_eq!(data.training_durations().unwrap(), None);
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn confirm_writes_durations_and_advances() {
        let (ctx, nav) = context();
        ctx.data.set_selected_training(&[1, 2]).unwrap();
        let data = ctx.data.clone();
        let mut stage = ready_stage(ctx).await;
        stage.select_duration(1, BillingDuration::Annually);
        stage.select_duration(2, BillingDuration::Monthly);

        assert_eq!(
            stage.confirm_and_advance().unwrap(),
            ConfirmOutcome::Advanced {
                next: Stage::PaymentSelection
            }
        );

        let stored = data.training_durations().unwrap().unwrap();
        assert_eq!(stored.get(1).unwrap().price, 50000);
        assert_eq!(stored.get(2).unwrap().price, 5000);
        assert_eq!(nav.last(), Some(Stage::PaymentSelection));
    }

    #[tokio::test]
    async fn custom_pricing_is_captured() {
        let (ctx, _) = context();
        ctx.data.set_selected_training(&[1]).unwrap();
        let pricing = DurationPricing::new(7000, 70000);
        let StageEntry::Ready(mut stage) = DurationSelectionStage::enter(ctx, &catalog(), &pricing)
            .await
            .unwrap()
        else {
            panic!("expected ready");
        };

        stage.select_duration(1, BillingDuration::Monthly);
        assert_eq!(stage.selection().get(1).unwrap().price, 7000);
        assert_eq!(stage.view().options[1].price, 70000);
    }

    #[tokio::test]
    async fn stored_choices_for_dropped_programs_are_not_carried() {
        let (ctx, _) = context();
        let pricing = DurationPricing::default();
        let stored: DurationSelectionMap = [
            (1, pricing.choice(BillingDuration::Monthly)),
            (3, pricing.choice(BillingDuration::Annually)),
        ]
        .into_iter()
        .collect();
        ctx.data.set_training_durations(&stored).unwrap();
        ctx.data.set_selected_training(&[1, 2]).unwrap();

        let stage = ready_stage(ctx).await;
        assert_eq!(stage.selection().len(), 1);
        assert!(stage.selection().get(1).is_some());
    }

    #[tokio::test]
    async fn catalog_failure_falls_back_to_placeholder_titles() {
        let (ctx, _) = context();
        ctx.data.set_selected_training(&[4]).unwrap();
        let catalog = catalog().failing_courses();
        let StageEntry::Ready(stage) =
            DurationSelectionStage::enter(ctx, &catalog, &DurationPricing::default())
                .await
                .unwrap()
        else {
            panic!("expected ready");
        };

        assert_eq!(stage.programs()[0].title, "Course 4");
    }
}
