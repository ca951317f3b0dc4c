//! Booking wizard state machine — five ordered steps with forward guards.
//!
//! `Service(1) → Modality(2) → DateTime(3) → Intake(4) → Confirmation(5)`
//!
//! Step numbers are explicit navigation state, not implicit component
//! state, so back/forward and reload stay well-defined. Forward guards:
//! - 1→2 and 2→3: a service must be selected (the chosen modality is
//!   deliberately NOT re-checked at 2→3 — preserved source behavior)
//! - 3→4: at least one slot selected
//! - 4→5: both consents, and only through the submission coordinator's
//!   success path — `advance()` never enters Confirmation on its own
//!
//! Backward navigation is always allowed except out of Confirmation,
//! which is terminal: its only exits are Reschedule, Start New Booking,
//! or Cancel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::selection::SelectionCart;
use crate::slots::TimeSlot;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The five wizard steps, addressed by explicit step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    Service = 1,
    Modality = 2,
    DateTime = 3,
    Intake = 4,
    Confirmation = 5,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Service => Some(Self::Modality),
            Self::Modality => Some(Self::DateTime),
            Self::DateTime => Some(Self::Intake),
            Self::Intake => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::Service => None,
            Self::Modality => Some(Self::Service),
            Self::DateTime => Some(Self::Modality),
            Self::Intake => Some(Self::DateTime),
            Self::Confirmation => Some(Self::Intake),
        }
    }
}

/// The service chosen on step 1: a category plus its price tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChoice {
    pub name: String,
    pub price: f64,
}

/// Appointment modality chosen on step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Video,
}

/// Intake form fields collected on step 4.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeInfo {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub reason: Option<String>,
}

/// Errors from wizard navigation.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// A forward guard was violated. Inline message, never sent anywhere.
    #[error("{0}")]
    Validation(String),
    /// No backward navigation out of Confirmation.
    #[error("The confirmation step can only be left by rescheduling, starting over, or cancelling")]
    Terminal,
}

// ═══════════════════════════════════════════════════════════
// WizardState
// ═══════════════════════════════════════════════════════════

/// Everything the five steps accumulate for one practitioner's booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub service: Option<ServiceChoice>,
    pub modality: Option<Modality>,
    pub cart: SelectionCart,
    pub intake: IntakeInfo,
    pub consent_terms: bool,
    pub consent_policy: bool,
    /// Assigned on first successful submission; shared by every
    /// reservation of the group.
    pub booking_ref: Option<String>,
    /// Set while re-entering the date/time step to replace the group.
    pub rescheduling: bool,
    /// Last date the patient was looking at, for resume.
    pub viewed_date: Option<NaiveDate>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    /// Empty state at step 1 — created when the booking page opens.
    pub fn new() -> Self {
        Self {
            step: WizardStep::Service,
            service: None,
            modality: None,
            cart: SelectionCart::new(),
            intake: IntakeInfo::default(),
            consent_terms: false,
            consent_policy: false,
            booking_ref: None,
            rescheduling: false,
            viewed_date: None,
        }
    }

    // ── Mutations ────────────────────────────────────────

    pub fn select_service(&mut self, service: ServiceChoice) {
        self.service = Some(service);
    }

    pub fn select_modality(&mut self, modality: Modality) {
        self.modality = Some(modality);
    }

    pub fn toggle_slot(&mut self, date: NaiveDate, slot: &TimeSlot) {
        self.cart.toggle(date, slot);
    }

    pub fn set_intake(&mut self, intake: IntakeInfo) {
        self.intake = intake;
    }

    pub fn set_consents(&mut self, terms: bool, policy: bool) {
        self.consent_terms = terms;
        self.consent_policy = policy;
    }

    pub fn set_viewed_date(&mut self, date: NaiveDate) {
        self.viewed_date = Some(date);
    }

    // ── Guards ───────────────────────────────────────────

    /// The step-5 precondition: service selected, non-empty cart, both
    /// consents. Checked again by the submission coordinator.
    pub fn ready_to_submit(&self) -> Result<(), WizardError> {
        if self.service.is_none() {
            return Err(WizardError::Validation(
                "Please select a service before booking".into(),
            ));
        }
        if self.cart.is_empty() {
            return Err(WizardError::Validation(
                "Please select at least one time slot".into(),
            ));
        }
        if !(self.consent_terms && self.consent_policy) {
            return Err(WizardError::Validation(
                "Please accept the terms and the cancellation policy".into(),
            ));
        }
        Ok(())
    }

    // ── Navigation ───────────────────────────────────────

    /// Move forward one step, enforcing the guard for the transition.
    /// Leaves the step unchanged on a guard violation.
    ///
    /// Intake → Confirmation is not reachable here: that transition only
    /// happens through a successful submission.
    pub fn advance(&mut self) -> Result<WizardStep, WizardError> {
        let target = self
            .step
            .next()
            .ok_or(WizardError::Terminal)?;

        match target {
            WizardStep::Modality | WizardStep::DateTime => {
                if self.service.is_none() {
                    return Err(WizardError::Validation(
                        "Please select a service to continue".into(),
                    ));
                }
            }
            WizardStep::Intake => {
                if self.cart.is_empty() {
                    return Err(WizardError::Validation(
                        "Please select at least one time slot to continue".into(),
                    ));
                }
            }
            WizardStep::Confirmation => {
                return Err(WizardError::Validation(
                    "Booking must be submitted to reach the confirmation step".into(),
                ));
            }
            WizardStep::Service => unreachable!("step 1 is never a forward target"),
        }

        self.step = target;
        Ok(self.step)
    }

    /// Move back one step. Confirmation is terminal.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Confirmation {
            return Err(WizardError::Terminal);
        }
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        Ok(self.step)
    }

    /// Called by the submission coordinator after the store accepted the
    /// booking. The cart is kept for the confirmation summary.
    pub(crate) fn enter_confirmation(&mut self, booking_ref: String) {
        self.booking_ref = Some(booking_ref);
        self.rescheduling = false;
        self.step = WizardStep::Confirmation;
    }

    // ── Confirmation exits ───────────────────────────────

    /// Re-enter the date/time step to replace the whole booking group.
    /// Clears the slot selection; service, intake and reference survive.
    pub fn begin_reschedule(&mut self) -> Result<WizardStep, WizardError> {
        if self.booking_ref.is_none() {
            return Err(WizardError::Validation(
                "Nothing to reschedule — no booking reference".into(),
            ));
        }
        self.cart.clear();
        self.rescheduling = true;
        self.step = WizardStep::DateTime;
        Ok(self.step)
    }

    /// Full reset back to step 1, dropping the previous booking entirely.
    pub fn start_new_booking(&mut self) {
        *self = Self::new();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
