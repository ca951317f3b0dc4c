//! Booking submission coordinator.
//!
//! Two modes, selected by the session's `rescheduling` flag:
//!
//! - **Create**: mint one booking reference, then one `create_reservation`
//!   call per selected slot, issued concurrently and joined all-settled.
//!   There is no cross-slot transaction and no rollback: slots that
//!   succeeded stay booked, and a partial failure reports each failed
//!   slot by its display date and time so the patient can retry exactly
//!   those.
//! - **Reschedule**: one atomic `reschedule_group` bulk update carrying
//!   the SAME reference, so the group's identity survives any number of
//!   reschedules. On failure the wizard state is untouched.
//!
//! Either mode ends, on success, with the durable cache cleared and the
//! session at the Confirmation step.

use chrono::{DateTime, Local};
use futures_util::future::join_all;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};

use crate::selection::Selection;
use crate::store::{NewReservation, ReservationStore, SlotChange, StoreError};
use crate::wizard::WizardError;
use crate::wizard_cache::WizardSession;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// What a successful submission hands back for the confirmation view.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub booking_ref: String,
    pub confirmed: Vec<Selection>,
    pub total_price: f64,
}

/// Errors from the submission coordinator.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Step-5 preconditions violated (service, cart, consents).
    #[error("{0}")]
    Validation(String),
    /// Some create calls failed after others succeeded. Succeeded slots
    /// are booked under `booking_ref` and are NOT rolled back.
    #[error("{} of {} appointments could not be booked",
            failed.len(), confirmed.len() + failed.len())]
    PartialFailure {
        booking_ref: String,
        confirmed: Vec<Selection>,
        /// Each entry pairs the selection with the store's reason.
        failed: Vec<(Selection, String)>,
    },
    /// The bulk update was rejected; the existing group is unchanged.
    #[error("Rescheduling failed: {0}")]
    Reschedule(#[source] StoreError),
}

impl From<WizardError> for BookingError {
    fn from(e: WizardError) -> Self {
        Self::Validation(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// Booking reference
// ═══════════════════════════════════════════════════════════

/// `BK-<millis>-<6 alphanumerics>` — sortable by creation time, with a
/// random tail against same-millisecond collisions.
fn mint_booking_ref(now: DateTime<Local>) -> String {
    let tail: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("BK-{}-{}", now.timestamp_millis(), tail)
}

// ═══════════════════════════════════════════════════════════
// Submission
// ═══════════════════════════════════════════════════════════

/// Submit the session's cart, in create or reschedule mode.
pub async fn submit<S: ReservationStore>(
    store: &S,
    session: &mut WizardSession,
    patient_id: &str,
    now: DateTime<Local>,
) -> Result<SubmissionReceipt, BookingError> {
    session.state().ready_to_submit()?;

    if session.state().rescheduling {
        resubmit_group(store, session).await
    } else {
        create_group(store, session, patient_id, now).await
    }
}

async fn create_group<S: ReservationStore>(
    store: &S,
    session: &mut WizardSession,
    patient_id: &str,
    now: DateTime<Local>,
) -> Result<SubmissionReceipt, BookingError> {
    let state = session.state();
    let service = state
        .service
        .clone()
        .ok_or_else(|| BookingError::Validation("No service selected".into()))?;
    let selections: Vec<Selection> = state.cart.iter().cloned().collect();
    let booking_ref = mint_booking_ref(now);

    info!(
        "Submitting {} appointment(s) for practitioner {} under {}",
        selections.len(),
        session.practitioner_id(),
        booking_ref
    );

    let patient_name = if state.intake.full_name.is_empty() {
        None
    } else {
        Some(state.intake.full_name.clone())
    };

    let calls = selections.iter().map(|sel| {
        let new = NewReservation {
            practitioner_id: session.practitioner_id().to_string(),
            patient_id: patient_id.to_string(),
            patient_name: patient_name.clone(),
            date: sel.date,
            start: sel.canonical.clone(),
            service: service.name.clone(),
            price: service.price,
            reason: state.intake.reason.clone(),
            booking_ref: booking_ref.clone(),
        };
        async move { store.create_reservation(&new).await }
    });
    let results = join_all(calls).await;

    let mut confirmed = Vec::new();
    let mut failed = Vec::new();
    for (sel, result) in selections.into_iter().zip(results) {
        match result {
            Ok(_) => confirmed.push(sel),
            Err(e) => {
                warn!("Slot {} {} failed: {}", sel.display_date, sel.display_time, e);
                failed.push((sel, e.to_string()));
            }
        }
    }

    if !failed.is_empty() {
        return Err(BookingError::PartialFailure {
            booking_ref,
            confirmed,
            failed,
        });
    }

    let total_price = service.price * confirmed.len() as f64;
    if let Err(e) = session.finish(booking_ref.clone()) {
        warn!("Booked {} but could not clear the wizard cache: {}", booking_ref, e);
    }
    info!("Booking {} confirmed ({} slots)", booking_ref, confirmed.len());

    Ok(SubmissionReceipt {
        booking_ref,
        confirmed,
        total_price,
    })
}

async fn resubmit_group<S: ReservationStore>(
    store: &S,
    session: &mut WizardSession,
) -> Result<SubmissionReceipt, BookingError> {
    let state = session.state();
    let booking_ref = state
        .booking_ref
        .clone()
        .ok_or_else(|| BookingError::Validation("No booking reference to reschedule".into()))?;
    let unit_price = state.service.as_ref().map_or(0.0, |s| s.price);
    let selections: Vec<Selection> = state.cart.iter().cloned().collect();
    let slots: Vec<SlotChange> = selections
        .iter()
        .map(|sel| SlotChange {
            date: sel.date,
            start: sel.canonical.clone(),
        })
        .collect();

    info!(
        "Rescheduling booking {} to {} slot(s)",
        booking_ref,
        slots.len()
    );

    store
        .reschedule_group(&booking_ref, &slots)
        .await
        .map_err(BookingError::Reschedule)?;

    let total_price = unit_price * selections.len() as f64;
    if let Err(e) = session.finish(booking_ref.clone()) {
        warn!(
            "Rescheduled {} but could not clear the wizard cache: {}",
            booking_ref, e
        );
    }
    info!("Booking {} rescheduled", booking_ref);

    Ok(SubmissionReceipt {
        booking_ref,
        confirmed: selections,
        total_price,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
