//! Bulk cancellation by booking reference.
//!
//! One call removes every reservation of the group — there is no
//! per-slot cancellation surface. The store reports how many records it
//! removed; zero means the reference matched nothing (already cancelled,
//! or never existed) and is surfaced as its own error so the caller can
//! keep state untouched and let the patient retry.

use tracing::{info, warn};

use crate::store::{ReservationStore, StoreError};

/// Errors from group cancellation.
#[derive(Debug, thiserror::Error)]
pub enum CancellationError {
    #[error("Cancellation failed: {0}")]
    Store(#[from] StoreError),
    #[error("No appointments found under booking reference {0}")]
    NothingCancelled(String),
}

/// Delete every reservation sharing `booking_ref`. Returns how many were
/// removed. The caller clears the wizard session afterwards via
/// `WizardSession::reset_after_cancellation`.
pub async fn cancel_group<S: ReservationStore>(
    store: &S,
    booking_ref: &str,
) -> Result<u32, CancellationError> {
    let removed = store.delete_group(booking_ref).await?;
    if removed == 0 {
        warn!("Cancellation of {} matched no reservations", booking_ref);
        return Err(CancellationError::NothingCancelled(booking_ref.to_string()));
    }
    info!("Cancelled booking {} ({} reservations)", booking_ref, removed);
    Ok(removed)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
