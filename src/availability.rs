//! Availability resolver — three-way slot classification for one viewed day.
//!
//! Cross-references the fixed slot grid against two reservation sets:
//! the practitioner's own confirmed bookings (occupied) and the viewing
//! patient's confirmed bookings with *other* practitioners (conflicted —
//! the patient cannot attend two appointments at once). A reservation the
//! patient already holds with this same practitioner is not a conflict.
//!
//! Classification is rendering metadata only, never persisted. There is
//! no lock or lease between this check and submission; the store's
//! uniqueness constraint at write time is the only backstop.
//!
//! Failure semantics: if either fetch fails the resolver fails closed —
//! an empty day with `load_failed` set so the caller can offer a retry.
//! Nothing is offered as bookable on a fetch error.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, Timelike};
use serde::Serialize;
use tracing::{debug, warn};

use crate::slots::{slot_grid, MORNING_CUTOFF_HOUR};
use crate::store::{Reservation, ReservationStore};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Exhaustive classification of one slot. The occupied/conflicted
/// metadata exists purely for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    /// The practitioner holds this slot. `blocked` marks a personal hold
    /// with no patient attached; both forms are equally unbookable.
    Occupied {
        blocked: bool,
        service: String,
        patient_name: Option<String>,
    },
    /// The viewing patient already has this time with another
    /// practitioner. Overrides availability.
    Conflicted {
        practitioner_id: String,
        service: String,
    },
}

/// One grid slot with its classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAvailability {
    pub canonical: String,
    pub display: String,
    pub status: SlotStatus,
}

/// The resolved day. On "today" after the morning cutoff, morning slots
/// are omitted entirely — they are no longer bookable and carry no
/// useful classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
    /// Set when a reservation fetch failed and the day was failed closed.
    /// The caller should surface a retry affordance.
    pub load_failed: bool,
}

impl DayAvailability {
    /// The fail-closed result: nothing bookable, retry signalled.
    pub fn failed(date: NaiveDate) -> Self {
        Self {
            date,
            slots: Vec::new(),
            load_failed: true,
        }
    }

    pub fn available_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == SlotStatus::Available)
            .count()
    }

    pub fn status_of(&self, canonical: &str) -> Option<&SlotStatus> {
        self.slots
            .iter()
            .find(|s| s.canonical == canonical)
            .map(|s| &s.status)
    }
}

// ═══════════════════════════════════════════════════════════
// Resolver
// ═══════════════════════════════════════════════════════════

/// Resolve the availability view for one practitioner-day.
///
/// `patient` is the requesting patient, if signed in — absent for
/// anonymous browsing (no conflict detection). `now` is injected rather
/// than read from the wall clock so the today-cutoff rule is testable.
pub async fn resolve_availability<S: ReservationStore>(
    store: &S,
    practitioner_id: &str,
    date: NaiveDate,
    patient: Option<&str>,
    now: DateTime<Local>,
) -> DayAvailability {
    let practitioner_held = match store.confirmed_for_practitioner(practitioner_id, date).await {
        Ok(reservations) => reservations,
        Err(e) => {
            warn!("Availability fetch failed for {} on {}: {e}", practitioner_id, date);
            return DayAvailability::failed(date);
        }
    };

    let patient_held = match patient {
        Some(patient_id) => match store.confirmed_for_patient(patient_id, date).await {
            Ok(reservations) => reservations,
            Err(e) => {
                warn!("Patient conflict fetch failed for {} on {}: {e}", patient_id, date);
                return DayAvailability::failed(date);
            }
        },
        None => Vec::new(),
    };

    let occupied: HashMap<&str, &Reservation> = practitioner_held
        .iter()
        .map(|r| (r.start.as_str(), r))
        .collect();

    // Conflicts only count against *other* practitioners.
    let conflicts: HashMap<&str, &Reservation> = patient_held
        .iter()
        .filter(|r| r.practitioner_id != practitioner_id)
        .map(|r| (r.start.as_str(), r))
        .collect();

    let drop_morning = date == now.date_naive() && now.hour() >= MORNING_CUTOFF_HOUR;

    let slots = slot_grid()
        .into_iter()
        .filter(|slot| !(drop_morning && slot.is_morning()))
        .map(|slot| {
            let canonical = slot.canonical();
            let status = if let Some(held) = occupied.get(canonical.as_str()) {
                SlotStatus::Occupied {
                    blocked: held.patient_id.is_none(),
                    service: held.service.clone(),
                    patient_name: held.patient_name.clone(),
                }
            } else if let Some(other) = conflicts.get(canonical.as_str()) {
                SlotStatus::Conflicted {
                    practitioner_id: other.practitioner_id.clone(),
                    service: other.service.clone(),
                }
            } else {
                SlotStatus::Available
            };
            SlotAvailability {
                canonical,
                display: slot.display(),
                status,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "Resolved {} on {}: {} slots shown, {} available",
        practitioner_id,
        date,
        slots.len(),
        slots.iter().filter(|s| s.status == SlotStatus::Available).count()
    );

    DayAvailability {
        date,
        slots,
        load_failed: false,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
