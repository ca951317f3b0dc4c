//! Reservation store — the engine's only write surface.
//!
//! The engine never owns reservation persistence; it consumes one logical
//! REST resource (`reservation`) over JSON:
//! - GET filtered by practitioner/patient + date + status (availability)
//! - POST one reservation per selected slot (create-mode submission)
//! - PUT a whole booking group at once (reschedule, atomic at the store)
//! - DELETE a whole booking group (cancellation, returns removed count)
//!
//! `ReservationStore` is the seam: coordinators are generic over it, the
//! HTTP client is the production impl, and `MemoryReservationStore` is the
//! configurable test double. The memory store also enforces the
//! (practitioner, date, time, confirmed) uniqueness backstop so the
//! documented double-booking race fails on the *second* create instead of
//! silently double-booking.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// Model
// ═══════════════════════════════════════════════════════════

/// Reservation lifecycle status. Cancelled records never appear in
/// availability or conflict queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

/// A persisted reservation record.
///
/// `patient_id = None` is a practitioner's personal block: a slot held
/// with no patient attached, unbookable but displayed differently.
/// `booking_ref` groups every reservation created in one checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub practitioner_id: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    /// Civil date, `YYYY-MM-DD` on the wire — local calendar date, never
    /// UTC-shifted.
    pub date: NaiveDate,
    /// Canonical slot start, `HH:MM`.
    pub start: String,
    pub service: String,
    pub price: f64,
    pub reason: Option<String>,
    pub status: ReservationStatus,
    pub booking_ref: String,
}

/// Payload for a single create call (one per selected slot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub practitioner_id: String,
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub date: NaiveDate,
    pub start: String,
    pub service: String,
    pub price: f64,
    pub reason: Option<String>,
    pub booking_ref: String,
}

/// One (date, start) pair of a reschedule bulk update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotChange {
    pub date: NaiveDate,
    pub start: String,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from reservation store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store rejected the request: {0}")]
    Rejected(String),
    #[error("Slot {start} on {date} is already reserved")]
    SlotTaken { date: NaiveDate, start: String },
    #[error("Unknown booking reference: {0}")]
    UnknownBookingRef(String),
}

// ═══════════════════════════════════════════════════════════
// Trait seam
// ═══════════════════════════════════════════════════════════

/// The reservation store as the engine sees it. Coordinators are generic
/// over this trait; nothing in the engine touches persistence directly.
#[allow(async_fn_in_trait)]
pub trait ReservationStore {
    /// Confirmed reservations held by a practitioner on a date.
    async fn confirmed_for_practitioner(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Confirmed reservations held by a patient on a date, with any
    /// practitioner.
    async fn confirmed_for_patient(
        &self,
        patient_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Create one reservation. Create-mode submission issues one call per
    /// selected slot, concurrently.
    async fn create_reservation(&self, new: &NewReservation) -> Result<Reservation, StoreError>;

    /// Replace every slot of a booking group in one atomic request,
    /// preserving the booking reference.
    async fn reschedule_group(
        &self,
        booking_ref: &str,
        slots: &[SlotChange],
    ) -> Result<(), StoreError>;

    /// Delete every reservation sharing a booking reference. Returns the
    /// number of records removed.
    async fn delete_group(&self, booking_ref: &str) -> Result<u32, StoreError>;
}

// ═══════════════════════════════════════════════════════════
// HTTP implementation
// ═══════════════════════════════════════════════════════════

/// REST client for the reservation store.
pub struct HttpReservationStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct DeleteGroupResponse {
    removed: u32,
}

impl HttpReservationStore {
    /// Point at a reservation store instance.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn reservations_url(&self) -> String {
        format!("{}/reservations", self.base_url)
    }

    fn group_url(&self, booking_ref: &str) -> String {
        format!("{}/reservations/group/{}", self.base_url, booking_ref)
    }
}

impl ReservationStore for HttpReservationStore {
    async fn confirmed_for_practitioner(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        debug!("GET reservations for practitioner {} on {}", practitioner_id, date);
        let response = self
            .client
            .get(self.reservations_url())
            .query(&[
                ("practitioner_id", practitioner_id),
                ("date", &date.to_string()),
                ("status", "confirmed"),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn confirmed_for_patient(
        &self,
        patient_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        debug!("GET reservations for patient {} on {}", patient_id, date);
        let response = self
            .client
            .get(self.reservations_url())
            .query(&[
                ("patient_id", patient_id),
                ("date", &date.to_string()),
                ("status", "confirmed"),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn create_reservation(&self, new: &NewReservation) -> Result<Reservation, StoreError> {
        debug!(
            "POST reservation {} {} for practitioner {}",
            new.date, new.start, new.practitioner_id
        );
        let response = self
            .client
            .post(self.reservations_url())
            .json(new)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(StoreError::SlotTaken {
                date: new.date,
                start: new.start.clone(),
            });
        }
        Ok(response.error_for_status()?.json().await?)
    }

    async fn reschedule_group(
        &self,
        booking_ref: &str,
        slots: &[SlotChange],
    ) -> Result<(), StoreError> {
        debug!("PUT booking group {} ({} slots)", booking_ref, slots.len());
        let response = self
            .client
            .put(self.group_url(booking_ref))
            .json(&serde_json::json!({ "slots": slots }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownBookingRef(booking_ref.to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn delete_group(&self, booking_ref: &str) -> Result<u32, StoreError> {
        debug!("DELETE booking group {}", booking_ref);
        let response = self
            .client
            .delete(self.group_url(booking_ref))
            .send()
            .await?
            .error_for_status()?;
        let parsed: DeleteGroupResponse = response.json().await?;
        Ok(parsed.removed)
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory implementation (test double)
// ═══════════════════════════════════════════════════════════

/// In-memory reservation store for tests — configurable failure injection.
///
/// Enforces the uniqueness backstop on (practitioner, date, start,
/// confirmed): a second conflicting create fails with `SlotTaken`.
#[derive(Default)]
pub struct MemoryReservationStore {
    records: Mutex<Vec<Reservation>>,
    create_failures: Mutex<HashSet<(NaiveDate, String)>>,
    practitioner_fetch_failure: Mutex<bool>,
    patient_fetch_failure: Mutex<bool>,
    reschedule_failure: Mutex<bool>,
    delete_failure: Mutex<bool>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing reservation.
    pub fn seed(&self, reservation: Reservation) {
        self.records.lock().unwrap().push(reservation);
    }

    /// Make every create call targeting (date, start) fail.
    pub fn fail_creates_at(&self, date: NaiveDate, start: &str) {
        self.create_failures
            .lock()
            .unwrap()
            .insert((date, start.to_string()));
    }

    pub fn fail_next_practitioner_fetch(&self) {
        *self.practitioner_fetch_failure.lock().unwrap() = true;
    }

    pub fn fail_next_patient_fetch(&self) {
        *self.patient_fetch_failure.lock().unwrap() = true;
    }

    pub fn fail_next_reschedule(&self) {
        *self.reschedule_failure.lock().unwrap() = true;
    }

    pub fn fail_next_delete(&self) {
        *self.delete_failure.lock().unwrap() = true;
    }

    /// Snapshot of all records (test assertions).
    pub fn records(&self) -> Vec<Reservation> {
        self.records.lock().unwrap().clone()
    }

    /// All records sharing a booking reference.
    pub fn group(&self, booking_ref: &str) -> Vec<Reservation> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.booking_ref == booking_ref)
            .cloned()
            .collect()
    }
}

impl ReservationStore for MemoryReservationStore {
    async fn confirmed_for_practitioner(
        &self,
        practitioner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        if std::mem::take(&mut *self.practitioner_fetch_failure.lock().unwrap()) {
            return Err(StoreError::Rejected("injected fetch failure".into()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.practitioner_id == practitioner_id
                    && r.date == date
                    && r.status == ReservationStatus::Confirmed
            })
            .cloned()
            .collect())
    }

    async fn confirmed_for_patient(
        &self,
        patient_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        if std::mem::take(&mut *self.patient_fetch_failure.lock().unwrap()) {
            return Err(StoreError::Rejected("injected fetch failure".into()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.patient_id.as_deref() == Some(patient_id)
                    && r.date == date
                    && r.status == ReservationStatus::Confirmed
            })
            .cloned()
            .collect())
    }

    async fn create_reservation(&self, new: &NewReservation) -> Result<Reservation, StoreError> {
        if self
            .create_failures
            .lock()
            .unwrap()
            .contains(&(new.date, new.start.clone()))
        {
            return Err(StoreError::Rejected(format!(
                "injected failure for {} {}",
                new.date, new.start
            )));
        }

        let mut records = self.records.lock().unwrap();
        let taken = records.iter().any(|r| {
            r.practitioner_id == new.practitioner_id
                && r.date == new.date
                && r.start == new.start
                && r.status == ReservationStatus::Confirmed
        });
        if taken {
            return Err(StoreError::SlotTaken {
                date: new.date,
                start: new.start.clone(),
            });
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            practitioner_id: new.practitioner_id.clone(),
            patient_id: Some(new.patient_id.clone()),
            patient_name: new.patient_name.clone(),
            date: new.date,
            start: new.start.clone(),
            service: new.service.clone(),
            price: new.price,
            reason: new.reason.clone(),
            status: ReservationStatus::Confirmed,
            booking_ref: new.booking_ref.clone(),
        };
        records.push(reservation.clone());
        Ok(reservation)
    }

    async fn reschedule_group(
        &self,
        booking_ref: &str,
        slots: &[SlotChange],
    ) -> Result<(), StoreError> {
        if std::mem::take(&mut *self.reschedule_failure.lock().unwrap()) {
            return Err(StoreError::Rejected("injected reschedule failure".into()));
        }

        let mut records = self.records.lock().unwrap();
        let template = records
            .iter()
            .find(|r| r.booking_ref == booking_ref)
            .cloned()
            .ok_or_else(|| StoreError::UnknownBookingRef(booking_ref.to_string()))?;

        // Atomic at the store: drop the old group, re-issue under the same ref.
        records.retain(|r| r.booking_ref != booking_ref);
        for slot in slots {
            records.push(Reservation {
                id: Uuid::new_v4(),
                date: slot.date,
                start: slot.start.clone(),
                ..template.clone()
            });
        }
        Ok(())
    }

    async fn delete_group(&self, booking_ref: &str) -> Result<u32, StoreError> {
        if std::mem::take(&mut *self.delete_failure.lock().unwrap()) {
            return Err(StoreError::Rejected("injected delete failure".into()));
        }

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.booking_ref != booking_ref);
        Ok((before - records.len()) as u32)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
