//! Clinicbook — appointment scheduling and multi-slot booking engine.
//!
//! The engine behind a practitioner-booking marketplace's checkout: a
//! patient picks a practitioner, walks a five-step wizard, selects any
//! number of one-hour slots across dates, and books them all in one
//! submission under a single booking reference. The same reference later
//! drives group reschedule and group cancellation.
//!
//! Layering, bottom up:
//! - [`slots`] — the fixed 8-slot daily grid and canonical/display times
//! - [`store`] — the reservation REST resource behind a trait seam
//! - [`directory`] / [`authorization`] — who offers what, who may book
//! - [`availability`] — three-way slot classification, fail-closed
//! - [`selection`] — the toggle-only multi-slot cart
//! - [`wizard`] / [`wizard_cache`] — step machine and durable resume
//! - [`booking`] / [`cancellation`] — the coordinators that touch the store

pub mod authorization;
pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod config;
pub mod directory;
pub mod selection;
pub mod slots;
pub mod store;
pub mod wizard;
pub mod wizard_cache;

pub use authorization::{ensure_patient, AuthorizationError, Identity};
pub use availability::{resolve_availability, DayAvailability, SlotAvailability, SlotStatus};
pub use booking::{submit, BookingError, SubmissionReceipt};
pub use cancellation::{cancel_group, CancellationError};
pub use directory::{DirectoryClient, DirectoryError, PractitionerProfile, ServiceTier};
pub use selection::{Selection, SelectionCart};
pub use slots::{slot_grid, TimeSlot};
pub use store::{
    HttpReservationStore, MemoryReservationStore, NewReservation, Reservation, ReservationStatus,
    ReservationStore, SlotChange, StoreError,
};
pub use wizard::{
    IntakeInfo, Modality, ServiceChoice, WizardError, WizardState, WizardStep,
};
pub use wizard_cache::{WizardSession, CACHE_VERSION};
