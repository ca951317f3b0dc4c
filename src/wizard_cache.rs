//! Durable wizard cache — one JSON file per practitioner.
//!
//! A patient who leaves mid-booking and comes back to the same
//! practitioner resumes where they stopped. Entries live at
//! `<data_dir>/wizard/<practitioner_id>.json` inside a versioned
//! envelope; parsing is defensive in every direction:
//! - missing file → fresh state
//! - unreadable or malformed JSON → fresh state, `warn!`
//! - schema version mismatch → fresh state, `warn!`
//!
//! A stale or corrupt cache must never block a new booking, so `load`
//! is infallible by design — only `save` and `remove` surface I/O errors.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::wizard::{WizardError, WizardState};

/// Bumped whenever the cached document shape changes; older entries are
/// discarded rather than migrated.
pub const CACHE_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════
// Envelope
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct CachedWizard {
    version: u32,
    updated_at: DateTime<Utc>,
    state: WizardState,
}

/// Sniffs only the version field, so a shape change in `WizardState`
/// still lets us read the version and log a meaningful reason.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from writing or removing cache entries. Loads never error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// File operations
// ═══════════════════════════════════════════════════════════

fn entry_path(dir: &Path, practitioner_id: &str) -> PathBuf {
    dir.join(format!("{practitioner_id}.json"))
}

/// Persist the state for a practitioner, stamping version and time.
pub fn save(dir: &Path, practitioner_id: &str, state: &WizardState) -> Result<(), CacheError> {
    fs::create_dir_all(dir)?;
    let envelope = CachedWizard {
        version: CACHE_VERSION,
        updated_at: Utc::now(),
        state: state.clone(),
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    fs::write(entry_path(dir, practitioner_id), json)?;
    debug!("Saved wizard cache for practitioner {}", practitioner_id);
    Ok(())
}

/// Load the cached state for a practitioner, or None when there is no
/// usable entry. Corrupt and outdated entries are discarded in place.
pub fn load(dir: &Path, practitioner_id: &str) -> Option<WizardState> {
    let path = entry_path(dir, practitioner_id);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Unreadable wizard cache {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<VersionProbe>(&raw) {
        Ok(probe) if probe.version != CACHE_VERSION => {
            warn!(
                "Discarding wizard cache for {} (version {} != {})",
                practitioner_id, probe.version, CACHE_VERSION
            );
            let _ = fs::remove_file(&path);
            return None;
        }
        Err(e) => {
            warn!("Discarding malformed wizard cache for {}: {}", practitioner_id, e);
            let _ = fs::remove_file(&path);
            return None;
        }
        Ok(_) => {}
    }

    match serde_json::from_str::<CachedWizard>(&raw) {
        Ok(envelope) => {
            debug!(
                "Restored wizard cache for practitioner {} (updated {})",
                practitioner_id, envelope.updated_at
            );
            Some(envelope.state)
        }
        Err(e) => {
            warn!("Discarding undecodable wizard cache for {}: {}", practitioner_id, e);
            let _ = fs::remove_file(&path);
            None
        }
    }
}

/// Drop the cached entry for a practitioner, if any.
pub fn remove(dir: &Path, practitioner_id: &str) -> Result<(), CacheError> {
    match fs::remove_file(entry_path(dir, practitioner_id)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ═══════════════════════════════════════════════════════════
// WizardSession — state + persistence, per practitioner
// ═══════════════════════════════════════════════════════════

/// One patient's in-progress booking with one practitioner, persisted
/// after every mutation so a mid-flow exit loses nothing.
///
/// Cache writes are best-effort: a failed save is logged and the
/// in-memory state stays authoritative for the rest of the session.
pub struct WizardSession {
    practitioner_id: String,
    cache_dir: PathBuf,
    state: WizardState,
}

impl WizardSession {
    /// Open a session, resuming from cache when a usable entry exists.
    pub fn open(cache_dir: &Path, practitioner_id: &str) -> Self {
        let state = load(cache_dir, practitioner_id).unwrap_or_default();
        Self {
            practitioner_id: practitioner_id.to_string(),
            cache_dir: cache_dir.to_path_buf(),
            state,
        }
    }

    /// Open a session under the application's standard cache directory.
    pub fn open_default(practitioner_id: &str) -> Self {
        Self::open(&crate::config::wizard_cache_dir(), practitioner_id)
    }

    pub fn practitioner_id(&self) -> &str {
        &self.practitioner_id
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    fn persist(&self) {
        if let Err(e) = save(&self.cache_dir, &self.practitioner_id, &self.state) {
            warn!(
                "Failed to save wizard cache for {}: {}",
                self.practitioner_id, e
            );
        }
    }

    /// Apply a mutation to the state, then persist. Errors from the
    /// mutation skip the save and leave the last snapshot in place.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut WizardState) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let value = f(&mut self.state)?;
        self.persist();
        Ok(value)
    }

    /// Infallible mutation variant (selection toggles, form edits).
    pub fn apply(&mut self, f: impl FnOnce(&mut WizardState)) {
        f(&mut self.state);
        self.persist();
    }

    /// Called by the submission coordinator on success: the durable
    /// cache is cleared, the confirmation state lives only in memory.
    pub(crate) fn finish(&mut self, booking_ref: String) -> Result<(), CacheError> {
        self.state.enter_confirmation(booking_ref);
        remove(&self.cache_dir, &self.practitioner_id)
    }

    /// Full reset after a bulk cancellation: fresh state, no cache.
    pub fn reset_after_cancellation(&mut self) -> Result<(), CacheError> {
        self.state = WizardState::new();
        remove(&self.cache_dir, &self.practitioner_id)
    }

    /// Start over from the confirmation step, dropping cache and state.
    pub fn start_new_booking(&mut self) -> Result<(), CacheError> {
        self.state.start_new_booking();
        remove(&self.cache_dir, &self.practitioner_id)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::TimeSlot;
    use crate::wizard::{ServiceChoice, WizardStep};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_state() -> WizardState {
        let mut state = WizardState::new();
        state.select_service(ServiceChoice {
            name: "Follow Up".into(),
            price: 100.0,
        });
        state.toggle_slot(date("2025-03-10"), &TimeSlot::from_hour(9).unwrap());
        state
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let state = sample_state();

        save(dir.path(), "prac-1", &state).unwrap();
        let restored = load(dir.path(), "prac-1").unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn missing_entry_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path(), "prac-1").is_none());
    }

    #[test]
    fn malformed_json_discarded_silently() {
        crate::config::init_test_tracing();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("prac-1.json"), "{not json").unwrap();

        assert!(load(dir.path(), "prac-1").is_none());
        assert!(
            !dir.path().join("prac-1.json").exists(),
            "corrupt entry removed"
        );
    }

    #[test]
    fn version_mismatch_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let state = sample_state();
        save(dir.path(), "prac-1", &state).unwrap();

        // Rewrite the envelope claiming a future schema version.
        let path = dir.path().join("prac-1.json");
        let raw = fs::read_to_string(&path).unwrap();
        let bumped = raw.replacen(
            &format!("\"version\": {CACHE_VERSION}"),
            &format!("\"version\": {}", CACHE_VERSION + 1),
            1,
        );
        assert_ne!(raw, bumped, "test must actually rewrite the version");
        fs::write(&path, bumped).unwrap();

        assert!(load(dir.path(), "prac-1").is_none());
    }

    #[test]
    fn entries_are_keyed_by_practitioner() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "prac-1", &sample_state()).unwrap();
        save(dir.path(), "prac-2", &WizardState::new()).unwrap();

        let one = load(dir.path(), "prac-1").unwrap();
        let two = load(dir.path(), "prac-2").unwrap();
        assert!(one.service.is_some());
        assert!(two.service.is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "prac-1", &sample_state()).unwrap();

        remove(dir.path(), "prac-1").unwrap();
        remove(dir.path(), "prac-1").unwrap();
        assert!(load(dir.path(), "prac-1").is_none());
    }

    #[test]
    fn session_resumes_cart_service_and_viewed_date() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut session = WizardSession::open(dir.path(), "prac-1");
            session.apply(|s| {
                s.select_service(ServiceChoice {
                    name: "Initial Consultation".into(),
                    price: 150.0,
                });
                s.toggle_slot(date("2025-03-10"), &TimeSlot::from_hour(14).unwrap());
                s.set_viewed_date(date("2025-03-10"));
            });
        }

        let session = WizardSession::open(dir.path(), "prac-1");
        assert_eq!(
            session.state().service.as_ref().unwrap().name,
            "Initial Consultation"
        );
        assert_eq!(session.state().cart.len(), 1);
        assert_eq!(
            session.state().viewed_date,
            Some(date("2025-03-10")),
            "calendar reopens on the last viewed date"
        );
    }

    #[test]
    fn failed_guard_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = WizardSession::open(dir.path(), "prac-1");

        // 1→2 without a service fails; nothing should be cached.
        assert!(session.update(|s| s.advance()).is_err());
        assert!(load(dir.path(), "prac-1").is_none());
    }

    #[test]
    fn finish_clears_cache_and_enters_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = WizardSession::open(dir.path(), "prac-1");
        session.apply(|s| *s = sample_state());
        assert!(load(dir.path(), "prac-1").is_some());

        session.finish("BK-1".into()).unwrap();
        assert_eq!(session.state().step, WizardStep::Confirmation);
        assert_eq!(session.state().booking_ref.as_deref(), Some("BK-1"));
        assert!(load(dir.path(), "prac-1").is_none(), "cache cleared");
        assert!(!session.state().cart.is_empty(), "cart kept for the summary");
    }

    #[test]
    fn reset_after_cancellation_drops_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = WizardSession::open(dir.path(), "prac-1");
        session.apply(|s| *s = sample_state());

        session.reset_after_cancellation().unwrap();
        assert_eq!(*session.state(), WizardState::new());
        assert!(load(dir.path(), "prac-1").is_none());
    }
}
