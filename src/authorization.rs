//! Who may book: the patient-only gate.
//!
//! Practitioners manage their calendars elsewhere; the booking engine
//! only ever acts on behalf of a signed-in patient. The gate runs before
//! any engine logic, so a denied caller never touches the store.
//! Availability *browsing* is the one exception — it accepts
//! `Identity::Anonymous` and simply skips patient-conflict detection.

/// The caller's identity as the surrounding application resolved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Patient(String),
    Practitioner(String),
    Anonymous,
}

impl Identity {
    /// The patient id for conflict detection, if the caller has one.
    pub fn patient_id(&self) -> Option<&str> {
        match self {
            Self::Patient(id) => Some(id),
            _ => None,
        }
    }
}

/// Errors from the booking gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Please sign in to book an appointment")]
    NotSignedIn,
    #[error("Practitioner accounts cannot book appointments")]
    PractitionersCannotBook,
}

/// Admit only signed-in patients, returning the patient id to act under.
pub fn ensure_patient(identity: &Identity) -> Result<&str, AuthorizationError> {
    match identity {
        Identity::Patient(id) => Ok(id),
        Identity::Practitioner(_) => Err(AuthorizationError::PractitionersCannotBook),
        Identity::Anonymous => Err(AuthorizationError::NotSignedIn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patients_pass_with_their_id() {
        let identity = Identity::Patient("pat-1".into());
        assert_eq!(ensure_patient(&identity).unwrap(), "pat-1");
        assert_eq!(identity.patient_id(), Some("pat-1"));
    }

    #[test]
    fn practitioners_denied() {
        let identity = Identity::Practitioner("prac-1".into());
        assert!(matches!(
            ensure_patient(&identity),
            Err(AuthorizationError::PractitionersCannotBook)
        ));
    }

    #[test]
    fn anonymous_denied_but_may_browse() {
        let identity = Identity::Anonymous;
        assert!(matches!(
            ensure_patient(&identity),
            Err(AuthorizationError::NotSignedIn)
        ));
        assert_eq!(identity.patient_id(), None, "browsing passes no patient");
    }
}
