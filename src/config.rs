//! Application paths and constants.

use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Clinicbook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=debug,info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Clinicbook/ on all platforms (user-visible, holds resumable wizard state)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Clinicbook")
}

/// Get the wizard cache directory (one JSON document per practitioner)
pub fn wizard_cache_dir() -> PathBuf {
    app_data_dir().join("wizard")
}

/// Install the tracing subscriber for tests, honoring RUST_LOG when set.
/// Safe to call from every test; only the first call installs.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Clinicbook"));
    }

    #[test]
    fn wizard_cache_dir_under_app_data() {
        let cache = wizard_cache_dir();
        let app = app_data_dir();
        assert!(cache.starts_with(app));
        assert!(cache.ends_with("wizard"));
    }

    #[test]
    fn log_filter_names_this_crate() {
        assert!(default_log_filter().starts_with("clinicbook="));
    }

    #[test]
    fn test_tracing_install_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }
}
