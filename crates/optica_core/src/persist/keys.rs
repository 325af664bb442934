//! Storage keys shared with earlier releases of the application.

pub const THEME_KEY: &str = "optica_theme";
pub const PATIENTS_KEY: &str = "optica_patients";
pub const ORDERS_KEY: &str = "optica_orders";
pub const TRIAL_START_KEY: &str = "optica_trial_start_date";
pub const LICENSE_ACTIVE_KEY: &str = "optica_license_active";

/// Suffix of the key holding a collection value that could not be decoded.
pub const UNREADABLE_SUFFIX: &str = ".unreadable";

/// Key under which an unreadable value of `key` is preserved.
pub fn unreadable_key(key: &str) -> String {
    format!("{key}{UNREADABLE_SUFFIX}")
}
