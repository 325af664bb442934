//! Theme preference stored beside the clinic collections.

use crate::persist::keys::THEME_KEY;
use crate::repo::kv_repo::{KeyValueStore, StorageResult};
use log::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemePreference {
    #[default]
    Dark,
    Light,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Reads the stored theme. Absent or unrecognized values yield the default.
    pub fn load<S: KeyValueStore>(kv: &S) -> StorageResult<Self> {
        let Some(raw) = kv.get_bytes(THEME_KEY)? else {
            return Ok(Self::default());
        };
        let parsed = std::str::from_utf8(&raw).ok().and_then(Self::parse);
        Ok(parsed.unwrap_or_else(|| {
            warn!("event=storage_read_error module=service status=fallback key={THEME_KEY}");
            Self::default()
        }))
    }

    pub fn store<S: KeyValueStore>(self, kv: &S) -> StorageResult<()> {
        kv.put(THEME_KEY, self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ThemePreference;
    use crate::db::open_db_in_memory;
    use crate::persist::keys::THEME_KEY;
    use crate::repo::kv_repo::{KeyValueStore, SqliteKeyValueStore};

    #[test]
    fn missing_theme_defaults_to_dark() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKeyValueStore::new(&conn);
        assert_eq!(ThemePreference::load(&kv).unwrap(), ThemePreference::Dark);
    }

    #[test]
    fn stored_theme_is_read_back() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKeyValueStore::new(&conn);
        ThemePreference::Light.store(&kv).unwrap();
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        assert_eq!(ThemePreference::load(&kv).unwrap(), ThemePreference::Light);
    }

    #[test]
    fn garbage_theme_falls_back_to_default() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKeyValueStore::new(&conn);
        kv.put(THEME_KEY, "{not a theme").unwrap();
        assert_eq!(ThemePreference::load(&kv).unwrap(), ThemePreference::Dark);
    }

    #[test]
    fn non_utf8_theme_falls_back_to_default() {
        let conn = open_db_in_memory().unwrap();
        let kv = SqliteKeyValueStore::new(&conn);
        kv.put_bytes(THEME_KEY, &[0xFF, 0xFE]).unwrap();
        assert_eq!(ThemePreference::load(&kv).unwrap(), ThemePreference::Dark);
    }
}
