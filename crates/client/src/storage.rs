//! Persistent key-value storage.
//!
//! Backed by `localStorage` in the browser and by JSON files under the
//! platform config directory natively (`MOTORBAY_DATA_DIR` overrides
//! the location, which the test suite uses to point at a scratch
//! directory). Every operation degrades to a no-op / absent result when
//! the medium is unavailable; nothing in here panics or returns an
//! error.

use serde::{de::DeserializeOwned, Serialize};

/// Serialize and persist a value. Returns `true` on success.
pub fn save<T: Serialize>(key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => imp::write(key, &json),
        Err(_) => false,
    }
}

/// Load and deserialize a value. Absent keys and stale shapes both
/// read as `None`.
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    serde_json::from_str(&imp::read(key)?).ok()
}

/// Delete a key. Deleting an absent key is fine.
pub fn remove(key: &str) {
    imp::delete(key);
}

/// Whether a key currently holds a value.
pub fn exists(key: &str) -> bool {
    imp::read(key).is_some()
}

#[cfg(target_arch = "wasm32")]
mod imp {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    pub fn write(key: &str, value: &str) -> bool {
        match local_storage() {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => false,
        }
    }

    pub fn read(key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok()?
    }

    pub fn delete(key: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use std::path::PathBuf;

    fn file_for(key: &str) -> Option<PathBuf> {
        let base = match std::env::var("MOTORBAY_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()?.join("motorbay"),
        };
        if !base.exists() {
            std::fs::create_dir_all(&base).ok()?;
        }

        // Keys become file names; strip anything a filesystem rejects.
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        Some(base.join(format!("{safe_key}.json")))
    }

    pub fn write(key: &str, value: &str) -> bool {
        match file_for(key) {
            Some(path) => std::fs::write(path, value).is_ok(),
            None => false,
        }
    }

    pub fn read(key: &str) -> Option<String> {
        std::fs::read_to_string(file_for(key)?).ok()
    }

    pub fn delete(key: &str) {
        if let Some(path) = file_for(key) {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn save_load_remove_round_trip() {
        std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-tests"));

        let key = "storage_round_trip";
        assert!(save(key, &vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            load::<Vec<String>>(key),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(exists(key));

        remove(key);
        assert_eq!(load::<Vec<String>>(key), None);
        assert!(!exists(key));
    }

    #[test]
    fn load_of_mismatched_shape_is_absent() {
        std::env::set_var("MOTORBAY_DATA_DIR", std::env::temp_dir().join("motorbay-tests"));

        let key = "storage_shape_mismatch";
        assert!(save(key, &42u32));
        assert_eq!(load::<Vec<String>>(key), None);
        remove(key);
    }
}
