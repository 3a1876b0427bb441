//! Credential storage for the back-office session.
//!
//! The auth token and the last-used API URL are the only state the client
//! persists. [`KeyringStore`] keeps them in the OS credential store (Keychain
//! on macOS, DPAPI on Windows, Secret Service on Linux). [`MemoryStore`] is a
//! process-local stand-in for headless runs and tests.

use keyring::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};
use zeroize::Zeroizing;

const SERVICE_NAME: &str = "restaurant-backoffice";

// Credential keys
pub const KEY_AUTH_TOKEN: &str = "auth_token";
pub const KEY_API_URL: &str = "api_url";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[KEY_AUTH_TOKEN, KEY_API_URL];

pub trait CredentialStore: Send + Sync {
    /// Returns `None` when the entry does not exist.
    fn get(&self, key: &str) -> Option<Zeroizing<String>>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    /// Succeeds silently if the entry does not exist.
    fn delete(&self, key: &str) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// OS keyring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Option<Zeroizing<String>> {
        let entry = match Entry::new(&self.service, key) {
            Ok(e) => e,
            Err(e) => {
                warn!(key, error = %e, "keyring: failed to create entry");
                return None;
            }
        };
        match entry.get_password() {
            Ok(pw) => Some(Zeroizing::new(pw)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "keyring: failed to read credential");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let entry = Entry::new(&self.service, key).map_err(|e| e.to_string())?;
        entry.set_password(value).map_err(|e| e.to_string())
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        let entry = Entry::new(&self.service, key).map_err(|e| e.to_string())?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Zeroizing<String>>>,
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Zeroizing<String>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Zeroizing::new(value.to_string()));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// High-level API
// ---------------------------------------------------------------------------

/// Remove every credential this client manages (used on full reset).
pub fn factory_reset(store: &dyn CredentialStore) -> Result<(), String> {
    for key in ALL_KEYS {
        store.delete(key)?;
    }
    info!("credential store cleared");
    Ok(())
}
