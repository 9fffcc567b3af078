use crate::storage::{
    KeyValueStore, StorageError, CHANNEL_VERIFIED_KEY, DISPLAY_NAME_KEY, HAS_SPUN_KEY,
    TOTAL_CLAIMED_KEY,
};
use serde::{Deserialize, Serialize};

/// The durable half of a player's spin state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpinSession {
    pub total_claimed_amount: f64,
    pub has_spun_before: bool,
    pub display_name: Option<String>,
    pub channel_verified: bool,
}

fn read_flag<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> bool {
    match store.get(key).as_deref().map(str::trim) {
        None => false,
        Some("true") => true,
        Some("false") | Some("") => false,
        Some(other) => {
            log::warn!("ignoring corrupt value '{}' for '{}'", other, key);
            false
        }
    }
}

fn write_flag<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: bool,
) -> Result<(), StorageError> {
    if value {
        store.set(key, "true")
    } else {
        store.remove(key)
    }
}

impl SpinSession {
    /// Reads the session back from storage. Missing or corrupt entries fall
    /// back to first-visit defaults.
    pub fn hydrate<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let total_claimed_amount = match store.get(TOTAL_CLAIMED_KEY) {
            None => 0.0,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
                _ => {
                    log::warn!("ignoring corrupt claimed amount '{}'", raw);
                    0.0
                }
            },
        };

        let display_name = store
            .get(DISPLAY_NAME_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Self {
            total_claimed_amount,
            has_spun_before: read_flag(store, HAS_SPUN_KEY),
            display_name,
            channel_verified: read_flag(store, CHANNEL_VERIFIED_KEY),
        }
    }

    /// Writes the fields a finished spin can change.
    pub fn persist_spin<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        store.set(TOTAL_CLAIMED_KEY, &self.total_claimed_amount.to_string())?;
        write_flag(store, HAS_SPUN_KEY, self.has_spun_before)
    }

    pub fn persist_profile<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
    ) -> Result<(), StorageError> {
        match &self.display_name {
            Some(name) => store.set(DISPLAY_NAME_KEY, name)?,
            None => store.remove(DISPLAY_NAME_KEY)?,
        }
        write_flag(store, CHANNEL_VERIFIED_KEY, self.channel_verified)
    }
}
