//! Device settings lookup.
//!
//! The settings store is owned by someone else; this module only reads from
//! it. A lookup returns every record filed under an identifier: an empty
//! `Vec` means the device is not registered, one element is the normal case.

mod file;

use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};

pub use file::FileSettingsStore;

/// One registered device.
///
/// `host` is an ordered pair: the address to probe and the HTTP status the
/// device answers with when healthy.
/// ```toml
/// host = ["10.0.0.5", 200]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsRecord {
    pub host: (String, u16),
}

impl SettingsRecord {
    #[cfg(test)]
    pub fn new(address: impl Into<String>, expected_status: u16) -> Self {
        Self {
            host: (address.into(), expected_status),
        }
    }

    pub fn address(&self) -> &str {
        &self.host.0
    }

    pub fn expected_status(&self) -> u16 {
        self.host.1
    }
}

/// Read-only key-value lookup of device records.
pub trait SettingsStore: Send + Sync {
    /// All records stored under `id`; empty when the device is unknown.
    ///
    /// # Errors
    /// Returns an error when the store itself cannot be read.
    fn query(&self, id: &str) -> impl Future<Output = anyhow::Result<Vec<SettingsRecord>>> + Send;
}

/// Store backed by an in-process map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemorySettingsStore {
    #[serde(default)]
    devices: HashMap<String, SettingsRecord>,
}

impl MemorySettingsStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_device(mut self, id: impl Into<String>, record: SettingsRecord) -> Self {
        self.devices.insert(id.into(), record);
        self
    }

    pub fn get(&self, id: &str) -> Option<&SettingsRecord> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn query(&self, id: &str) -> anyhow::Result<Vec<SettingsRecord>> {
        Ok(self.get(id).cloned().into_iter().collect())
    }
}
