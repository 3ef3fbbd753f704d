//! Offline-debuggable dumps of faulted passes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything needed to replay a faulted pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultDump {
    pub error: String,
    /// Phase running when the fault happened, if any.
    pub phase: Option<String>,
    pub input: String,
}

impl FaultDump {
    /// Write the dump as `fault-<uuid>.json` under `directory`.
    pub fn write_to(&self, directory: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(directory)?;
        let path = directory.join(format!("fault-{}.json", Uuid::new_v4()));
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn read_from(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(io::Error::other)
    }
}
