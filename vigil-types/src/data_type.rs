//! The tag that classifies every syncable payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of state carried by a sync payload.
///
/// The server only ever sees this tag and ciphertext; everything else is
/// opaque. Wire representation is kebab-case (`"audit-logs"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    /// Append-only audit-event log entries.
    AuditLogs,
    /// User security settings (lock policy, screenshot protection, ...).
    SecuritySettings,
    /// Locally cached view of the account's device registry.
    DeviceRegistry,
    /// Metadata describing encrypted backups.
    BackupMetadata,
}

impl DataType {
    /// All data types, in a fixed order.
    pub const ALL: [DataType; 4] = [
        DataType::AuditLogs,
        DataType::SecuritySettings,
        DataType::DeviceRegistry,
        DataType::BackupMetadata,
    ];

    /// Wire/storage representation of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuditLogs => "audit-logs",
            Self::SecuritySettings => "security-settings",
            Self::DeviceRegistry => "device-registry",
            Self::BackupMetadata => "backup-metadata",
        }
    }

    /// Parses a tag from its wire representation.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "audit-logs" => Ok(Self::AuditLogs),
            "security-settings" => Ok(Self::SecuritySettings),
            "device-registry" => Ok(Self::DeviceRegistry),
            "backup-metadata" => Ok(Self::BackupMetadata),
            other => Err(crate::Error::UnknownDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
