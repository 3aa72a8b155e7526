//! Named partitions of the local store, one per entity category.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A secondary index declared on a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
  pub name: &'static str,
  /// Candidate field names, first present wins (snake_case then camelCase).
  pub fields: &'static [&'static str],
}

const JOB_INDEXES: &[IndexDef] = &[
  IndexDef {
    name: "by_user",
    fields: &["user_id", "userId"],
  },
  IndexDef {
    name: "by_status",
    fields: &["status"],
  },
  IndexDef {
    name: "by_vrm",
    fields: &["vrm"],
  },
];

const PENDING_INDEXES: &[IndexDef] = &[IndexDef {
  name: "by_kind",
  fields: &["type"],
}];

/// Entity category stored in its own partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
  Jobs,
  PendingOperations,
  VhcRecords,
  FitFinishRecords,
  Vehicles,
  Customers,
  UserProfile,
}

impl Partition {
  pub const ALL: [Partition; 7] = [
    Partition::Jobs,
    Partition::PendingOperations,
    Partition::VhcRecords,
    Partition::FitFinishRecords,
    Partition::Vehicles,
    Partition::Customers,
    Partition::UserProfile,
  ];

  /// Stable name used as the storage discriminator.
  pub fn name(self) -> &'static str {
    match self {
      Partition::Jobs => "jobs",
      Partition::PendingOperations => "pending_operations",
      Partition::VhcRecords => "vhc_records",
      Partition::FitFinishRecords => "fit_finish_records",
      Partition::Vehicles => "vehicles",
      Partition::Customers => "customers",
      Partition::UserProfile => "user_profile",
    }
  }

  /// Field(s) holding the record's identity.
  pub fn key_fields(self) -> &'static [&'static str] {
    match self {
      Partition::Jobs
      | Partition::PendingOperations
      | Partition::Customers
      | Partition::UserProfile => &["id"],
      Partition::VhcRecords | Partition::FitFinishRecords => &["job_id", "jobId"],
      Partition::Vehicles => &["vrm"],
    }
  }

  pub fn indexes(self) -> &'static [IndexDef] {
    match self {
      Partition::Jobs => JOB_INDEXES,
      Partition::PendingOperations => PENDING_INDEXES,
      _ => &[],
    }
  }

  pub fn index(self, name: &str) -> Option<&'static IndexDef> {
    self.indexes().iter().find(|idx| idx.name == name)
  }

  /// Extract the record key, if the record carries one.
  pub fn key_of(self, record: &Value) -> Option<String> {
    field_value(record, self.key_fields())
  }

  /// Values of every declared index for this record, as `(index, value)` pairs.
  pub fn index_values(self, record: &Value) -> Vec<(&'static str, String)> {
    self
      .indexes()
      .iter()
      .filter_map(|idx| field_value(record, idx.fields).map(|v| (idx.name, v)))
      .collect()
  }
}

/// Stringify the first scalar field found. Objects, arrays and null are not keys.
fn field_value(record: &Value, fields: &[&str]) -> Option<String> {
  fields.iter().find_map(|field| match record.get(*field)? {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  })
}

impl fmt::Display for Partition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Partition {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase().replace('-', "_");
    Partition::ALL
      .into_iter()
      .find(|p| p.name() == normalized)
      .ok_or_else(|| {
        let names: Vec<_> = Partition::ALL.iter().map(|p| p.name()).collect();
        format!("unknown partition '{}' (expected one of: {})", s, names.join(", "))
      })
  }
}
