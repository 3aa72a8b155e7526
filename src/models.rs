//! Domain records mirrored in the local cache, and the pending-operation queue entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::cache::{Cacheable, Partition};
use crate::inspection::{
  AirConCheck, BrakeCheck, Category, ExhaustCheck, ServiceCheck, SummerCheck, TyreCheck,
  VhcSummary, WinterCheck,
};

// ============================================================================
// HTTP verbs and operation kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Post,
  Put,
  Patch,
  Delete,
}

impl Method {
  pub fn as_str(self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Patch => "PATCH",
      Method::Delete => "DELETE",
    }
  }

  /// Reads are cached; everything else is queued when offline.
  pub fn is_read(self) -> bool {
    matches!(self, Method::Get)
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for Method {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().as_str() {
      "GET" => Ok(Method::Get),
      "POST" => Ok(Method::Post),
      "PUT" => Ok(Method::Put),
      "PATCH" => Ok(Method::Patch),
      "DELETE" => Ok(Method::Delete),
      other => Err(format!("unsupported HTTP method '{}'", other)),
    }
  }
}

/// What a queued mutation does, derived from its URL and verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
  CreateJob,
  UpdateJob,
  CreateVhc,
  UpdateVhc,
  CreateFitFinish,
  UpdateFitFinish,
  Unknown,
}

impl OperationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      OperationKind::CreateJob => "CREATE_JOB",
      OperationKind::UpdateJob => "UPDATE_JOB",
      OperationKind::CreateVhc => "CREATE_VHC",
      OperationKind::UpdateVhc => "UPDATE_VHC",
      OperationKind::CreateFitFinish => "CREATE_FIT_FINISH",
      OperationKind::UpdateFitFinish => "UPDATE_FIT_FINISH",
      OperationKind::Unknown => "UNKNOWN",
    }
  }
}

impl fmt::Display for OperationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

// ============================================================================
// Pending operations
// ============================================================================

/// A mutation captured while offline, replayable without further context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
  pub id: i64,
  #[serde(rename = "type")]
  pub kind: OperationKind,
  pub payload: Option<Value>,
  pub endpoint: String,
  pub method: Method,
  /// Enqueue time
  pub timestamp: DateTime<Utc>,
  /// Failed replay attempts so far
  #[serde(default)]
  pub attempts: u32,
  #[serde(default)]
  pub last_error: Option<String>,
}

/// A pending operation before the store has assigned its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingOperation {
  pub kind: OperationKind,
  pub payload: Option<Value>,
  pub endpoint: String,
  pub method: Method,
}

impl NewPendingOperation {
  pub fn into_operation(self, id: i64, timestamp: DateTime<Utc>) -> PendingOperation {
    PendingOperation {
      id,
      kind: self.kind,
      payload: self.payload,
      endpoint: self.endpoint,
      method: self.method,
      timestamp,
      attempts: 0,
      last_error: None,
    }
  }
}

// ============================================================================
// Cached entities
// ============================================================================

/// A workshop job for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub vrm: String,
  #[serde(default)]
  pub status: String,
  #[serde(default, alias = "customerId")]
  pub customer_id: Option<String>,
  /// Technician owning the job
  #[serde(default, alias = "userId")]
  pub user_id: Option<String>,
  /// Fields the client does not model, kept so a save does not drop them.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Inspection results for a job, one optional form per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VhcRecord {
  #[serde(alias = "jobId")]
  pub job_id: String,
  #[serde(default)]
  pub brakes: Option<BrakeCheck>,
  #[serde(default)]
  pub exhaust: Option<ExhaustCheck>,
  #[serde(default)]
  pub tyres: Option<TyreCheck>,
  #[serde(default, alias = "airCon")]
  pub air_con: Option<AirConCheck>,
  #[serde(default)]
  pub summer: Option<SummerCheck>,
  #[serde(default)]
  pub winter: Option<WinterCheck>,
  #[serde(default)]
  pub service: Option<ServiceCheck>,
  #[serde(default)]
  pub notes: Option<String>,
}

impl VhcRecord {
  /// Per-category statuses for every completed form.
  pub fn summary(&self) -> VhcSummary {
    let mut summary = VhcSummary::default();
    if let Some(form) = &self.brakes {
      summary.record(Category::Brakes, form.assess());
    }
    if let Some(form) = &self.exhaust {
      summary.record(Category::Exhaust, form.assess());
    }
    if let Some(form) = &self.tyres {
      summary.record(Category::Tyres, form.assess());
    }
    if let Some(form) = &self.air_con {
      summary.record(Category::AirCon, form.assess());
    }
    if let Some(form) = &self.summer {
      summary.record(Category::Summer, form.assess());
    }
    if let Some(form) = &self.winter {
      summary.record(Category::Winter, form.assess());
    }
    if let Some(form) = &self.service {
      summary.record(Category::Service, form.assess());
    }
    summary
  }
}

/// Cosmetic fit-and-finish notes taken alongside the VHC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFinishRecord {
  #[serde(alias = "jobId")]
  pub job_id: String,
  #[serde(default)]
  pub bodywork: Option<String>,
  #[serde(default)]
  pub interior: Option<String>,
  #[serde(default)]
  pub photos: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
  pub vrm: String,
  #[serde(default)]
  pub make: Option<String>,
  #[serde(default)]
  pub model: Option<String>,
  #[serde(default)]
  pub year: Option<u16>,
  #[serde(default)]
  pub vin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
}

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Job {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn partition() -> Partition {
    Partition::Jobs
  }
}

impl Cacheable for VhcRecord {
  fn cache_key(&self) -> String {
    self.job_id.clone()
  }

  fn partition() -> Partition {
    Partition::VhcRecords
  }
}

impl Cacheable for FitFinishRecord {
  fn cache_key(&self) -> String {
    self.job_id.clone()
  }

  fn partition() -> Partition {
    Partition::FitFinishRecords
  }
}

impl Cacheable for Vehicle {
  fn cache_key(&self) -> String {
    self.vrm.clone()
  }

  fn partition() -> Partition {
    Partition::Vehicles
  }
}

impl Cacheable for Customer {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn partition() -> Partition {
    Partition::Customers
  }
}

impl Cacheable for UserProfile {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn partition() -> Partition {
    Partition::UserProfile
  }
}

impl Cacheable for PendingOperation {
  fn cache_key(&self) -> String {
    self.id.to_string()
  }

  fn partition() -> Partition {
    Partition::PendingOperations
  }
}
