//! Air conditioning performance check.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

/// Centre vent temperatures (°C) at full cold.
const VENT_FAIL_C: f32 = 15.0;
const VENT_ADVISORY_C: f32 = 8.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasLevel {
  #[default]
  Ok,
  Low,
  Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinFilter {
  #[default]
  Clean,
  Dirty,
  Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirConCheck {
  pub vent_temp_c: Option<f32>,
  pub gas_level: GasLevel,
  pub compressor_engages: bool,
  pub odour: bool,
  pub cabin_filter: CabinFilter,
}

impl Default for AirConCheck {
  fn default() -> Self {
    Self {
      vent_temp_c: None,
      gas_level: GasLevel::Ok,
      compressor_engages: true,
      odour: false,
      cabin_filter: CabinFilter::Clean,
    }
  }
}

fn vent_above(check: &AirConCheck, limit: f32) -> bool {
  check.vent_temp_c.is_some_and(|t| t > limit)
}

const TABLE: DecisionTable<AirConCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "refrigerant empty",
      applies: |a: &AirConCheck| a.gas_level == GasLevel::Empty,
    },
    Rule {
      reason: "compressor not engaging",
      applies: |a: &AirConCheck| !a.compressor_engages,
    },
    Rule {
      reason: "not cooling",
      applies: |a: &AirConCheck| vent_above(a, VENT_FAIL_C),
    },
  ],
  advisory: &[
    Rule {
      reason: "refrigerant low",
      applies: |a: &AirConCheck| a.gas_level == GasLevel::Low,
    },
    Rule {
      reason: "cooling weak",
      applies: |a: &AirConCheck| vent_above(a, VENT_ADVISORY_C),
    },
    Rule {
      reason: "odour from vents",
      applies: |a: &AirConCheck| a.odour,
    },
    Rule {
      reason: "cabin filter needs replacing",
      applies: |a: &AirConCheck| a.cabin_filter != CabinFilter::Clean,
    },
  ],
};

impl AirConCheck {
  pub fn status(&self) -> Status {
    TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    TABLE.assess(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cold_vents_pass() {
    let check = AirConCheck {
      vent_temp_c: Some(5.5),
      ..Default::default()
    };
    assert_eq!(check.status(), Status::Pass);
  }

  #[test]
  fn test_weak_cooling_is_advisory() {
    let check = AirConCheck {
      vent_temp_c: Some(11.0),
      gas_level: GasLevel::Low,
      ..Default::default()
    };
    let assessment = check.assess();
    assert_eq!(assessment.status, Status::Advisory);
    assert_eq!(assessment.reasons, vec!["refrigerant low", "cooling weak"]);
  }

  #[test]
  fn test_empty_system_fails() {
    let check = AirConCheck {
      gas_level: GasLevel::Empty,
      ..Default::default()
    };
    assert_eq!(check.status(), Status::Fail);
  }
}
