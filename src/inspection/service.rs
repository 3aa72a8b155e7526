//! Service status: oil, filters, warning lights and interval.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

/// Miles past the service interval before it counts as a failure.
const OVERDUE_FAIL_MILES: i32 = 3000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OilLevel {
  #[default]
  Ok,
  Low,
  BelowMin,
  Overfilled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OilCondition {
  #[default]
  Clean,
  Dirty,
  Sludged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCheck {
  pub oil_level: OilLevel,
  pub oil_condition: OilCondition,
  /// Miles past the due point; negative when not yet due
  pub miles_overdue: Option<i32>,
  pub warning_lights: bool,
  pub air_filter_dirty: bool,
}

fn overdue_by_more_than(s: &ServiceCheck, miles: i32) -> bool {
  s.miles_overdue.is_some_and(|m| m > miles)
}

const TABLE: DecisionTable<ServiceCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "oil below minimum",
      applies: |s: &ServiceCheck| s.oil_level == OilLevel::BelowMin,
    },
    Rule {
      reason: "oil sludged",
      applies: |s: &ServiceCheck| s.oil_condition == OilCondition::Sludged,
    },
    Rule {
      reason: "dashboard warning lights on",
      applies: |s: &ServiceCheck| s.warning_lights,
    },
    Rule {
      reason: "service significantly overdue",
      applies: |s: &ServiceCheck| overdue_by_more_than(s, OVERDUE_FAIL_MILES),
    },
  ],
  advisory: &[
    Rule {
      reason: "oil level incorrect",
      applies: |s: &ServiceCheck| matches!(s.oil_level, OilLevel::Low | OilLevel::Overfilled),
    },
    Rule {
      reason: "oil dirty",
      applies: |s: &ServiceCheck| s.oil_condition == OilCondition::Dirty,
    },
    Rule {
      reason: "service due",
      applies: |s: &ServiceCheck| overdue_by_more_than(s, 0),
    },
    Rule {
      reason: "air filter dirty",
      applies: |s: &ServiceCheck| s.air_filter_dirty,
    },
  ],
};

impl ServiceCheck {
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
  fn test_not_yet_due_passes() {
    let check = ServiceCheck {
      miles_overdue: Some(-1200),
      ..Default::default()
    };
    assert_eq!(check.status(), Status::Pass);
  }

  #[test]
  fn test_overdue_bands() {
    let due = ServiceCheck {
      miles_overdue: Some(500),
      ..Default::default()
    };
    assert_eq!(due.status(), Status::Advisory);

    let overdue = ServiceCheck {
      miles_overdue: Some(4200),
      ..Default::default()
    };
    assert_eq!(overdue.assess().reasons, vec!["service significantly overdue"]);
  }

  #[test]
  fn test_evaluation_is_repeatable() {
    let check = ServiceCheck {
      oil_condition: OilCondition::Dirty,
      ..Default::default()
    };
    assert_eq!(check.assess(), check.assess());
  }
}
