//! Exhaust condition, mountings and emissions.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustCondition {
  #[default]
  Good,
  Corroded,
  Blowing,
  Damaged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emissions {
  #[default]
  Pass,
  Borderline,
  Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustCheck {
  pub condition: ExhaustCondition,
  pub mountings_secure: bool,
  pub emissions: Emissions,
  pub smoke_visible: bool,
}

impl Default for ExhaustCheck {
  fn default() -> Self {
    Self {
      condition: ExhaustCondition::Good,
      mountings_secure: true,
      emissions: Emissions::Pass,
      smoke_visible: false,
    }
  }
}

const TABLE: DecisionTable<ExhaustCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "exhaust blowing",
      applies: |e: &ExhaustCheck| e.condition == ExhaustCondition::Blowing,
    },
    Rule {
      reason: "exhaust damaged",
      applies: |e: &ExhaustCheck| e.condition == ExhaustCondition::Damaged,
    },
    Rule {
      reason: "mountings insecure",
      applies: |e: &ExhaustCheck| !e.mountings_secure,
    },
    Rule {
      reason: "emissions over limit",
      applies: |e: &ExhaustCheck| e.emissions == Emissions::Fail,
    },
  ],
  advisory: &[
    Rule {
      reason: "exhaust corroded",
      applies: |e: &ExhaustCheck| e.condition == ExhaustCondition::Corroded,
    },
    Rule {
      reason: "emissions borderline",
      applies: |e: &ExhaustCheck| e.emissions == Emissions::Borderline,
    },
    Rule {
      reason: "visible smoke",
      applies: |e: &ExhaustCheck| e.smoke_visible,
    },
  ],
};

impl ExhaustCheck {
  pub fn status(&self) -> Status {
    TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    TABLE.assess(self)
  }
}
