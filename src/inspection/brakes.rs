//! Brake pads, discs, fluid and handbrake.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

/// Minimum pad thickness before the pads must be replaced.
const PAD_FAIL_MM: f32 = 3.0;
/// Pads below this are noted for the customer.
const PAD_ADVISORY_MM: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscCondition {
  #[default]
  Good,
  Lipped,
  Scored,
  Corroded,
  Replace,
}

impl DiscCondition {
  fn is_worn(self) -> bool {
    matches!(
      self,
      DiscCondition::Lipped | DiscCondition::Scored | DiscCondition::Corroded
    )
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrakeFluid {
  #[default]
  Ok,
  Low,
  /// Change interval reached
  Overdue,
  Contaminated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeCheck {
  pub front_pad_mm: Option<f32>,
  pub rear_pad_mm: Option<f32>,
  pub front_discs: DiscCondition,
  pub rear_discs: DiscCondition,
  pub fluid: BrakeFluid,
  pub handbrake_effective: bool,
}

impl Default for BrakeCheck {
  fn default() -> Self {
    Self {
      front_pad_mm: None,
      rear_pad_mm: None,
      front_discs: DiscCondition::Good,
      rear_discs: DiscCondition::Good,
      fluid: BrakeFluid::Ok,
      handbrake_effective: true,
    }
  }
}

fn pad_below(pad: Option<f32>, limit: f32) -> bool {
  pad.is_some_and(|mm| mm < limit)
}

const TABLE: DecisionTable<BrakeCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "front pads below 3mm",
      applies: |b: &BrakeCheck| pad_below(b.front_pad_mm, PAD_FAIL_MM),
    },
    Rule {
      reason: "rear pads below 3mm",
      applies: |b: &BrakeCheck| pad_below(b.rear_pad_mm, PAD_FAIL_MM),
    },
    Rule {
      reason: "front discs need replacing",
      applies: |b: &BrakeCheck| b.front_discs == DiscCondition::Replace,
    },
    Rule {
      reason: "rear discs need replacing",
      applies: |b: &BrakeCheck| b.rear_discs == DiscCondition::Replace,
    },
    Rule {
      reason: "brake fluid contaminated",
      applies: |b: &BrakeCheck| b.fluid == BrakeFluid::Contaminated,
    },
    Rule {
      reason: "handbrake ineffective",
      applies: |b: &BrakeCheck| !b.handbrake_effective,
    },
  ],
  advisory: &[
    Rule {
      reason: "front pads below 5mm",
      applies: |b: &BrakeCheck| pad_below(b.front_pad_mm, PAD_ADVISORY_MM),
    },
    Rule {
      reason: "rear pads below 5mm",
      applies: |b: &BrakeCheck| pad_below(b.rear_pad_mm, PAD_ADVISORY_MM),
    },
    Rule {
      reason: "front discs worn",
      applies: |b: &BrakeCheck| b.front_discs.is_worn(),
    },
    Rule {
      reason: "rear discs worn",
      applies: |b: &BrakeCheck| b.rear_discs.is_worn(),
    },
    Rule {
      reason: "brake fluid low or due for change",
      applies: |b: &BrakeCheck| matches!(b.fluid, BrakeFluid::Low | BrakeFluid::Overdue),
    },
  ],
};

impl BrakeCheck {
  pub fn status(&self) -> Status {
    TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    TABLE.assess(self)
  }
}
