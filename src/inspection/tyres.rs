//! Tread depth and sidewall condition for each wheel and the spare.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

/// UK legal minimum tread depth.
const LEGAL_TREAD_MM: f32 = 1.6;
const ADVISORY_TREAD_MM: f32 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TyreReading {
  pub tread_mm: Option<f32>,
  pub pressure_ok: bool,
  pub sidewall_damage: bool,
  pub uneven_wear: bool,
}

impl Default for TyreReading {
  fn default() -> Self {
    Self {
      tread_mm: None,
      pressure_ok: true,
      sidewall_damage: false,
      uneven_wear: false,
    }
  }
}

impl TyreReading {
  fn tread_below(&self, limit: f32) -> bool {
    self.tread_mm.is_some_and(|mm| mm < limit)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TyreCheck {
  pub front_left: TyreReading,
  pub front_right: TyreReading,
  pub rear_left: TyreReading,
  pub rear_right: TyreReading,
  pub spare: Option<TyreReading>,
}

impl TyreCheck {
  fn road_wheels(&self) -> [&TyreReading; 4] {
    [
      &self.front_left,
      &self.front_right,
      &self.rear_left,
      &self.rear_right,
    ]
  }

  fn any_wheel(&self, f: impl Fn(&TyreReading) -> bool) -> bool {
    self.road_wheels().into_iter().any(f)
  }

  pub fn status(&self) -> Status {
    TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    TABLE.assess(self)
  }
}

const TABLE: DecisionTable<TyreCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "tread below legal limit",
      applies: |t: &TyreCheck| t.any_wheel(|w| w.tread_below(LEGAL_TREAD_MM)),
    },
    Rule {
      reason: "sidewall damage",
      applies: |t: &TyreCheck| t.any_wheel(|w| w.sidewall_damage),
    },
  ],
  advisory: &[
    Rule {
      reason: "tread below 3mm",
      applies: |t: &TyreCheck| t.any_wheel(|w| w.tread_below(ADVISORY_TREAD_MM)),
    },
    Rule {
      reason: "pressures incorrect",
      applies: |t: &TyreCheck| t.any_wheel(|w| !w.pressure_ok),
    },
    Rule {
      reason: "uneven wear, check alignment",
      applies: |t: &TyreCheck| t.any_wheel(|w| w.uneven_wear),
    },
    Rule {
      reason: "spare tyre not roadworthy",
      applies: |t: &TyreCheck| {
        t.spare
          .as_ref()
          .is_some_and(|s| s.sidewall_damage || s.tread_below(LEGAL_TREAD_MM))
      },
    },
  ],
};

#[cfg(test)]
mod tests {
  use super::*;

  fn with_tread(mm: f32) -> TyreReading {
    TyreReading {
      tread_mm: Some(mm),
      ..Default::default()
    }
  }

  fn all_wheels(mm: f32) -> TyreCheck {
    TyreCheck {
      front_left: with_tread(mm),
      front_right: with_tread(mm),
      rear_left: with_tread(mm),
      rear_right: with_tread(mm),
      spare: None,
    }
  }

  #[test]
  fn test_healthy_tyres_pass() {
    assert_eq!(all_wheels(6.0).status(), Status::Pass);
  }

  #[test]
  fn test_single_illegal_tyre_fails() {
    let check = TyreCheck {
      rear_right: with_tread(1.2),
      ..all_wheels(6.0)
    };
    assert_eq!(check.status(), Status::Fail);
  }

  #[test]
  fn test_low_tread_is_advisory() {
    let check = TyreCheck {
      front_left: with_tread(2.4),
      ..all_wheels(6.0)
    };
    let assessment = check.assess();
    assert_eq!(assessment.status, Status::Advisory);
    assert_eq!(assessment.reasons, vec!["tread below 3mm"]);
  }

  #[test]
  fn test_damaged_spare_only_advises() {
    let check = TyreCheck {
      spare: Some(TyreReading {
        sidewall_damage: true,
        ..Default::default()
      }),
      ..all_wheels(6.0)
    };
    assert_eq!(check.status(), Status::Advisory);
  }
}
