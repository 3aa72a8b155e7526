//! Summer and winter readiness checks.

use serde::{Deserialize, Serialize};

use super::{Assessment, DecisionTable, Rule, Status};

/// Coolant must protect to at least this temperature (°C).
const ANTIFREEZE_FAIL_C: i32 = -10;
const ANTIFREEZE_ADVISORY_C: i32 = -25;

const BATTERY_FAIL_PCT: u8 = 40;
const BATTERY_ADVISORY_PCT: u8 = 70;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolantLevel {
  #[default]
  Ok,
  Low,
  Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiperBlades {
  #[default]
  Good,
  Smearing,
  Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummerCheck {
  pub coolant: CoolantLevel,
  pub wiper_blades: WiperBlades,
  pub washer_fluid_ok: bool,
  pub air_con_working: bool,
}

impl Default for SummerCheck {
  fn default() -> Self {
    Self {
      coolant: CoolantLevel::Ok,
      wiper_blades: WiperBlades::Good,
      washer_fluid_ok: true,
      air_con_working: true,
    }
  }
}

const SUMMER_TABLE: DecisionTable<SummerCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "coolant empty",
      applies: |s: &SummerCheck| s.coolant == CoolantLevel::Empty,
    },
    Rule {
      reason: "wiper blades split",
      applies: |s: &SummerCheck| s.wiper_blades == WiperBlades::Split,
    },
  ],
  advisory: &[
    Rule {
      reason: "coolant low",
      applies: |s: &SummerCheck| s.coolant == CoolantLevel::Low,
    },
    Rule {
      reason: "wiper blades smearing",
      applies: |s: &SummerCheck| s.wiper_blades == WiperBlades::Smearing,
    },
    Rule {
      reason: "washer fluid low",
      applies: |s: &SummerCheck| !s.washer_fluid_ok,
    },
    Rule {
      reason: "air con not working",
      applies: |s: &SummerCheck| !s.air_con_working,
    },
  ],
};

impl SummerCheck {
  pub fn status(&self) -> Status {
    SUMMER_TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    SUMMER_TABLE.assess(self)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinterCheck {
  /// Freezing point of the coolant mix, e.g. -30
  pub antifreeze_protection_c: Option<i32>,
  pub battery_health_pct: Option<u8>,
  pub lights_working: bool,
  pub wiper_blades: WiperBlades,
}

impl Default for WinterCheck {
  fn default() -> Self {
    Self {
      antifreeze_protection_c: None,
      battery_health_pct: None,
      lights_working: true,
      wiper_blades: WiperBlades::Good,
    }
  }
}

fn antifreeze_above(w: &WinterCheck, limit: i32) -> bool {
  w.antifreeze_protection_c.is_some_and(|c| c > limit)
}

fn battery_below(w: &WinterCheck, limit: u8) -> bool {
  w.battery_health_pct.is_some_and(|pct| pct < limit)
}

const WINTER_TABLE: DecisionTable<WinterCheck> = DecisionTable {
  fail: &[
    Rule {
      reason: "antifreeze protection inadequate",
      applies: |w: &WinterCheck| antifreeze_above(w, ANTIFREEZE_FAIL_C),
    },
    Rule {
      reason: "battery failing",
      applies: |w: &WinterCheck| battery_below(w, BATTERY_FAIL_PCT),
    },
    Rule {
      reason: "lights not working",
      applies: |w: &WinterCheck| !w.lights_working,
    },
    Rule {
      reason: "wiper blades split",
      applies: |w: &WinterCheck| w.wiper_blades == WiperBlades::Split,
    },
  ],
  advisory: &[
    Rule {
      reason: "antifreeze protection weak",
      applies: |w: &WinterCheck| antifreeze_above(w, ANTIFREEZE_ADVISORY_C),
    },
    Rule {
      reason: "battery weak",
      applies: |w: &WinterCheck| battery_below(w, BATTERY_ADVISORY_PCT),
    },
    Rule {
      reason: "wiper blades smearing",
      applies: |w: &WinterCheck| w.wiper_blades == WiperBlades::Smearing,
    },
  ],
};

impl WinterCheck {
  pub fn status(&self) -> Status {
    WINTER_TABLE.status(self)
  }

  pub fn assess(&self) -> Assessment {
    WINTER_TABLE.assess(self)
  }
}
