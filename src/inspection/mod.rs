//! Inspection forms and their status rules.
//!
//! Every form derives `pass | advisory | fail` from its own fields through a
//! [`DecisionTable`]: fail conditions are checked first, then advisory ones,
//! and anything else passes. Evaluation is a pure function of the fields.

mod air_con;
mod brakes;
mod exhaust;
mod seasonal;
mod service;
mod tyres;

pub use air_con::{AirConCheck, CabinFilter, GasLevel};
pub use brakes::{BrakeCheck, BrakeFluid, DiscCondition};
pub use exhaust::{Emissions, ExhaustCheck, ExhaustCondition};
pub use seasonal::{CoolantLevel, SummerCheck, WiperBlades, WinterCheck};
pub use service::{OilCondition, OilLevel, ServiceCheck};
pub use tyres::{TyreCheck, TyreReading};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Outcome of one inspection category. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Pass,
  Advisory,
  Fail,
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Status::Pass => "pass",
      Status::Advisory => "advisory",
      Status::Fail => "fail",
    })
  }
}

/// A named condition over a form's fields.
pub struct Rule<T> {
  pub reason: &'static str,
  pub applies: fn(&T) -> bool,
}

/// Ordered fail and advisory conditions for one form.
pub struct DecisionTable<T: 'static> {
  pub fail: &'static [Rule<T>],
  pub advisory: &'static [Rule<T>],
}

impl<T> DecisionTable<T> {
  /// Status only; stops at the first matching condition.
  pub fn status(&self, fields: &T) -> Status {
    if self.fail.iter().any(|rule| (rule.applies)(fields)) {
      Status::Fail
    } else if self.advisory.iter().any(|rule| (rule.applies)(fields)) {
      Status::Advisory
    } else {
      Status::Pass
    }
  }

  /// Status plus every reason that matched at the deciding level.
  pub fn assess(&self, fields: &T) -> Assessment {
    let fails = matching(self.fail, fields);
    if !fails.is_empty() {
      return Assessment {
        status: Status::Fail,
        reasons: fails,
      };
    }

    let advisories = matching(self.advisory, fields);
    if !advisories.is_empty() {
      return Assessment {
        status: Status::Advisory,
        reasons: advisories,
      };
    }

    Assessment::pass()
  }
}

fn matching<T>(rules: &[Rule<T>], fields: &T) -> Vec<&'static str> {
  rules
    .iter()
    .filter(|rule| (rule.applies)(fields))
    .map(|rule| rule.reason)
    .collect()
}

/// Result of evaluating a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
  pub status: Status,
  pub reasons: Vec<&'static str>,
}

impl Assessment {
  pub fn pass() -> Self {
    Self {
      status: Status::Pass,
      reasons: Vec::new(),
    }
  }
}

/// Inspection category, one per form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Brakes,
  Exhaust,
  Tyres,
  AirCon,
  Summer,
  Winter,
  Service,
}

impl Category {
  pub const ALL: [Category; 7] = [
    Category::Brakes,
    Category::Exhaust,
    Category::Tyres,
    Category::AirCon,
    Category::Summer,
    Category::Winter,
    Category::Service,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Category::Brakes => "brakes",
      Category::Exhaust => "exhaust",
      Category::Tyres => "tyres",
      Category::AirCon => "air_con",
      Category::Summer => "summer",
      Category::Winter => "winter",
      Category::Service => "service",
    }
  }

  /// Decode a form of this category from JSON and assess it.
  pub fn assess_json(self, fields: Value) -> Result<Assessment, serde_json::Error> {
    Ok(match self {
      Category::Brakes => serde_json::from_value::<BrakeCheck>(fields)?.assess(),
      Category::Exhaust => serde_json::from_value::<ExhaustCheck>(fields)?.assess(),
      Category::Tyres => serde_json::from_value::<TyreCheck>(fields)?.assess(),
      Category::AirCon => serde_json::from_value::<AirConCheck>(fields)?.assess(),
      Category::Summer => serde_json::from_value::<SummerCheck>(fields)?.assess(),
      Category::Winter => serde_json::from_value::<WinterCheck>(fields)?.assess(),
      Category::Service => serde_json::from_value::<ServiceCheck>(fields)?.assess(),
    })
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Category {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase().replace('-', "_");
    match normalized.as_str() {
      "ac" | "aircon" => return Ok(Category::AirCon),
      "tires" => return Ok(Category::Tyres),
      _ => {}
    }
    Category::ALL
      .into_iter()
      .find(|c| c.name() == normalized)
      .ok_or_else(|| format!("unknown inspection category '{}'", s))
  }
}

/// Per-category results for a whole health check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VhcSummary {
  pub categories: BTreeMap<Category, Assessment>,
}

impl VhcSummary {
  pub fn record(&mut self, category: Category, assessment: Assessment) {
    self.categories.insert(category, assessment);
  }

  pub fn status(&self, category: Category) -> Option<Status> {
    self.categories.get(&category).map(|a| a.status)
  }

  /// Worst status across recorded categories; pass when nothing is recorded.
  pub fn overall(&self) -> Status {
    self
      .categories
      .values()
      .map(|a| a.status)
      .max()
      .unwrap_or(Status::Pass)
  }

  /// Categories at the given status, e.g. everything that needs attention now.
  pub fn with_status(&self, status: Status) -> Vec<Category> {
    self
      .categories
      .iter()
      .filter(|(_, a)| a.status == status)
      .map(|(c, _)| *c)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  struct Gauge {
    reading: u32,
  }

  const GAUGE_TABLE: DecisionTable<Gauge> = DecisionTable {
    fail: &[Rule {
      reason: "reading over 90",
      applies: |g: &Gauge| g.reading > 90,
    }],
    advisory: &[
      Rule {
        reason: "reading over 50",
        applies: |g: &Gauge| g.reading > 50,
      },
      Rule {
        reason: "reading over 70",
        applies: |g: &Gauge| g.reading > 70,
      },
    ],
  };

  #[test]
  fn test_fail_beats_advisory() {
    let gauge = Gauge { reading: 95 };
    assert_eq!(GAUGE_TABLE.status(&gauge), Status::Fail);
    assert_eq!(GAUGE_TABLE.assess(&gauge).reasons, vec!["reading over 90"]);
  }

  #[test]
  fn test_advisory_collects_all_matching_reasons() {
    let assessment = GAUGE_TABLE.assess(&Gauge { reading: 75 });
    assert_eq!(assessment.status, Status::Advisory);
    assert_eq!(assessment.reasons, vec!["reading over 50", "reading over 70"]);
  }

  #[test]
  fn test_default_is_pass() {
    assert_eq!(GAUGE_TABLE.assess(&Gauge { reading: 10 }), Assessment::pass());
  }

  #[test]
  fn test_status_ordering() {
    assert!(Status::Fail > Status::Advisory);
    assert!(Status::Advisory > Status::Pass);
  }

  #[test]
  fn test_summary_overall_is_worst() {
    let mut summary = VhcSummary::default();
    assert_eq!(summary.overall(), Status::Pass);

    summary.record(Category::Brakes, Assessment::pass());
    summary.record(
      Category::Tyres,
      Assessment {
        status: Status::Advisory,
        reasons: vec!["tread below 3mm"],
      },
    );
    assert_eq!(summary.overall(), Status::Advisory);
    assert_eq!(summary.with_status(Status::Advisory), vec![Category::Tyres]);
  }

  #[test]
  fn test_category_parse_aliases() {
    assert_eq!("air-con".parse::<Category>(), Ok(Category::AirCon));
    assert_eq!("AC".parse::<Category>(), Ok(Category::AirCon));
    assert_eq!("tires".parse::<Category>(), Ok(Category::Tyres));
    assert!("wheels".parse::<Category>().is_err());
  }

  #[test]
  fn test_assess_json_dispatches_by_category() {
    let assessment = Category::Service
      .assess_json(json!({"oil_level": "below_min"}))
      .unwrap();
    assert_eq!(assessment.status, Status::Fail);

    assert!(Category::Brakes.assess_json(json!({"fluid": "purple"})).is_err());
  }
}
