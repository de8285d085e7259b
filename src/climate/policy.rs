//! Threshold policy and the ordered rule table the control loop evaluates
//!
//! Rules are checked in ascending priority; the first whose predicate
//! holds decides the command. When no rule matches the reading is inside
//! the hysteresis band and the relay keeps its state.
//!
//! | priority | rule            | predicate                                  | action       |
//! |----------|-----------------|--------------------------------------------|--------------|
//! | 10       | `outdoor_heat`  | outdoor temperature > outside threshold    | on, cooling  |
//! | 20       | `indoor_cold`   | indoor temperature <= desired - hysteresis | on, heating  |
//! | 30       | `indoor_warm`   | indoor temperature > desired + hysteresis  | off, heating |

use crate::climate::state::HvacMode;
use crate::error::{ClimateError, Result};
use serde::{Deserialize, Serialize};

/// Setpoint configuration every decision is made against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Temperature to hold, in degrees Celsius
    pub desired_temperature: f64,
    /// Half-width of the dead band around `desired_temperature`
    pub hysteresis: f64,
    /// Outdoor temperature above which the relay runs in cooling mode.
    /// `None` disables the outdoor rule.
    pub outside_temperature_threshold: Option<f64>,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            desired_temperature: 19.0,
            hysteresis: 1.0,
            // 60 °F
            outside_temperature_threshold: Some(15.56),
        }
    }
}

impl ThresholdPolicy {
    pub fn validate(&self) -> Result<()> {
        if !self.desired_temperature.is_finite() {
            return Err(ClimateError::config("desired_temperature must be finite"));
        }
        if !self.hysteresis.is_finite() || self.hysteresis < 0.0 {
            return Err(ClimateError::config(
                "hysteresis must be a finite, non-negative number",
            ));
        }
        if let Some(threshold) = self.outside_temperature_threshold {
            if !threshold.is_finite() {
                return Err(ClimateError::config(
                    "outside_temperature_threshold must be finite",
                ));
            }
        }
        Ok(())
    }

    pub fn lower_bound(&self) -> f64 {
        self.desired_temperature - self.hysteresis
    }

    pub fn upper_bound(&self) -> f64 {
        self.desired_temperature + self.hysteresis
    }
}

/// Readings available to the rules in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyInputs {
    pub indoor_temperature: f64,
    /// Fresh outdoor temperature, `None` when not configured or the lookup failed
    pub outdoor_temperature: Option<f64>,
}

/// Relay command a rule asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub active: bool,
    /// Mode recorded with the command; `None` leaves the recorded mode alone
    pub mode: Option<HvacMode>,
}

impl RelayCommand {
    pub const fn heat() -> Self {
        Self {
            active: true,
            mode: Some(HvacMode::Heating),
        }
    }

    pub const fn cool() -> Self {
        Self {
            active: true,
            mode: Some(HvacMode::Cooling),
        }
    }

    pub const fn off() -> Self {
        Self {
            active: false,
            mode: Some(HvacMode::Heating),
        }
    }

    /// Manual command; does not touch the recorded mode
    pub const fn manual(active: bool) -> Self {
        Self { active, mode: None }
    }
}

pub type Predicate = fn(&PolicyInputs, &ThresholdPolicy) -> bool;

/// One row of the policy table
#[derive(Debug, Clone, Copy)]
pub struct PolicyRule {
    pub priority: u8,
    pub name: &'static str,
    pub predicate: Predicate,
    pub command: RelayCommand,
}

/// Ordered rule set, first match wins
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyTable {
    /// Build a table from arbitrary rules; they are sorted by priority.
    pub fn new(mut rules: Vec<PolicyRule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    /// Outdoor override, then heat below the band, then off above it.
    pub fn standard() -> Self {
        Self::new(vec![
            PolicyRule {
                priority: 10,
                name: "outdoor_heat",
                predicate: outdoor_above_threshold,
                command: RelayCommand::cool(),
            },
            PolicyRule {
                priority: 20,
                name: "indoor_cold",
                predicate: indoor_at_or_below_band,
                command: RelayCommand::heat(),
            },
            PolicyRule {
                priority: 30,
                name: "indoor_warm",
                predicate: indoor_above_band,
                command: RelayCommand::off(),
            },
        ])
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// First matching rule, or `None` inside the dead band
    pub fn evaluate(&self, inputs: &PolicyInputs, policy: &ThresholdPolicy) -> Option<&PolicyRule> {
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(inputs, policy))
    }
}

fn outdoor_above_threshold(inputs: &PolicyInputs, policy: &ThresholdPolicy) -> bool {
    match (inputs.outdoor_temperature, policy.outside_temperature_threshold) {
        (Some(outdoor), Some(threshold)) => outdoor > threshold,
        _ => false,
    }
}

fn indoor_at_or_below_band(inputs: &PolicyInputs, policy: &ThresholdPolicy) -> bool {
    inputs.indoor_temperature <= policy.lower_bound()
}

fn indoor_above_band(inputs: &PolicyInputs, policy: &ThresholdPolicy) -> bool {
    inputs.indoor_temperature > policy.upper_bound()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy {
            desired_temperature: 19.0,
            hysteresis: 1.0,
            outside_temperature_threshold: Some(15.56),
        }
    }

    fn decide(indoor: f64, outdoor: Option<f64>) -> Option<&'static str> {
        let table = PolicyTable::standard();
        let inputs = PolicyInputs {
            indoor_temperature: indoor,
            outdoor_temperature: outdoor,
        };
        table.evaluate(&inputs, &policy()).map(|rule| rule.name)
    }

    #[rstest]
    #[case(17.5, Some("indoor_cold"))]
    #[case(18.0, Some("indoor_cold"))]
    #[case(18.01, None)]
    #[case(19.2, None)]
    #[case(20.0, None)]
    #[case(20.5, Some("indoor_warm"))]
    fn test_indoor_decisions(#[case] indoor: f64, #[case] expected: Option<&str>) {
        assert_eq!(decide(indoor, None), expected);
    }

    #[rstest]
    #[case(10.0)]
    #[case(19.2)]
    #[case(30.0)]
    fn test_outdoor_heat_preempts_indoor(#[case] indoor: f64) {
        assert_eq!(decide(indoor, Some(25.0)), Some("outdoor_heat"));
    }

    #[test]
    fn test_outdoor_at_threshold_does_not_fire() {
        assert_eq!(decide(19.0, Some(15.56)), None);
    }

    #[test]
    fn test_outdoor_rule_disabled_without_threshold() {
        let table = PolicyTable::standard();
        let policy = ThresholdPolicy {
            outside_temperature_threshold: None,
            ..policy()
        };
        let inputs = PolicyInputs {
            indoor_temperature: 19.0,
            outdoor_temperature: Some(40.0),
        };

        assert!(table.evaluate(&inputs, &policy).is_none());
    }

    #[test]
    fn test_rules_are_ordered_by_priority() {
        let shuffled = PolicyTable::new(PolicyTable::standard().rules().iter().rev().copied().collect());
        let names: Vec<_> = shuffled.rules().iter().map(|r| r.name).collect();

        assert_eq!(names, ["outdoor_heat", "indoor_cold", "indoor_warm"]);
    }

    #[test]
    fn test_policy_scales_with_parameters() {
        let table = PolicyTable::standard();
        let policy = ThresholdPolicy {
            desired_temperature: 22.0,
            hysteresis: 0.5,
            outside_temperature_threshold: None,
        };
        let at = |t| PolicyInputs {
            indoor_temperature: t,
            outdoor_temperature: None,
        };

        assert_eq!(table.evaluate(&at(21.5), &policy).unwrap().command, RelayCommand::heat());
        assert!(table.evaluate(&at(22.4), &policy).is_none());
        assert_eq!(table.evaluate(&at(22.6), &policy).unwrap().command, RelayCommand::off());
    }

    #[rstest]
    #[case(f64::NAN, 1.0)]
    #[case(19.0, -0.5)]
    #[case(19.0, f64::INFINITY)]
    fn test_invalid_policy_rejected(#[case] desired: f64, #[case] hysteresis: f64) {
        let policy = ThresholdPolicy {
            desired_temperature: desired,
            hysteresis,
            outside_temperature_threshold: None,
        };
        assert!(policy.validate().is_err());
    }
}
