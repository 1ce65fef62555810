use std::fmt;

use serde::{Deserialize, Serialize};

/// ACA metal tier, plus the HDHP pseudo-tier used for HSA-qualified plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetalTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    #[serde(rename = "HDHP")]
    Hdhp,
}

impl MetalTier {
    pub const ALL: [MetalTier; 5] = [
        MetalTier::Bronze,
        MetalTier::Silver,
        MetalTier::Gold,
        MetalTier::Platinum,
        MetalTier::Hdhp,
    ];
}

impl fmt::Display for MetalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetalTier::Bronze => "Bronze",
            MetalTier::Silver => "Silver",
            MetalTier::Gold => "Gold",
            MetalTier::Platinum => "Platinum",
            MetalTier::Hdhp => "HDHP",
        };
        f.write_str(s)
    }
}

/// Network / managed-care structure of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanType {
    Hmo,
    Ppo,
    Epo,
    Pos,
    Hdhp,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanType::Hmo => "HMO",
            PlanType::Ppo => "PPO",
            PlanType::Epo => "EPO",
            PlanType::Pos => "POS",
            PlanType::Hdhp => "HDHP",
        };
        f.write_str(s)
    }
}

/// Which plan is cheaper at one point of a cost curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheaperPlan {
    #[serde(rename = "1")]
    Plan1,
    #[serde(rename = "2")]
    Plan2,
    #[serde(rename = "equal")]
    Equal,
}

/// Which plan wins on one side of a break-even point. The `Always*`
/// variants mean no crossover exists in the searched domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanVerdict {
    #[serde(rename = "1")]
    Plan1,
    #[serde(rename = "2")]
    Plan2,
    #[serde(rename = "always-1")]
    Always1,
    #[serde(rename = "always-2")]
    Always2,
}

/// Outcome of a head-to-head between plan A and plan B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    /// Lower value wins.
    pub fn lower(a: f64, b: f64) -> Self {
        if a < b {
            Winner::A
        } else if b < a {
            Winner::B
        } else {
            Winner::Tie
        }
    }

    /// Higher value wins.
    pub fn higher(a: f64, b: f64) -> Self {
        Winner::lower(b, a)
    }

    /// `true` beats `false`.
    pub fn flag(a: bool, b: bool) -> Self {
        match (a, b) {
            (true, false) => Winner::A,
            (false, true) => Winner::B,
            _ => Winner::Tie,
        }
    }
}

/// Render a currency amount as whole dollars with thousands separators,
/// e.g. `12345.6` → `"$12,346"`, `-50.0` → `"-$50"`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative { format!("-${grouped}") } else { format!("${grouped}") }
}
