use serde::{Deserialize, Serialize};

use crate::config::{HsaLimits, PolicyYearConfig};
use crate::error::{CoverageError, Result, check_currency, check_fraction};
use crate::types::{MetalTier, PlanType};

pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Per-service copays. A `None` copay means the service is paid through the
/// deductible / coinsurance pool instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Copays {
    pub primary_care: Option<f64>,
    pub specialist: Option<f64>,
    pub generic_drug: Option<f64>,
    pub emergency_room: Option<f64>,
}

/// Cost structure of one insurance plan.
///
/// Immutable once built. Every constructor validates its inputs, so a
/// `PlanDetails` in hand always has non-negative currency fields,
/// coinsurance in [0, 1] and `out_of_pocket_max >= deductible`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct PlanDetails {
    name: String,
    monthly_premium: f64,
    deductible: f64,
    coinsurance: f64,
    out_of_pocket_max: f64,
    metal_tier: Option<MetalTier>,
    plan_type: Option<PlanType>,
    post_subsidy_premium: Option<f64>,
    primary_care_copay: Option<f64>,
    specialist_copay: Option<f64>,
    generic_drug_copay: Option<f64>,
    emergency_room_copay: Option<f64>,
    hsa_eligible: Option<bool>,
    quality_rating: Option<f64>,
    national_network: Option<bool>,
}

impl PlanDetails {
    pub fn new(
        name: impl Into<String>,
        monthly_premium: f64,
        deductible: f64,
        coinsurance: f64,
        out_of_pocket_max: f64,
    ) -> Result<Self> {
        let monthly_premium = check_currency("monthly_premium", monthly_premium)?;
        let deductible = check_currency("deductible", deductible)?;
        let coinsurance = check_fraction("coinsurance", coinsurance)?;
        let out_of_pocket_max = check_currency("out_of_pocket_max", out_of_pocket_max)?;
        if out_of_pocket_max < deductible {
            return Err(CoverageError::InvalidPlanParameters {
                field: "out_of_pocket_max",
                reason: format!(
                    "must be at least the deductible ({deductible}), got {out_of_pocket_max}"
                ),
            });
        }
        Ok(PlanDetails {
            name: name.into(),
            monthly_premium,
            deductible,
            coinsurance,
            out_of_pocket_max,
            metal_tier: None,
            plan_type: None,
            post_subsidy_premium: None,
            primary_care_copay: None,
            specialist_copay: None,
            generic_drug_copay: None,
            emergency_room_copay: None,
            hsa_eligible: None,
            quality_rating: None,
            national_network: None,
        })
    }

    pub fn with_metal_tier(mut self, tier: MetalTier) -> Self {
        self.metal_tier = Some(tier);
        self
    }

    pub fn with_plan_type(mut self, plan_type: PlanType) -> Self {
        self.plan_type = Some(plan_type);
        self
    }

    pub fn with_post_subsidy_premium(mut self, premium: f64) -> Result<Self> {
        self.post_subsidy_premium = Some(check_currency("post_subsidy_premium", premium)?);
        Ok(self)
    }

    pub fn with_copays(mut self, copays: Copays) -> Result<Self> {
        let check = |field, v: Option<f64>| v.map(|x| check_currency(field, x)).transpose();
        self.primary_care_copay = check("primary_care_copay", copays.primary_care)?;
        self.specialist_copay = check("specialist_copay", copays.specialist)?;
        self.generic_drug_copay = check("generic_drug_copay", copays.generic_drug)?;
        self.emergency_room_copay = check("emergency_room_copay", copays.emergency_room)?;
        Ok(self)
    }

    pub fn with_hsa_eligible(mut self, eligible: bool) -> Self {
        self.hsa_eligible = Some(eligible);
        self
    }

    /// Star rating in [0, 5].
    pub fn with_quality_rating(mut self, rating: f64) -> Result<Self> {
        if !(0.0..=5.0).contains(&rating) {
            return Err(CoverageError::InvalidPlanParameters {
                field: "quality_rating",
                reason: format!("must lie in [0, 5], got {rating}"),
            });
        }
        self.quality_rating = Some(rating);
        Ok(self)
    }

    pub fn with_national_network(mut self, national: bool) -> Self {
        self.national_network = Some(national);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn monthly_premium(&self) -> f64 {
        self.monthly_premium
    }

    pub fn deductible(&self) -> f64 {
        self.deductible
    }

    pub fn coinsurance(&self) -> f64 {
        self.coinsurance
    }

    pub fn out_of_pocket_max(&self) -> f64 {
        self.out_of_pocket_max
    }

    pub fn metal_tier(&self) -> Option<MetalTier> {
        self.metal_tier
    }

    pub fn plan_type(&self) -> Option<PlanType> {
        self.plan_type
    }

    pub fn post_subsidy_premium(&self) -> Option<f64> {
        self.post_subsidy_premium
    }

    pub fn copays(&self) -> Copays {
        Copays {
            primary_care: self.primary_care_copay,
            specialist: self.specialist_copay,
            generic_drug: self.generic_drug_copay,
            emergency_room: self.emergency_room_copay,
        }
    }

    pub fn hsa_eligible(&self) -> Option<bool> {
        self.hsa_eligible
    }

    pub fn quality_rating(&self) -> Option<f64> {
        self.quality_rating
    }

    pub fn national_network(&self) -> Option<bool> {
        self.national_network
    }

    /// Premium the member actually pays each month (post-subsidy when known).
    pub fn effective_monthly_premium(&self) -> f64 {
        self.post_subsidy_premium.unwrap_or(self.monthly_premium)
    }

    pub fn annual_premium(&self) -> f64 {
        self.monthly_premium * MONTHS_PER_YEAR
    }

    /// Member cost-share for `medical_expense` of claims, capped at the
    /// out-of-pocket maximum. Negative expenses are treated as zero.
    pub fn out_of_pocket(&self, medical_expense: f64) -> f64 {
        let expense = medical_expense.max(0.0);
        let raw = if expense <= self.deductible {
            expense
        } else {
            self.deductible + (expense - self.deductible) * self.coinsurance
        };
        raw.min(self.out_of_pocket_max)
    }

    /// Annual premium plus out-of-pocket cost at `medical_expense`.
    pub fn annual_cost(&self, medical_expense: f64) -> f64 {
        self.annual_premium() + self.out_of_pocket(medical_expense)
    }

    /// Highest total annual cost this plan can ever reach.
    pub fn worst_case_annual_cost(&self) -> f64 {
        self.annual_premium() + self.out_of_pocket_max
    }

    /// Raw claims level at which the out-of-pocket maximum starts to bind.
    /// `None` when the cap can never be reached (zero coinsurance with the
    /// cap above the deductible).
    pub fn claims_to_reach_out_of_pocket_max(&self) -> Option<f64> {
        if self.out_of_pocket_max <= self.deductible {
            return Some(self.out_of_pocket_max);
        }
        if self.coinsurance == 0.0 {
            return None;
        }
        Some(self.deductible + (self.out_of_pocket_max - self.deductible) / self.coinsurance)
    }
}

/// `annual_cost(plan, medical_expense)`.
pub fn annual_cost(plan: &PlanDetails, medical_expense: f64) -> f64 {
    plan.annual_cost(medical_expense)
}

/// Build a plan from the configured defaults of a metal tier.
pub fn create_plan_from_tier(
    name: impl Into<String>,
    tier: MetalTier,
    monthly_premium: f64,
    config: &PolicyYearConfig,
) -> Result<PlanDetails> {
    let defaults = config.tier(tier).ok_or_else(|| CoverageError::InvalidPlanParameters {
        field: "metal_tier",
        reason: format!("no defaults configured for {tier} in plan year {}", config.plan_year),
    })?;
    let plan = PlanDetails::new(
        name,
        monthly_premium,
        defaults.deductible,
        defaults.coinsurance,
        defaults.out_of_pocket_max,
    )?
    .with_metal_tier(tier);
    Ok(match tier {
        MetalTier::Hdhp => plan.with_plan_type(PlanType::Hdhp),
        _ => plan,
    })
}

/// Whether a plan can be paired with an HSA. An explicit flag wins;
/// otherwise the plan qualifies when its deductible and out-of-pocket
/// maximum sit within the year's HDHP limits.
pub fn is_hsa_eligible(plan: &PlanDetails, limits: &HsaLimits) -> bool {
    plan.hsa_eligible.unwrap_or_else(|| {
        plan.deductible >= limits.min_deductible_self
            && plan.out_of_pocket_max <= limits.max_out_of_pocket_self
    })
}

/// Wire form of a plan; converted through the validating constructors.
#[derive(Debug, Deserialize)]
struct RawPlan {
    name: String,
    monthly_premium: f64,
    deductible: f64,
    coinsurance: f64,
    out_of_pocket_max: f64,
    #[serde(default)]
    metal_tier: Option<MetalTier>,
    #[serde(default)]
    plan_type: Option<PlanType>,
    #[serde(default)]
    post_subsidy_premium: Option<f64>,
    #[serde(default)]
    primary_care_copay: Option<f64>,
    #[serde(default)]
    specialist_copay: Option<f64>,
    #[serde(default)]
    generic_drug_copay: Option<f64>,
    #[serde(default)]
    emergency_room_copay: Option<f64>,
    #[serde(default)]
    hsa_eligible: Option<bool>,
    #[serde(default)]
    quality_rating: Option<f64>,
    #[serde(default)]
    national_network: Option<bool>,
}

impl TryFrom<RawPlan> for PlanDetails {
    type Error = CoverageError;

    fn try_from(raw: RawPlan) -> Result<Self> {
        let mut plan = PlanDetails::new(
            raw.name,
            raw.monthly_premium,
            raw.deductible,
            raw.coinsurance,
            raw.out_of_pocket_max,
        )?
        .with_copays(Copays {
            primary_care: raw.primary_care_copay,
            specialist: raw.specialist_copay,
            generic_drug: raw.generic_drug_copay,
            emergency_room: raw.emergency_room_copay,
        })?;
        plan.metal_tier = raw.metal_tier;
        plan.plan_type = raw.plan_type;
        plan.hsa_eligible = raw.hsa_eligible;
        plan.national_network = raw.national_network;
        if let Some(premium) = raw.post_subsidy_premium {
            plan = plan.with_post_subsidy_premium(premium)?;
        }
        if let Some(rating) = raw.quality_rating {
            plan = plan.with_quality_rating(rating)?;
        }
        Ok(plan)
    }
}
