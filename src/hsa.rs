//! Health Savings Account tax-benefit projection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{HsaLimits, PolicyYearConfig};
use crate::error::{CoverageError, Result};
use crate::plan::{PlanDetails, is_hsa_eligible};

/// Employee share of Social Security + Medicare, avoided when contributions
/// go through payroll.
pub const PAYROLL_TAX_RATE: f64 = 0.0765;
const MAX_YEARS: u32 = 60;
const MAX_AGE: u32 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HsaCoverage {
    #[default]
    #[serde(rename = "self")]
    SelfOnly,
    Family,
}

impl HsaCoverage {
    pub fn contribution_limit(self, limits: &HsaLimits) -> f64 {
        match self {
            HsaCoverage::SelfOnly => limits.contribution_limit_self,
            HsaCoverage::Family => limits.contribution_limit_family,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHsaInput")]
pub struct HsaProjectionInput {
    coverage: HsaCoverage,
    age: u32,
    annual_contribution: f64,
    federal_tax_rate: f64,
    state_tax_rate: f64,
    payroll_deduction: bool,
    annual_withdrawals: f64,
    growth_rate: f64,
    years: u32,
    starting_balance: f64,
}

fn invalid(field: &'static str, reason: String) -> CoverageError {
    CoverageError::InvalidProfile { field, reason }
}

fn check_amount(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be a non-negative amount, got {value}")));
    }
    Ok(value)
}

impl HsaProjectionInput {
    pub fn new(
        coverage: HsaCoverage,
        age: u32,
        annual_contribution: f64,
        years: u32,
    ) -> Result<Self> {
        if years == 0 || years > MAX_YEARS {
            return Err(invalid("years", format!("must lie in 1..={MAX_YEARS}, got {years}")));
        }
        if age > MAX_AGE {
            return Err(invalid("age", format!("must be at most {MAX_AGE}, got {age}")));
        }
        Ok(HsaProjectionInput {
            coverage,
            age,
            annual_contribution: check_amount("annual_contribution", annual_contribution)?,
            federal_tax_rate: 0.0,
            state_tax_rate: 0.0,
            payroll_deduction: false,
            annual_withdrawals: 0.0,
            growth_rate: 0.0,
            years,
            starting_balance: 0.0,
        })
    }

    /// Marginal income-tax rates as fractions.
    pub fn with_tax_rates(mut self, federal: f64, state: f64) -> Result<Self> {
        for (field, rate) in [("federal_tax_rate", federal), ("state_tax_rate", state)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(field, format!("must lie in [0, 1], got {rate}")));
            }
        }
        if federal + state > 1.0 {
            let combined = federal + state;
            return Err(invalid("state_tax_rate", format!("combined rate {combined} exceeds 1")));
        }
        self.federal_tax_rate = federal;
        self.state_tax_rate = state;
        Ok(self)
    }

    pub fn with_payroll_deduction(mut self, payroll: bool) -> Self {
        self.payroll_deduction = payroll;
        self
    }

    /// Qualified medical withdrawals per year.
    pub fn with_annual_withdrawals(mut self, amount: f64) -> Result<Self> {
        self.annual_withdrawals = check_amount("annual_withdrawals", amount)?;
        Ok(self)
    }

    pub fn with_growth_rate(mut self, rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(invalid("growth_rate", format!("must be finite and above -1, got {rate}")));
        }
        self.growth_rate = rate;
        Ok(self)
    }

    pub fn with_starting_balance(mut self, balance: f64) -> Result<Self> {
        self.starting_balance = check_amount("starting_balance", balance)?;
        Ok(self)
    }

    /// Tax avoided per dollar contributed.
    pub fn tax_rate(&self) -> f64 {
        let payroll = if self.payroll_deduction { PAYROLL_TAX_RATE } else { 0.0 };
        self.federal_tax_rate + self.state_tax_rate + payroll
    }
}

#[derive(Debug, Deserialize)]
struct RawHsaInput {
    #[serde(default)]
    coverage: HsaCoverage,
    age: u32,
    annual_contribution: f64,
    #[serde(default)]
    federal_tax_rate: f64,
    #[serde(default)]
    state_tax_rate: f64,
    #[serde(default)]
    payroll_deduction: bool,
    #[serde(default)]
    annual_withdrawals: f64,
    #[serde(default)]
    growth_rate: f64,
    years: u32,
    #[serde(default)]
    starting_balance: f64,
}

impl TryFrom<RawHsaInput> for HsaProjectionInput {
    type Error = CoverageError;

    fn try_from(raw: RawHsaInput) -> Result<Self> {
        HsaProjectionInput::new(raw.coverage, raw.age, raw.annual_contribution, raw.years)?
            .with_tax_rates(raw.federal_tax_rate, raw.state_tax_rate)?
            .with_payroll_deduction(raw.payroll_deduction)
            .with_annual_withdrawals(raw.annual_withdrawals)?
            .with_growth_rate(raw.growth_rate)?
            .with_starting_balance(raw.starting_balance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HsaYear {
    pub year: u32,
    pub age: u32,
    pub contribution_limit: f64,
    pub contribution: f64,
    pub tax_savings: f64,
    pub withdrawals: f64,
    pub growth: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HsaProjection {
    pub plan_year: u16,
    pub coverage: HsaCoverage,
    /// Whether the paired plan qualifies; `None` when no plan was given.
    pub plan_eligible: Option<bool>,
    pub years: Vec<HsaYear>,
    pub total_contributions: f64,
    pub total_tax_savings: f64,
    pub total_withdrawals: f64,
    pub total_growth: f64,
    pub final_balance: f64,
    /// Planned contributions that exceeded the yearly limit.
    pub contributions_over_limit: f64,
}

/// Project an HSA year by year using the contribution limits of the
/// configured plan year. Contributions are capped at the coverage limit
/// plus the catch-up amount once the holder reaches the catch-up age;
/// withdrawals never exceed the balance; growth accrues on the balance left
/// after the year's withdrawals.
pub fn project_hsa(
    input: &HsaProjectionInput,
    plan: Option<&PlanDetails>,
    config: &PolicyYearConfig,
) -> HsaProjection {
    let limits = &config.hsa;
    let tax_rate = input.tax_rate();
    let mut balance = input.starting_balance;
    let mut rows = Vec::with_capacity(input.years as usize);
    let mut contributions_over_limit = 0.0;

    for year in 1..=input.years {
        let age = input.age + year - 1;
        let catch_up = if age >= limits.catch_up_age { limits.catch_up_contribution } else { 0.0 };
        let contribution_limit = input.coverage.contribution_limit(limits) + catch_up;
        let contribution = input.annual_contribution.min(contribution_limit);
        contributions_over_limit += input.annual_contribution - contribution;

        balance += contribution;
        let withdrawals = input.annual_withdrawals.min(balance);
        balance -= withdrawals;
        let growth = balance * input.growth_rate;
        balance += growth;

        rows.push(HsaYear {
            year,
            age,
            contribution_limit,
            contribution,
            tax_savings: contribution * tax_rate,
            withdrawals,
            growth,
            end_balance: balance,
        });
    }

    let sum = |f: fn(&HsaYear) -> f64| rows.iter().map(f).sum::<f64>();
    let totals = (
        sum(|r| r.contribution),
        sum(|r| r.tax_savings),
        sum(|r| r.withdrawals),
        sum(|r| r.growth),
    );
    let projection = HsaProjection {
        plan_year: config.plan_year,
        coverage: input.coverage,
        plan_eligible: plan.map(|p| is_hsa_eligible(p, limits)),
        total_contributions: totals.0,
        total_tax_savings: totals.1,
        total_withdrawals: totals.2,
        total_growth: totals.3,
        final_balance: balance,
        contributions_over_limit,
        years: rows,
    };
    debug!(
        years = input.years,
        final_balance = projection.final_balance,
        tax_savings = projection.total_tax_savings,
        "projected HSA"
    );
    projection
}
