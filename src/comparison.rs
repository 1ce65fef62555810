//! Side-by-side plan comparison: weighted metrics, fixed usage scenarios,
//! an overall winner and a recommendation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PolicyYearConfig, ServiceCosts};
use crate::error::{CoverageError, Result};
use crate::plan::{MONTHS_PER_YEAR, PlanDetails, is_hsa_eligible};
use crate::types::{Winner, format_currency};

/// Points a scenario win adds to a plan's score.
const SCENARIO_WEIGHT: u32 = 3;
/// Extra points for winning the scenario built from the user's own usage.
const PERSONAL_SCENARIO_BONUS: u32 = 5;
const HIGH_CONFIDENCE_GAP: u32 = 10;
const MEDIUM_CONFIDENCE_GAP: u32 = 5;

pub const PERSONAL_SCENARIO: &str = "Your Expected Usage";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumPreference {
    LowPremium,
    #[default]
    Balanced,
    LowOutOfPocket,
}

/// Expected yearly healthcare usage supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUsageProfile")]
pub struct UsageProfile {
    primary_care_visits: u32,
    specialist_visits: u32,
    prescriptions: u32,
    er_visits: u32,
    planned_procedure_cost: f64,
    premium_preference: PremiumPreference,
}

impl UsageProfile {
    pub fn with_visits(mut self, primary_care: u32, specialist: u32, emergency: u32) -> Self {
        self.primary_care_visits = primary_care;
        self.specialist_visits = specialist;
        self.er_visits = emergency;
        self
    }

    /// Prescription fills per year.
    pub fn with_prescriptions(mut self, fills: u32) -> Self {
        self.prescriptions = fills;
        self
    }

    pub fn with_planned_procedure_cost(mut self, cost: f64) -> Result<Self> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(CoverageError::InvalidProfile {
                field: "planned_procedure_cost",
                reason: format!("must be a non-negative amount, got {cost}"),
            });
        }
        self.planned_procedure_cost = cost;
        Ok(self)
    }

    pub fn with_premium_preference(mut self, preference: PremiumPreference) -> Self {
        self.premium_preference = preference;
        self
    }

    pub fn premium_preference(&self) -> PremiumPreference {
        self.premium_preference
    }

    fn usage(&self) -> ScenarioUsage {
        ScenarioUsage {
            primary_care_visits: self.primary_care_visits,
            specialist_visits: self.specialist_visits,
            prescriptions: self.prescriptions,
            er_visits: self.er_visits,
            extra_claims: self.planned_procedure_cost,
            major_event: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUsageProfile {
    primary_care_visits: u32,
    specialist_visits: u32,
    prescriptions: u32,
    er_visits: u32,
    planned_procedure_cost: f64,
    premium_preference: PremiumPreference,
}

impl TryFrom<RawUsageProfile> for UsageProfile {
    type Error = CoverageError;

    fn try_from(raw: RawUsageProfile) -> Result<Self> {
        UsageProfile::default()
            .with_visits(raw.primary_care_visits, raw.specialist_visits, raw.er_visits)
            .with_prescriptions(raw.prescriptions)
            .with_premium_preference(raw.premium_preference)
            .with_planned_procedure_cost(raw.planned_procedure_cost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Cost,
    Coverage,
    Network,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMetric {
    pub name: String,
    pub category: MetricCategory,
    pub plan_a_value: String,
    pub plan_b_value: String,
    pub plan_a_raw: MetricValue,
    pub plan_b_raw: MetricValue,
    pub winner: Winner,
    /// 1–5; summed into the winning plan's score.
    pub importance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostScenario {
    pub name: String,
    pub description: String,
    pub plan_a_cost: f64,
    pub plan_b_cost: f64,
    pub winner: Winner,
    pub savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallWinner {
    pub plan: Winner,
    pub confidence: Confidence,
    pub reasoning: String,
    pub plan_a_score: u32,
    pub plan_b_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub recommended_plan: Winner,
    pub reasons: Vec<String>,
    pub caveats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanComparisonResult {
    pub plan_a: PlanDetails,
    pub plan_b: PlanDetails,
    pub metrics: Vec<ComparisonMetric>,
    pub scenarios: Vec<CostScenario>,
    pub overall_winner: OverallWinner,
    pub recommendation: Recommendation,
    pub key_differences: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickComparison {
    pub cheaper_monthly: Winner,
    pub cheaper_if_healthy: Winner,
    pub cheaper_if_sick: Winner,
    pub better_protection: Winner,
    pub summary: String,
}

/// Service counts for one usage scenario.
#[derive(Debug, Clone, Copy)]
struct ScenarioUsage {
    primary_care_visits: u32,
    specialist_visits: u32,
    prescriptions: u32,
    er_visits: u32,
    /// Claims that go straight into the deductible pool.
    extra_claims: f64,
    /// Adds the plan's own deductible plus the configured major-event claims.
    major_event: bool,
}

impl ScenarioUsage {
    const fn visits(primary: u32, specialist: u32, prescriptions: u32, er: u32) -> Self {
        ScenarioUsage {
            primary_care_visits: primary,
            specialist_visits: specialist,
            prescriptions,
            er_visits: er,
            extra_claims: 0.0,
            major_event: false,
        }
    }
}

const FIXED_SCENARIOS: [(&str, &str, ScenarioUsage); 4] = [
    ("Healthy Year", "2 doctor visits and 3 prescriptions", ScenarioUsage::visits(2, 0, 3, 0)),
    (
        "Moderate Usage",
        "6 doctor visits, 2 specialist visits and 12 prescriptions",
        ScenarioUsage::visits(6, 2, 12, 0),
    ),
    (
        "Chronic Condition",
        "12 doctor visits, 6 specialist visits, 36 prescriptions and 1 ER visit",
        ScenarioUsage::visits(12, 6, 36, 1),
    ),
    (
        "Major Medical Event",
        "Claims reaching $10,000 beyond the deductible, e.g. surgery or hospitalisation",
        ScenarioUsage {
            primary_care_visits: 0,
            specialist_visits: 0,
            prescriptions: 0,
            er_visits: 0,
            extra_claims: 0.0,
            major_event: true,
        },
    ),
];

/// Premiums plus member cost for a year of `usage`. Services with a copay
/// are paid at the copay; everything else flows through the deductible /
/// coinsurance pool. Total member cost is capped at the out-of-pocket max.
fn scenario_cost(plan: &PlanDetails, usage: &ScenarioUsage, costs: &ServiceCosts) -> f64 {
    let copays = plan.copays();
    let mut copay_total = 0.0;
    let mut pooled = usage.extra_claims;
    if usage.major_event {
        pooled += plan.deductible() + costs.major_event_claims_above_deductible;
    }
    for (count, copay, unit_cost) in [
        (usage.primary_care_visits, copays.primary_care, costs.primary_visit),
        (usage.specialist_visits, copays.specialist, costs.specialist_visit),
        (usage.prescriptions, copays.generic_drug, costs.generic_prescription),
        (usage.er_visits, copays.emergency_room, costs.emergency_visit),
    ] {
        match copay {
            Some(c) => copay_total += c * count as f64,
            None => pooled += unit_cost * count as f64,
        }
    }
    let member_cost = (copay_total + plan.out_of_pocket(pooled)).min(plan.out_of_pocket_max());
    plan.effective_monthly_premium() * MONTHS_PER_YEAR + member_cost
}

fn build_scenario(
    name: &str,
    description: String,
    usage: &ScenarioUsage,
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    costs: &ServiceCosts,
) -> CostScenario {
    let plan_a_cost = scenario_cost(plan_a, usage, costs);
    let plan_b_cost = scenario_cost(plan_b, usage, costs);
    CostScenario {
        name: name.to_string(),
        description,
        plan_a_cost,
        plan_b_cost,
        winner: Winner::lower(plan_a_cost, plan_b_cost),
        savings: (plan_a_cost - plan_b_cost).abs(),
    }
}

fn build_scenarios(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    profile: Option<&UsageProfile>,
    costs: &ServiceCosts,
) -> Vec<CostScenario> {
    let mut scenarios: Vec<CostScenario> = FIXED_SCENARIOS
        .iter()
        .map(|(name, description, usage)| {
            build_scenario(name, description.to_string(), usage, plan_a, plan_b, costs)
        })
        .collect();
    if let Some(profile) = profile {
        let usage = profile.usage();
        let description = format!(
            "{} doctor visits, {} specialist visits, {} prescriptions, {} ER visits and {} in planned procedures",
            usage.primary_care_visits,
            usage.specialist_visits,
            usage.prescriptions,
            usage.er_visits,
            format_currency(usage.extra_claims),
        );
        scenarios.push(build_scenario(
            PERSONAL_SCENARIO,
            description,
            &usage,
            plan_a,
            plan_b,
            costs,
        ));
    }
    scenarios
}

fn currency_metric(
    name: &str,
    category: MetricCategory,
    importance: u32,
    a: f64,
    b: f64,
) -> ComparisonMetric {
    ComparisonMetric {
        name: name.to_string(),
        category,
        plan_a_value: format_currency(a),
        plan_b_value: format_currency(b),
        plan_a_raw: MetricValue::Number(a),
        plan_b_raw: MetricValue::Number(b),
        winner: Winner::lower(a, b),
        importance,
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn flag_metric(
    name: &str,
    category: MetricCategory,
    importance: u32,
    a: bool,
    b: bool,
) -> ComparisonMetric {
    ComparisonMetric {
        name: name.to_string(),
        category,
        plan_a_value: yes_no(a),
        plan_b_value: yes_no(b),
        plan_a_raw: MetricValue::Flag(a),
        plan_b_raw: MetricValue::Flag(b),
        winner: Winner::flag(a, b),
        importance,
    }
}

fn build_metrics(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    config: &PolicyYearConfig,
) -> Vec<ComparisonMetric> {
    use MetricCategory::*;

    let mut metrics = vec![currency_metric(
        "Monthly Premium",
        Cost,
        5,
        plan_a.monthly_premium(),
        plan_b.monthly_premium(),
    )];
    if plan_a.post_subsidy_premium().is_some() || plan_b.post_subsidy_premium().is_some() {
        metrics.push(currency_metric(
            "Premium After Subsidy",
            Cost,
            5,
            plan_a.effective_monthly_premium(),
            plan_b.effective_monthly_premium(),
        ));
    }
    metrics.push(currency_metric(
        "Annual Premium",
        Cost,
        4,
        plan_a.effective_monthly_premium() * MONTHS_PER_YEAR,
        plan_b.effective_monthly_premium() * MONTHS_PER_YEAR,
    ));
    metrics.push(currency_metric("Deductible", Cost, 4, plan_a.deductible(), plan_b.deductible()));
    metrics.push(currency_metric(
        "Out-of-Pocket Maximum",
        Cost,
        5,
        plan_a.out_of_pocket_max(),
        plan_b.out_of_pocket_max(),
    ));

    let (copays_a, copays_b) = (plan_a.copays(), plan_b.copays());
    for (name, importance, a, b) in [
        ("Primary Care Copay", 3, copays_a.primary_care, copays_b.primary_care),
        ("Specialist Copay", 3, copays_a.specialist, copays_b.specialist),
        ("Generic Drug Copay", 2, copays_a.generic_drug, copays_b.generic_drug),
    ] {
        if let (Some(a), Some(b)) = (a, b) {
            metrics.push(currency_metric(name, Coverage, importance, a, b));
        }
    }

    let (coins_a, coins_b) = (plan_a.coinsurance(), plan_b.coinsurance());
    metrics.push(ComparisonMetric {
        name: "Coinsurance".to_string(),
        category: Coverage,
        plan_a_value: format!("{:.0}%", coins_a * 100.0),
        plan_b_value: format!("{:.0}%", coins_b * 100.0),
        plan_a_raw: MetricValue::Number(coins_a),
        plan_b_raw: MetricValue::Number(coins_b),
        winner: Winner::lower(coins_a, coins_b),
        importance: 3,
    });

    if let (Some(a), Some(b)) = (plan_a.plan_type(), plan_b.plan_type()) {
        metrics.push(ComparisonMetric {
            name: "Plan Type".to_string(),
            category: Network,
            plan_a_value: a.to_string(),
            plan_b_value: b.to_string(),
            plan_a_raw: MetricValue::Text(a.to_string()),
            plan_b_raw: MetricValue::Text(b.to_string()),
            winner: Winner::Tie,
            importance: 2,
        });
    }
    if let (Some(a), Some(b)) = (plan_a.national_network(), plan_b.national_network()) {
        metrics.push(flag_metric("National Network", Network, 2, a, b));
    }
    if let (Some(a), Some(b)) = (plan_a.quality_rating(), plan_b.quality_rating()) {
        metrics.push(ComparisonMetric {
            name: "Quality Rating".to_string(),
            category: Value,
            plan_a_value: format!("{a:.1} stars"),
            plan_b_value: format!("{b:.1} stars"),
            plan_a_raw: MetricValue::Number(a),
            plan_b_raw: MetricValue::Number(b),
            winner: Winner::higher(a, b),
            importance: 3,
        });
    }
    metrics.push(flag_metric(
        "HSA Eligible",
        Value,
        2,
        is_hsa_eligible(plan_a, &config.hsa),
        is_hsa_eligible(plan_b, &config.hsa),
    ));
    metrics
}

fn tally(scores: &mut (u32, u32), winner: Winner, points: u32) {
    match winner {
        Winner::A => scores.0 += points,
        Winner::B => scores.1 += points,
        Winner::Tie => {}
    }
}

fn overall_winner(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    metrics: &[ComparisonMetric],
    scenarios: &[CostScenario],
) -> OverallWinner {
    let mut scores = (0u32, 0u32);
    for m in metrics {
        tally(&mut scores, m.winner, m.importance);
    }
    for s in scenarios {
        tally(&mut scores, s.winner, SCENARIO_WEIGHT);
        if s.name == PERSONAL_SCENARIO {
            tally(&mut scores, s.winner, PERSONAL_SCENARIO_BONUS);
        }
    }
    let (a, b) = scores;
    let gap = a.abs_diff(b);
    let confidence = if gap > HIGH_CONFIDENCE_GAP {
        Confidence::High
    } else if gap > MEDIUM_CONFIDENCE_GAP {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    let plan = Winner::higher(a as f64, b as f64);

    let scenario_wins = |w: Winner| scenarios.iter().filter(|s| s.winner == w).count();
    let reasoning = match plan {
        Winner::Tie => format!("Both plans score {a} points; neither has a clear advantage."),
        Winner::A | Winner::B => {
            let (name, won, lost) =
                if plan == Winner::A { (plan_a.name(), a, b) } else { (plan_b.name(), b, a) };
            format!(
                "{name} scores {won} to {lost}, winning {} of {} cost scenarios.",
                scenario_wins(plan),
                scenarios.len(),
            )
        }
    };
    debug!(plan_a_score = a, plan_b_score = b, ?confidence, "scored plan comparison");

    OverallWinner { plan, confidence, reasoning, plan_a_score: a, plan_b_score: b }
}

fn recommend(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    metrics: &[ComparisonMetric],
    scenarios: &[CostScenario],
    overall: &OverallWinner,
    profile: Option<&UsageProfile>,
) -> Recommendation {
    let reference = scenarios
        .iter()
        .find(|s| s.name == PERSONAL_SCENARIO)
        .or_else(|| scenarios.get(1));
    let recommended_plan = match (overall.plan, reference) {
        (Winner::Tie, Some(r)) => r.winner,
        (plan, _) => plan,
    };

    let name_of = |w: Winner| if w == Winner::A { plan_a.name() } else { plan_b.name() };
    let other_of = |w: Winner| if w == Winner::A { Winner::B } else { Winner::A };
    let mut reasons = Vec::new();
    let mut caveats = Vec::new();

    if recommended_plan == Winner::Tie {
        reasons.push("Both plans cost the same for the usage levels compared.".to_string());
        return Recommendation { recommended_plan, reasons, caveats };
    }

    let (chosen, other) = if recommended_plan == Winner::A {
        (plan_a, plan_b)
    } else {
        (plan_b, plan_a)
    };

    if let Some(r) = reference {
        if r.winner != Winner::Tie {
            let (cheap, dear) = if r.winner == Winner::A {
                (r.plan_a_cost, r.plan_b_cost)
            } else {
                (r.plan_b_cost, r.plan_a_cost)
            };
            reasons.push(format!(
                "{} is cheapest for {} at {} per year, saving {} compared with {}.",
                name_of(r.winner),
                r.name,
                format_currency(cheap),
                format_currency(dear - cheap),
                name_of(other_of(r.winner)),
            ));
            if r.winner != recommended_plan {
                caveats.push(format!(
                    "{} is cheaper for {}, even though {} wins overall.",
                    name_of(r.winner),
                    r.name,
                    chosen.name(),
                ));
            }
        }
    }

    for m in metrics.iter().filter(|m| m.winner == recommended_plan && m.importance >= 4) {
        let (mine, theirs) = if recommended_plan == Winner::A {
            (&m.plan_a_value, &m.plan_b_value)
        } else {
            (&m.plan_b_value, &m.plan_a_value)
        };
        reasons.push(format!("Better {}: {mine} vs {theirs}.", m.name.to_lowercase()));
    }

    match profile.map(UsageProfile::premium_preference) {
        Some(PremiumPreference::LowPremium)
            if chosen.effective_monthly_premium() > other.effective_monthly_premium() =>
        {
            caveats.push(format!(
                "You prefer a low premium, but {} costs {} more per month than {}.",
                chosen.name(),
                format_currency(
                    chosen.effective_monthly_premium() - other.effective_monthly_premium()
                ),
                other.name(),
            ));
        }
        Some(PremiumPreference::LowOutOfPocket)
            if chosen.out_of_pocket_max() > other.out_of_pocket_max() =>
        {
            caveats.push(format!(
                "You prefer low out-of-pocket costs, but {} has a {} higher out-of-pocket maximum than {}.",
                chosen.name(),
                format_currency(chosen.out_of_pocket_max() - other.out_of_pocket_max()),
                other.name(),
            ));
        }
        _ => {}
    }

    if overall.confidence == Confidence::Low {
        caveats.push(
            "The plans are closely matched; a change in your expected usage could change the answer."
                .to_string(),
        );
    }

    Recommendation { recommended_plan, reasons, caveats }
}

fn key_differences(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    config: &PolicyYearConfig,
) -> Vec<String> {
    let limits = &config.materiality;
    let mut out = Vec::new();
    let mut currency_gap = |label: &str, per: &str, a: f64, b: f64, threshold: f64| {
        let diff = (a - b).abs();
        if diff > threshold {
            let (lower, higher) = if a < b {
                (plan_a.name(), plan_b.name())
            } else {
                (plan_b.name(), plan_a.name())
            };
            let diff = format_currency(diff);
            out.push(format!("{lower} has a {diff} lower {label}{per} than {higher}"));
        }
    };
    currency_gap(
        "premium",
        " per month",
        plan_a.effective_monthly_premium(),
        plan_b.effective_monthly_premium(),
        limits.monthly_premium,
    );
    currency_gap("deductible", "", plan_a.deductible(), plan_b.deductible(), limits.deductible);
    currency_gap(
        "out-of-pocket maximum",
        "",
        plan_a.out_of_pocket_max(),
        plan_b.out_of_pocket_max(),
        limits.out_of_pocket_max,
    );

    if let (Some(a), Some(b)) = (plan_a.quality_rating(), plan_b.quality_rating()) {
        if (a - b).abs() >= limits.quality_rating {
            let (better, worse, hi, lo) = if a > b {
                (plan_a.name(), plan_b.name(), a, b)
            } else {
                (plan_b.name(), plan_a.name(), b, a)
            };
            out.push(format!("{better} is rated {hi:.1} stars vs {lo:.1} for {worse}"));
        }
    }
    if let (Some(a), Some(b)) = (plan_a.plan_type(), plan_b.plan_type()) {
        if a != b {
            out.push(format!("{} is a {a} while {} is a {b}", plan_a.name(), plan_b.name()));
        }
    }
    out
}

/// Compare two plans, optionally against the user's own expected usage.
pub fn compare_plans(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    profile: Option<&UsageProfile>,
    config: &PolicyYearConfig,
) -> PlanComparisonResult {
    let metrics = build_metrics(plan_a, plan_b, config);
    let scenarios = build_scenarios(plan_a, plan_b, profile, &config.service_costs);
    let overall = overall_winner(plan_a, plan_b, &metrics, &scenarios);
    let recommendation = recommend(plan_a, plan_b, &metrics, &scenarios, &overall, profile);
    let key_differences = key_differences(plan_a, plan_b, config);

    let summary = match recommendation.recommended_plan {
        Winner::Tie => format!(
            "{} and {} are evenly matched on cost and coverage.",
            plan_a.name(),
            plan_b.name()
        ),
        w => {
            let name = if w == Winner::A { plan_a.name() } else { plan_b.name() };
            let confidence = match overall.confidence {
                Confidence::High => "high",
                Confidence::Medium => "medium",
                Confidence::Low => "low",
            };
            format!(
                "{name} is the better fit ({confidence} confidence) with {} key difference{}.",
                key_differences.len(),
                if key_differences.len() == 1 { "" } else { "s" },
            )
        }
    };

    PlanComparisonResult {
        plan_a: plan_a.clone(),
        plan_b: plan_b.clone(),
        metrics,
        scenarios,
        overall_winner: overall,
        recommendation,
        key_differences,
        summary,
    }
}

/// Condensed four-question comparison.
pub fn quick_comparison(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    config: &PolicyYearConfig,
) -> QuickComparison {
    let costs = &config.service_costs;
    let (_, _, healthy) = &FIXED_SCENARIOS[0];
    let (_, _, major) = &FIXED_SCENARIOS[3];

    let cheaper_monthly =
        Winner::lower(plan_a.effective_monthly_premium(), plan_b.effective_monthly_premium());
    let cheaper_if_healthy =
        Winner::lower(scenario_cost(plan_a, healthy, costs), scenario_cost(plan_b, healthy, costs));
    let cheaper_if_sick =
        Winner::lower(scenario_cost(plan_a, major, costs), scenario_cost(plan_b, major, costs));
    let better_protection = Winner::lower(plan_a.out_of_pocket_max(), plan_b.out_of_pocket_max());

    let name = |w: Winner| match w {
        Winner::A => plan_a.name(),
        Winner::B => plan_b.name(),
        Winner::Tie => "Neither plan",
    };
    let summary = if cheaper_if_healthy == cheaper_if_sick && cheaper_if_healthy != Winner::Tie {
        format!(
            "{} is cheaper whether you stay healthy or face a major medical event.",
            name(cheaper_if_healthy)
        )
    } else {
        format!(
            "{} is cheaper in a healthy year; {} is cheaper if you face a major medical event.",
            name(cheaper_if_healthy),
            name(cheaper_if_sick),
        )
    };

    QuickComparison {
        cheaper_monthly,
        cheaper_if_healthy,
        cheaper_if_sick,
        better_protection,
        summary,
    }
}
