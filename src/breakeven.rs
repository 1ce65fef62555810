//! Break-even analysis between two plans.
//!
//! The cost difference `f(x) = cost_1(x) − cost_2(x)` is piecewise linear in
//! the medical expense `x`. It is sampled on a fixed grid over
//! `[0, 2 × max(oop_max)]` to bracket the first sign change, and the bracket
//! is then bisected down to the requested precision.

use serde::Serialize;
use tracing::debug;

use crate::config::PolicyYearConfig;
use crate::plan::{PlanDetails, is_hsa_eligible};
use crate::types::{CheaperPlan, PlanVerdict, format_currency};

/// Sample intervals across the search domain (51 sample points).
pub const SAMPLE_INTERVALS: usize = 50;
pub const DEFAULT_PRECISION: f64 = 100.0;
pub const DEFAULT_CURVE_POINTS: usize = 10;

/// Smallest bracket width the bisection will try to reach.
const MIN_PRECISION: f64 = 0.01;
const MAX_BISECTIONS: usize = 200;

/// Both plans' total annual cost at one medical-expense level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAtUtilization {
    pub medical_expense: f64,
    pub plan1_total_cost: f64,
    pub plan2_total_cost: f64,
    pub cheaper_plan: CheaperPlan,
    /// `plan2_total_cost − plan1_total_cost`; positive when plan 1 is cheaper.
    pub savings_with_plan1: f64,
}

impl CostAtUtilization {
    fn evaluate(plan1: &PlanDetails, plan2: &PlanDetails, medical_expense: f64) -> Self {
        let plan1_total_cost = plan1.annual_cost(medical_expense);
        let plan2_total_cost = plan2.annual_cost(medical_expense);
        let savings_with_plan1 = plan2_total_cost - plan1_total_cost;
        let cheaper_plan = if savings_with_plan1 > 0.0 {
            CheaperPlan::Plan1
        } else if savings_with_plan1 < 0.0 {
            CheaperPlan::Plan2
        } else {
            CheaperPlan::Equal
        };
        CostAtUtilization {
            medical_expense,
            plan1_total_cost,
            plan2_total_cost,
            cheaper_plan,
            savings_with_plan1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakEvenAnalysis {
    pub plan1_advantages: Vec<String>,
    pub plan2_advantages: Vec<String>,
    pub summary: String,
    pub recommended_plan: CheaperPlan,
    pub recommendation: String,
    pub plan1_hsa_eligible: bool,
    pub plan2_hsa_eligible: bool,
    pub typical_annual_spending: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakEvenResult {
    pub plan1: PlanDetails,
    pub plan2: PlanDetails,
    /// Medical expense at which both plans cost the same; `None` when one
    /// plan is never more expensive across the searched domain.
    pub break_even_point: Option<f64>,
    pub better_plan_below_breakeven: PlanVerdict,
    pub better_plan_above_breakeven: PlanVerdict,
    pub cost_curve: Vec<CostAtUtilization>,
    pub analysis: BreakEvenAnalysis,
}

/// Upper end of the expense domain searched and plotted for a plan pair.
pub fn search_ceiling(plan_a: &PlanDetails, plan_b: &PlanDetails) -> f64 {
    2.0 * plan_a.out_of_pocket_max().max(plan_b.out_of_pocket_max())
}

fn cost_difference(plan_a: &PlanDetails, plan_b: &PlanDetails, x: f64) -> f64 {
    plan_a.annual_cost(x) - plan_b.annual_cost(x)
}

/// Medical-expense level where the two plans' annual costs cross, rounded
/// to whole currency units. Symmetric in its plan arguments.
pub fn find_break_even_point(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    precision: f64,
) -> Option<f64> {
    let ceiling = search_ceiling(plan_a, plan_b);
    if ceiling <= 0.0 {
        return None;
    }
    let step = ceiling / SAMPLE_INTERVALS as f64;

    // Samples where the difference is exactly zero are skipped so a crossing
    // that lands on a grid point is still bracketed by its neighbours.
    let mut last_nonzero: Option<(f64, f64)> = None;
    let mut bracket = None;
    for i in 0..=SAMPLE_INTERVALS {
        let x = i as f64 * step;
        let fx = cost_difference(plan_a, plan_b, x);
        if fx == 0.0 {
            continue;
        }
        if let Some((prev_x, prev_f)) = last_nonzero {
            if prev_f * fx < 0.0 {
                bracket = Some((prev_x, prev_f, x));
                break;
            }
        }
        last_nonzero = Some((x, fx));
    }

    let Some((mut lo, f_lo, mut hi)) = bracket else {
        debug!(
            plan_a = plan_a.name(),
            plan_b = plan_b.name(),
            ceiling,
            "no sign change in cost difference"
        );
        return None;
    };
    debug!(lo, hi, "bracketed break-even point");

    let precision = precision.max(MIN_PRECISION);
    let mut iterations = 0;
    while hi - lo > precision && iterations < MAX_BISECTIONS {
        let mid = (lo + hi) / 2.0;
        let f_mid = cost_difference(plan_a, plan_b, mid);
        if f_mid == 0.0 {
            return Some(mid.round());
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
        iterations += 1;
    }

    Some(((lo + hi) / 2.0).round())
}

/// `num_points + 1` evenly spaced evaluations of both plans over
/// `[0, search_ceiling]`, starting at zero expense.
pub fn generate_cost_curve(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    num_points: usize,
) -> Vec<CostAtUtilization> {
    let ceiling = search_ceiling(plan_a, plan_b);
    let step = if num_points == 0 { 0.0 } else { ceiling / num_points as f64 };
    (0..=num_points)
        .map(|i| CostAtUtilization::evaluate(plan_a, plan_b, i as f64 * step))
        .collect()
}

/// Sign of the cost difference just before the first crossing at `point`.
/// Capped curves can cross twice, so the side above the point is read as the
/// opposite of the side below rather than from the far end of the domain.
fn difference_below(plan_a: &PlanDetails, plan_b: &PlanDetails, point: f64) -> f64 {
    let step = search_ceiling(plan_a, plan_b) / SAMPLE_INTERVALS as f64;
    (0..=SAMPLE_INTERVALS)
        .map(|i| i as f64 * step)
        .take_while(|&x| x < point)
        .map(|x| cost_difference(plan_a, plan_b, x))
        .find(|&f| f != 0.0)
        .unwrap_or_else(|| cost_difference(plan_a, plan_b, point / 2.0))
}

/// Which plan wins below and above the break-even point.
fn verdicts(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    break_even_point: Option<f64>,
    cost_curve: &[CostAtUtilization],
) -> (PlanVerdict, PlanVerdict) {
    match break_even_point {
        Some(point) => {
            if difference_below(plan_a, plan_b, point) < 0.0 {
                (PlanVerdict::Plan1, PlanVerdict::Plan2)
            } else {
                (PlanVerdict::Plan2, PlanVerdict::Plan1)
            }
        }
        None => {
            let (sum1, sum2) = cost_curve.iter().fold((0.0, 0.0), |(s1, s2), p| {
                (s1 + p.plan1_total_cost, s2 + p.plan2_total_cost)
            });
            let always = if sum1 <= sum2 { PlanVerdict::Always1 } else { PlanVerdict::Always2 };
            (always, always)
        }
    }
}

fn advantages(
    this: &PlanDetails,
    other: &PlanDetails,
    this_hsa: bool,
    other_hsa: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    if this.monthly_premium() < other.monthly_premium() {
        let yearly = (other.monthly_premium() - this.monthly_premium()) * 12.0;
        out.push(format!(
            "Lower monthly premium ({} vs {}), saving {} per year in premiums",
            format_currency(this.monthly_premium()),
            format_currency(other.monthly_premium()),
            format_currency(yearly),
        ));
    }
    if this.deductible() < other.deductible() {
        out.push(format!(
            "Lower deductible ({} vs {})",
            format_currency(this.deductible()),
            format_currency(other.deductible()),
        ));
    }
    if this.out_of_pocket_max() < other.out_of_pocket_max() {
        out.push(format!(
            "Lower out-of-pocket maximum ({} vs {})",
            format_currency(this.out_of_pocket_max()),
            format_currency(other.out_of_pocket_max()),
        ));
    }
    if this.coinsurance() < other.coinsurance() {
        out.push(format!(
            "Lower coinsurance ({:.0}% vs {:.0}%)",
            this.coinsurance() * 100.0,
            other.coinsurance() * 100.0,
        ));
    }
    if this_hsa && !other_hsa {
        out.push("HSA-eligible: contributions are tax-deductible and grow tax-free".to_string());
    }
    out
}

/// Human-readable reading of a break-even result.
pub fn analyze_break_even(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    break_even_point: Option<f64>,
    cost_curve: &[CostAtUtilization],
    config: &PolicyYearConfig,
) -> BreakEvenAnalysis {
    let plan1_hsa_eligible = is_hsa_eligible(plan_a, &config.hsa);
    let plan2_hsa_eligible = is_hsa_eligible(plan_b, &config.hsa);
    let plan1_advantages = advantages(plan_a, plan_b, plan1_hsa_eligible, plan2_hsa_eligible);
    let plan2_advantages = advantages(plan_b, plan_a, plan2_hsa_eligible, plan1_hsa_eligible);

    let name = |v: PlanVerdict| match v {
        PlanVerdict::Plan1 | PlanVerdict::Always1 => plan_a.name(),
        PlanVerdict::Plan2 | PlanVerdict::Always2 => plan_b.name(),
    };
    let pick = |v: PlanVerdict| match v {
        PlanVerdict::Plan1 | PlanVerdict::Always1 => CheaperPlan::Plan1,
        PlanVerdict::Plan2 | PlanVerdict::Always2 => CheaperPlan::Plan2,
    };

    let typical = config.typical_annual_spending;
    let (below, above) = verdicts(plan_a, plan_b, break_even_point, cost_curve);
    let identical = cost_curve.iter().all(|p| p.cheaper_plan == CheaperPlan::Equal);

    let (summary, recommended_plan, recommendation) = match break_even_point {
        _ if identical => (
            "Both plans cost the same at every level of medical spending.".to_string(),
            CheaperPlan::Equal,
            "Either plan works financially; compare networks and covered benefits instead."
                .to_string(),
        ),
        Some(point) => {
            let summary = format!(
                "{} is cheaper when annual medical expenses are below {}; {} is cheaper above that.",
                name(below),
                format_currency(point),
                name(above),
            );
            let (winner, recommendation) = if point > typical {
                (
                    below,
                    format!(
                        "The break-even point ({}) is above typical annual spending of {}, so {} is likely the better choice unless you expect significant medical costs.",
                        format_currency(point),
                        format_currency(typical),
                        name(below),
                    ),
                )
            } else {
                (
                    above,
                    format!(
                        "The break-even point ({}) is at or below typical annual spending of {}, so {} is likely the better choice for most people.",
                        format_currency(point),
                        format_currency(typical),
                        name(above),
                    ),
                )
            };
            (summary, pick(winner), recommendation)
        }
        None => {
            let ceiling = cost_curve.last().map(|p| p.medical_expense).unwrap_or(0.0);
            (
                format!(
                    "{} costs the same or less at every level of medical spending up to {}.",
                    name(below),
                    format_currency(ceiling),
                ),
                pick(below),
                format!(
                    "{} is the better financial choice regardless of how much care you use.",
                    name(below)
                ),
            )
        }
    };

    BreakEvenAnalysis {
        plan1_advantages,
        plan2_advantages,
        summary,
        recommended_plan,
        recommendation,
        plan1_hsa_eligible,
        plan2_hsa_eligible,
        typical_annual_spending: typical,
    }
}

/// Full break-even comparison with default precision and curve resolution.
pub fn compare_break_even(
    plan_a: &PlanDetails,
    plan_b: &PlanDetails,
    config: &PolicyYearConfig,
) -> BreakEvenResult {
    let break_even_point = find_break_even_point(plan_a, plan_b, DEFAULT_PRECISION);
    let cost_curve = generate_cost_curve(plan_a, plan_b, DEFAULT_CURVE_POINTS);
    let (better_plan_below_breakeven, better_plan_above_breakeven) =
        verdicts(plan_a, plan_b, break_even_point, &cost_curve);
    let analysis = analyze_break_even(plan_a, plan_b, break_even_point, &cost_curve, config);

    BreakEvenResult {
        plan1: plan_a.clone(),
        plan2: plan_b.clone(),
        break_even_point,
        better_plan_below_breakeven,
        better_plan_above_breakeven,
        cost_curve,
        analysis,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::plan::create_plan_from_tier;
    use crate::types::MetalTier;

    fn bronze() -> PlanDetails {
        PlanDetails::new("Bronze", 250.0, 7_000.0, 0.4, 9_450.0).unwrap()
    }

    fn gold() -> PlanDetails {
        PlanDetails::new("Gold", 500.0, 1_500.0, 0.2, 8_700.0).unwrap()
    }

    #[test]
    fn bronze_vs_gold_crosses_between_zero_and_ten_thousand() {
        let point = find_break_even_point(&bronze(), &gold(), DEFAULT_PRECISION)
            .expect("bronze and gold must cross");
        assert!(point > 0.0 && point < 10_000.0, "break-even {point} outside (0, 10000)");
        // Exact crossing: 3000 + x = 6000 + 1500 + 0.2(x − 1500) → x = 5250.
        assert!((point - 5_250.0).abs() <= DEFAULT_PRECISION, "break-even {point} not near 5250");
    }

    #[test]
    fn tighter_precision_converges_on_exact_crossing() {
        let point = find_break_even_point(&bronze(), &gold(), 1.0).unwrap();
        assert!((point - 5_250.0).abs() <= 1.0, "break-even {point}");
    }

    #[test]
    fn break_even_is_symmetric_for_worked_example() {
        assert_eq!(
            find_break_even_point(&bronze(), &gold(), DEFAULT_PRECISION),
            find_break_even_point(&gold(), &bronze(), DEFAULT_PRECISION),
        );
    }

    #[test]
    fn dominant_plan_has_no_break_even() {
        let cheap = PlanDetails::new("Cheap", 200.0, 1_000.0, 0.1, 3_000.0).unwrap();
        let pricey = PlanDetails::new("Pricey", 300.0, 2_000.0, 0.2, 6_000.0).unwrap();
        assert_eq!(find_break_even_point(&cheap, &pricey, DEFAULT_PRECISION), None);

        let curve = generate_cost_curve(&cheap, &pricey, SAMPLE_INTERVALS);
        assert!(curve.iter().all(|p| p.cheaper_plan == CheaperPlan::Plan1));

        let result = compare_break_even(&cheap, &pricey, &PolicyYearConfig::canonical());
        assert_eq!(result.better_plan_below_breakeven, PlanVerdict::Always1);
        assert_eq!(result.better_plan_above_breakeven, PlanVerdict::Always1);
        assert_eq!(result.analysis.recommended_plan, CheaperPlan::Plan1);

        let swapped = compare_break_even(&pricey, &cheap, &PolicyYearConfig::canonical());
        assert_eq!(swapped.better_plan_below_breakeven, PlanVerdict::Always2);
    }

    #[test]
    fn zero_ceiling_returns_none() {
        let a = PlanDetails::new("A", 100.0, 0.0, 0.0, 0.0).unwrap();
        let b = PlanDetails::new("B", 200.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(find_break_even_point(&a, &b, DEFAULT_PRECISION), None);
        let curve = generate_cost_curve(&a, &b, 4);
        assert_eq!(curve.len(), 5);
        assert!(curve.iter().all(|p| p.medical_expense == 0.0));
    }

    #[test]
    fn cost_curve_shape_and_consistency() {
        let curve = generate_cost_curve(&bronze(), &gold(), DEFAULT_CURVE_POINTS);
        assert_eq!(curve.len(), DEFAULT_CURVE_POINTS + 1);
        assert_eq!(curve[0].medical_expense, 0.0);
        assert_eq!(curve[0].plan1_total_cost, 3_000.0);
        assert_eq!(curve[0].plan2_total_cost, 6_000.0);
        assert_eq!(curve[0].cheaper_plan, CheaperPlan::Plan1);
        let last = curve.last().unwrap();
        assert_eq!(last.medical_expense, search_ceiling(&bronze(), &gold()));
        assert_eq!(last.cheaper_plan, CheaperPlan::Plan2);
    }

    #[test]
    fn identical_plans_are_equal_everywhere() {
        let config = PolicyYearConfig::canonical();
        let a = create_plan_from_tier("A", MetalTier::Silver, 400.0, &config).unwrap();
        let result = compare_break_even(&a, &a.clone(), &config);
        assert_eq!(result.break_even_point, None);
        assert!(result.cost_curve.iter().all(|p| p.cheaper_plan == CheaperPlan::Equal));
        assert_eq!(result.analysis.recommended_plan, CheaperPlan::Equal);
        assert!(result.analysis.plan1_advantages.is_empty());
    }

    #[test]
    fn crossing_on_a_grid_point_is_still_found() {
        // Same premium, so the difference is zero on [0, 1000]. A is cheaper
        // on (1000, 5000) and B is cheaper after; x = 5000 is grid point 25.
        let a = PlanDetails::new("A", 100.0, 1_000.0, 0.5, 5_000.0).unwrap();
        let b = PlanDetails::new("B", 100.0, 3_000.0, 0.0, 3_000.0).unwrap();
        let point = find_break_even_point(&a, &b, 1.0).expect("crossing expected");
        assert_eq!(point, 5_000.0);
        assert_eq!(find_break_even_point(&b, &a, 1.0), Some(point));
    }

    #[test]
    fn verdicts_follow_the_first_crossing_when_curves_cross_twice() {
        // A: 1200 + min(0.5x, 1000); B: 1299.96 + min(0.1x, 5000).
        // A is cheaper below ~250, B between ~250 and ~9000, A again near the ceiling.
        let a = PlanDetails::new("A", 100.0, 0.0, 0.5, 1_000.0).unwrap();
        let b = PlanDetails::new("B", 108.33, 0.0, 0.1, 5_000.0).unwrap();
        let config = PolicyYearConfig::canonical();
        let result = compare_break_even(&a, &b, &config);
        let point = result.break_even_point.expect("first crossing expected");
        assert!((point - 250.0).abs() <= DEFAULT_PRECISION, "break-even {point}");
        assert!(a.annual_cost(point / 2.0) < b.annual_cost(point / 2.0));
        assert_eq!(result.better_plan_below_breakeven, PlanVerdict::Plan1);
        assert_eq!(result.better_plan_above_breakeven, PlanVerdict::Plan2);
        let summary = &result.analysis.summary;
        assert!(summary.starts_with("A is cheaper when"), "{summary}");
        // 250 <= 5000: the high-spend side wins the recommendation.
        assert_eq!(result.analysis.recommended_plan, CheaperPlan::Plan2);

        let swapped = compare_break_even(&b, &a, &config);
        assert_eq!(swapped.better_plan_below_breakeven, PlanVerdict::Plan2);
        assert_eq!(swapped.better_plan_above_breakeven, PlanVerdict::Plan1);
    }

    #[test]
    fn analysis_recommends_by_typical_spending() {
        let config = PolicyYearConfig::canonical();
        let result = compare_break_even(&bronze(), &gold(), &config);
        assert_eq!(result.better_plan_below_breakeven, PlanVerdict::Plan1);
        assert_eq!(result.better_plan_above_breakeven, PlanVerdict::Plan2);
        // 5250 > 5000: the low-spend winner (Bronze) is recommended.
        assert_eq!(result.analysis.recommended_plan, CheaperPlan::Plan1);
        assert!(result.analysis.summary.contains("Bronze is cheaper"));

        let mut low_bar = config.clone();
        low_bar.typical_annual_spending = 6_000.0;
        let result = compare_break_even(&bronze(), &gold(), &low_bar);
        assert_eq!(result.analysis.recommended_plan, CheaperPlan::Plan2);
    }

    #[test]
    fn analysis_lists_advantages() {
        let config = PolicyYearConfig::canonical();
        let analysis = compare_break_even(&bronze(), &gold(), &config).analysis;
        assert_eq!(analysis.plan1_advantages.len(), 1);
        assert!(analysis.plan1_advantages[0].starts_with("Lower monthly premium"));
        assert_eq!(analysis.plan2_advantages.len(), 3);
    }

    #[test]
    fn hsa_thresholds_come_from_config() {
        let mut config = PolicyYearConfig::canonical();
        let plan = PlanDetails::new("H", 300.0, 1_700.0, 0.2, 8_000.0).unwrap();
        let other = gold();
        assert!(compare_break_even(&plan, &other, &config).analysis.plan1_hsa_eligible);
        config.hsa.min_deductible_self = 2_000.0;
        assert!(!compare_break_even(&plan, &other, &config).analysis.plan1_hsa_eligible);
    }

    fn plan_strategy() -> impl Strategy<Value = PlanDetails> {
        (0.0..1_500.0f64, 0.0..9_000.0f64, 0.0..=1.0f64, 0.0..9_000.0f64).prop_map(
            |(premium, deductible, coinsurance, extra)| {
                PlanDetails::new("p", premium, deductible, coinsurance, deductible + extra).unwrap()
            },
        )
    }

    proptest! {
        #[test]
        fn break_even_symmetric(a in plan_strategy(), b in plan_strategy()) {
            prop_assert_eq!(
                find_break_even_point(&a, &b, DEFAULT_PRECISION),
                find_break_even_point(&b, &a, DEFAULT_PRECISION)
            );
        }

        #[test]
        fn dominated_plan_never_crosses(
            b in plan_strategy(),
            premium_cut in 1.0..500.0f64,
            ded_cut in 0.0..1.0f64,
            coins_cut in 0.0..1.0f64,
        ) {
            let deductible = b.deductible() * ded_cut;
            let a = PlanDetails::new(
                "a",
                (b.monthly_premium() - premium_cut).max(0.0),
                deductible,
                b.coinsurance() * coins_cut,
                b.out_of_pocket_max().max(deductible),
            ).unwrap();
            prop_assume!(a.monthly_premium() < b.monthly_premium());
            prop_assert_eq!(find_break_even_point(&a, &b, DEFAULT_PRECISION), None);
            for p in generate_cost_curve(&a, &b, SAMPLE_INTERVALS) {
                prop_assert_eq!(p.cheaper_plan, CheaperPlan::Plan1);
            }
        }

        #[test]
        fn cost_curve_is_consistent(a in plan_strategy(), b in plan_strategy(), n in 0usize..40) {
            let curve = generate_cost_curve(&a, &b, n);
            prop_assert_eq!(curve.len(), n + 1);
            prop_assert_eq!(curve[0].medical_expense, 0.0);
            for p in &curve {
                prop_assert_eq!(p.savings_with_plan1, p.plan2_total_cost - p.plan1_total_cost);
                let expected = if p.savings_with_plan1 > 0.0 {
                    CheaperPlan::Plan1
                } else if p.savings_with_plan1 < 0.0 {
                    CheaperPlan::Plan2
                } else {
                    CheaperPlan::Equal
                };
                prop_assert_eq!(p.cheaper_plan, expected);
            }
        }
    }
}
