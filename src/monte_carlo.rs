//! One-year medical-cost risk simulation.
//!
//! Raw annual claims are drawn from a lognormal whose mean equals the
//! supplied base cost: `mu = ln(base_cost) − sigma²/2`, so
//! `E[X] = exp(mu + sigma²/2) = base_cost`. Each draw is passed through the
//! plan's deductible / coinsurance / out-of-pocket-max formula to give the
//! member's post-insurance cost.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::{MonteCarloSettings, PolicyYearConfig};
use crate::error::{CoverageError, Result};
use crate::plan::PlanDetails;
use crate::types::format_currency;

pub const DEFAULT_COINSURANCE: f64 = 0.2;

/// Inputs of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloParams {
    /// Expected raw annual medical claims.
    pub base_cost: f64,
    pub deductible: f64,
    #[serde(default = "default_coinsurance")]
    pub coinsurance: f64,
    pub out_of_pocket_max: f64,
    pub iterations: usize,
}

fn default_coinsurance() -> f64 {
    DEFAULT_COINSURANCE
}

impl MonteCarloParams {
    pub fn new(base_cost: f64, deductible: f64, out_of_pocket_max: f64, iterations: usize) -> Self {
        MonteCarloParams {
            base_cost,
            deductible,
            coinsurance: DEFAULT_COINSURANCE,
            out_of_pocket_max,
            iterations,
        }
    }

    pub fn with_coinsurance(mut self, coinsurance: f64) -> Self {
        self.coinsurance = coinsurance;
        self
    }

    pub fn for_plan(plan: &PlanDetails, base_cost: f64, iterations: usize) -> Self {
        MonteCarloParams {
            base_cost,
            deductible: plan.deductible(),
            coinsurance: plan.coinsurance(),
            out_of_pocket_max: plan.out_of_pocket_max(),
            iterations,
        }
    }

    /// Validated cost-sharing structure the draws are run through.
    fn cost_sharing(&self) -> Result<PlanDetails> {
        if self.iterations == 0 {
            return Err(CoverageError::InvalidSimulation {
                reason: "iterations must be at least 1".to_string(),
            });
        }
        if !self.base_cost.is_finite() || self.base_cost <= 0.0 {
            return Err(CoverageError::InvalidSimulation {
                reason: format!("base cost must be positive, got {}", self.base_cost),
            });
        }
        PlanDetails::new(
            "simulated",
            0.0,
            self.deductible,
            self.coinsurance,
            self.out_of_pocket_max,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub median: f64,
    pub mean: f64,
    pub standard_deviation: f64,
    pub percentiles: Percentiles,
    pub probability_of_exceeding_deductible: f64,
    /// Fraction of draws whose raw claims exceed the out-of-pocket maximum.
    pub probability_of_hitting_oop_max: f64,
    /// Fraction of draws where the member's own share is capped, i.e. raw
    /// claims pass `deductible + (oop_max - deductible) / coinsurance`.
    pub probability_of_reaching_cost_cap: f64,
    /// 95th-percentile post-insurance cost.
    pub expected_value_at_risk: f64,
    pub simulation_count: usize,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskInterpretation {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloAnalysis {
    pub params: MonteCarloParams,
    pub result: MonteCarloResult,
    pub interpretation: RiskInterpretation,
    pub histogram_data: Vec<HistogramBucket>,
}

/// Linear interpolation between order statistics of a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = if n > 1 {
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    (mean, variance.sqrt())
}

/// Draw the post-insurance cost samples (sorted ascending) and summarise them.
fn simulate(
    params: &MonteCarloParams,
    settings: &MonteCarloSettings,
    rng: &mut impl Rng,
) -> Result<(MonteCarloResult, Vec<f64>)> {
    let plan = params.cost_sharing()?;
    let sigma = settings.sigma;
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(CoverageError::InvalidSimulation {
            reason: format!("lognormal sigma must be positive, got {sigma}"),
        });
    }
    let mu = params.base_cost.ln() - sigma * sigma / 2.0;
    let dist = LogNormal::new(mu, sigma).map_err(|e| CoverageError::InvalidSimulation {
        reason: format!("lognormal(mu={mu}, sigma={sigma}): {e}"),
    })?;
    let cap_threshold = plan.claims_to_reach_out_of_pocket_max();

    let start = Instant::now();
    let mut costs = Vec::with_capacity(params.iterations);
    let mut over_deductible = 0usize;
    let mut over_oop_max = 0usize;
    let mut at_cost_cap = 0usize;
    for _ in 0..params.iterations {
        let raw = dist.sample(rng);
        if raw > plan.deductible() {
            over_deductible += 1;
        }
        if raw > plan.out_of_pocket_max() {
            over_oop_max += 1;
        }
        if cap_threshold.is_some_and(|t| raw > t) {
            at_cost_cap += 1;
        }
        costs.push(plan.out_of_pocket(raw));
    }

    costs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (mean, standard_deviation) = mean_and_std(&costs);
    let percentiles = Percentiles {
        p5: percentile(&costs, 0.05),
        p10: percentile(&costs, 0.10),
        p25: percentile(&costs, 0.25),
        p50: percentile(&costs, 0.50),
        p75: percentile(&costs, 0.75),
        p90: percentile(&costs, 0.90),
        p95: percentile(&costs, 0.95),
        p99: percentile(&costs, 0.99),
    };
    let n = params.iterations as f64;
    let execution_time_ms = start.elapsed().as_secs_f64() * 1_000.0;

    let result = MonteCarloResult {
        median: percentiles.p50,
        mean,
        standard_deviation,
        percentiles,
        probability_of_exceeding_deductible: over_deductible as f64 / n,
        probability_of_hitting_oop_max: over_oop_max as f64 / n,
        probability_of_reaching_cost_cap: at_cost_cap as f64 / n,
        expected_value_at_risk: percentiles.p95,
        simulation_count: params.iterations,
        execution_time_ms,
    };
    Ok((result, costs))
}

/// Run `params.iterations` draws and summarise the post-insurance cost distribution.
pub fn run_monte_carlo(
    params: &MonteCarloParams,
    settings: &MonteCarloSettings,
    rng: &mut impl Rng,
) -> Result<MonteCarloResult> {
    simulate(params, settings, rng).map(|(result, _)| result)
}

/// Equal-width buckets over `[min, max]` of `sorted_costs`. Percentages are
/// apportioned in tenths of a percent by largest remainder so they sum to
/// exactly 100.
pub fn histogram(sorted_costs: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    let (Some(&lo), Some(&hi)) = (sorted_costs.first(), sorted_costs.last()) else {
        return Vec::new();
    };
    let buckets = if hi > lo { buckets.max(1) } else { 1 };
    if buckets == 1 && hi > lo {
        warn!("histogram collapsed to a single bucket");
    }
    let width = (hi - lo) / buckets as f64;

    let mut counts = vec![0usize; buckets];
    for &c in sorted_costs {
        let idx = if width > 0.0 { ((c - lo) / width).floor() as usize } else { 0 };
        counts[idx.min(buckets - 1)] += 1;
    }

    const TOTAL_TENTHS: usize = 1_000;
    let n = sorted_costs.len();
    let exact: Vec<f64> =
        counts.iter().map(|&c| c as f64 * TOTAL_TENTHS as f64 / n as f64).collect();
    let mut tenths: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let shortfall = TOTAL_TENTHS - tenths.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..buckets).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });
    for &i in order.iter().take(shortfall) {
        tenths[i] += 1;
    }

    (0..buckets)
        .map(|i| {
            let min = lo + width * i as f64;
            let max = if i + 1 == buckets { hi } else { lo + width * (i + 1) as f64 };
            HistogramBucket {
                label: format!("{}–{}", format_currency(min), format_currency(max)),
                min,
                max,
                percentage: tenths[i] as f64 / 10.0,
            }
        })
        .collect()
}

/// Classify the simulated distribution and describe it in plain language.
pub fn interpret(result: &MonteCarloResult, params: &MonteCarloParams) -> RiskInterpretation {
    let p = &result.percentiles;
    let tail_ratio = p.p95 / result.median.max(1.0);

    let risk_level = if result.probability_of_reaching_cost_cap >= 0.20 {
        RiskLevel::VeryHigh
    } else if result.probability_of_reaching_cost_cap >= 0.05 || p.p75 >= params.deductible {
        RiskLevel::High
    } else if result.probability_of_exceeding_deductible >= 0.15 || tail_ratio > 10.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let summary = format!(
        "In a typical year you would pay about {} out of pocket; in a bad year (95th percentile) about {}.",
        format_currency(result.median),
        format_currency(p.p95),
    );

    let mut insights = vec![
        format!(
            "There is a {:.0}% chance your medical costs exceed the {} deductible.",
            result.probability_of_exceeding_deductible * 100.0,
            format_currency(params.deductible),
        ),
        format!(
            "There is a {:.0}% chance your medical costs exceed the {} out-of-pocket maximum, and a {:.0}% chance your own share reaches it.",
            result.probability_of_hitting_oop_max * 100.0,
            format_currency(params.out_of_pocket_max),
            result.probability_of_reaching_cost_cap * 100.0,
        ),
        format!(
            "Half of simulated years cost between {} and {}.",
            format_currency(p.p25),
            format_currency(p.p75),
        ),
    ];
    if result.mean > result.median * 1.5 && result.mean > 0.0 {
        insights.push(format!(
            "Costs are skewed: the average ({}) is well above the typical year ({}) because of rare expensive years.",
            format_currency(result.mean),
            format_currency(result.median),
        ));
    }

    let recommendations = match risk_level {
        RiskLevel::VeryHigh => vec![
            format!(
                "Budget for the full out-of-pocket maximum of {}.",
                format_currency(params.out_of_pocket_max)
            ),
            "A plan with a lower out-of-pocket maximum may be worth a higher premium.".to_string(),
        ],
        RiskLevel::High => vec![
            format!("Keep at least {} set aside for medical costs.", format_currency(p.p90)),
            "Compare plans with lower deductibles against their premium difference.".to_string(),
        ],
        RiskLevel::Moderate => vec![
            format!("An emergency fund of {} covers three in four years.", format_currency(p.p75)),
            "An HSA can cover occasional high-cost years with pre-tax money.".to_string(),
        ],
        RiskLevel::Low => vec![
            "A higher-deductible plan with lower premiums is likely to save money.".to_string(),
            "Pair it with an HSA to build tax-free savings for future care.".to_string(),
        ],
    };

    RiskInterpretation { risk_level, summary, insights, recommendations }
}

/// Run the simulation and attach the interpretation and histogram.
#[instrument(skip_all, fields(iterations = params.iterations, base_cost = params.base_cost))]
pub fn analyze_monte_carlo(
    params: &MonteCarloParams,
    config: &PolicyYearConfig,
    rng: &mut impl Rng,
) -> Result<MonteCarloAnalysis> {
    let (result, costs) = simulate(params, &config.monte_carlo, rng)?;
    let histogram_data = histogram(&costs, config.monte_carlo.histogram_buckets);
    let interpretation = interpret(&result, params);
    info!(
        elapsed_ms = result.execution_time_ms,
        median = result.median,
        p95 = result.percentiles.p95,
        "monte carlo simulation complete"
    );
    Ok(MonteCarloAnalysis { params: *params, result, interpretation, histogram_data })
}

/// Summary statistics of one metric across independent runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

fn dist_stats(values: &mut [f64]) -> Option<DistStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let (mean, std_dev) = mean_and_std(values);
    Some(DistStats {
        n: values.len(),
        min: values[0],
        p5: percentile(values, 0.05),
        p50: percentile(values, 0.50),
        p95: percentile(values, 0.95),
        max: values[values.len() - 1],
        mean,
        std_dev,
    })
}

/// Cross-run spread of the headline figures, for judging seed sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpread {
    pub median: DistStats,
    pub value_at_risk: DistStats,
    pub probability_of_hitting_oop_max: DistStats,
}

/// `None` when `results` is empty.
pub fn summarize_runs(results: &[MonteCarloResult]) -> Option<RunSpread> {
    let mut medians: Vec<f64> = results.iter().map(|r| r.median).collect();
    let mut vars: Vec<f64> = results.iter().map(|r| r.expected_value_at_risk).collect();
    let mut oop: Vec<f64> = results.iter().map(|r| r.probability_of_hitting_oop_max).collect();
    Some(RunSpread {
        median: dist_stats(&mut medians)?,
        value_at_risk: dist_stats(&mut vars)?,
        probability_of_hitting_oop_max: dist_stats(&mut oop)?,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    fn settings() -> MonteCarloSettings {
        PolicyYearConfig::canonical().monte_carlo
    }

    #[test]
    fn same_seed_same_result() {
        let params = MonteCarloParams::new(4_000.0, 1_500.0, 8_700.0, 2_000);
        let mut a = run_monte_carlo(&params, &settings(), &mut rng()).unwrap();
        let mut b = run_monte_carlo(&params, &settings(), &mut rng()).unwrap();
        a.execution_time_ms = 0.0;
        b.execution_time_ms = 0.0;
        assert_eq!(a, b);

        let mut other = ChaCha20Rng::seed_from_u64(7);
        let mut c = run_monte_carlo(&params, &settings(), &mut other).unwrap();
        c.execution_time_ms = 0.0;
        assert_ne!(a, c);
    }

    /// With no cost sharing limits the post-insurance mean tracks the base cost.
    #[test]
    fn uncapped_mean_tracks_base_cost() {
        let params = MonteCarloParams::new(5_000.0, 0.0, 1e12, 20_000).with_coinsurance(1.0);
        let result = run_monte_carlo(&params, &settings(), &mut rng()).unwrap();
        let lo = 5_000.0 * 0.9;
        let hi = 5_000.0 * 1.1;
        assert!(
            result.mean >= lo && result.mean <= hi,
            "mean {:.0} outside [{lo:.0}, {hi:.0}]",
            result.mean
        );
        assert_eq!(result.probability_of_hitting_oop_max, 0.0);
        assert_eq!(result.probability_of_exceeding_deductible, 1.0);
    }

    #[test]
    fn costs_never_exceed_oop_max() {
        let params = MonteCarloParams::new(20_000.0, 2_000.0, 6_000.0, 5_000);
        let result = run_monte_carlo(&params, &settings(), &mut rng()).unwrap();
        assert!(result.percentiles.p99 <= 6_000.0);
        assert!(result.probability_of_hitting_oop_max > 0.0);
        assert_eq!(result.expected_value_at_risk, result.percentiles.p95);
        assert_eq!(result.median, result.percentiles.p50);
        assert_eq!(result.simulation_count, 5_000);
    }

    #[test]
    fn oop_probability_counts_raw_claims_above_max() {
        let params =
            MonteCarloParams::new(10_000.0, 1_000.0, 4_000.0, 20_000).with_coinsurance(0.3);
        let (result, costs) = simulate(&params, &settings(), &mut rng()).unwrap();
        // Raw claims above 4000 are exactly the draws paying more than 1000 + 0.3 × 3000.
        let over =
            costs.iter().filter(|&&c| c > 1_900.0 + 1e-6).count() as f64 / costs.len() as f64;
        let hitting = result.probability_of_hitting_oop_max;
        assert!((hitting - over).abs() < 1e-3);
        assert!(hitting > 0.6, "{hitting}");
        assert!(result.probability_of_reaching_cost_cap < hitting);
    }

    #[test]
    fn cost_cap_probability_matches_capped_samples() {
        let params =
            MonteCarloParams::new(10_000.0, 1_000.0, 4_000.0, 4_000).with_coinsurance(0.3);
        let (result, costs) = simulate(&params, &settings(), &mut rng()).unwrap();
        let capped =
            costs.iter().filter(|&&c| c >= 4_000.0 - 1e-9).count() as f64 / costs.len() as f64;
        assert!((result.probability_of_reaching_cost_cap - capped).abs() < 1e-3);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let s = settings();
        let mut r = rng();
        assert!(matches!(
            run_monte_carlo(&MonteCarloParams::new(1_000.0, 0.0, 1_000.0, 0), &s, &mut r),
            Err(CoverageError::InvalidSimulation { .. })
        ));
        assert!(matches!(
            run_monte_carlo(&MonteCarloParams::new(0.0, 0.0, 1_000.0, 10), &s, &mut r),
            Err(CoverageError::InvalidSimulation { .. })
        ));
        assert!(matches!(
            run_monte_carlo(&MonteCarloParams::new(1_000.0, 5_000.0, 1_000.0, 10), &s, &mut r),
            Err(CoverageError::InvalidPlanParameters { .. })
        ));
        let mut bad_sigma = s;
        bad_sigma.sigma = -1.0;
        let params = MonteCarloParams::new(1_000.0, 0.0, 1_000.0, 10);
        assert!(run_monte_carlo(&params, &bad_sigma, &mut r).is_err());
    }

    #[test]
    fn histogram_known_values() {
        let costs = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let buckets = histogram(&costs, 5);
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[0].min, 0.0);
        assert_eq!(buckets[4].max, 10.0);
        // 2, 2, 2, 2, 3 of 11 samples; naive rounding gives 18.2 × 4 + 27.3 = 100.1.
        // Largest remainder gives 18.2 × 4 + 27.2.
        let total: f64 = buckets.iter().map(|b| b.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9, "total {total}");
        assert_eq!(buckets[0].percentage, 18.2);
        assert_eq!(buckets[4].percentage, 27.2);
    }

    #[test]
    fn histogram_degenerate_and_empty() {
        let buckets = histogram(&[500.0; 10], 10);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].percentage, 100.0);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn analysis_includes_histogram_and_interpretation() {
        let config = PolicyYearConfig::canonical();
        let params = MonteCarloParams::new(4_000.0, 1_500.0, 8_700.0, 3_000);
        let analysis = analyze_monte_carlo(&params, &config, &mut rng()).unwrap();
        assert_eq!(analysis.histogram_data.len(), config.monte_carlo.histogram_buckets);
        let total: f64 = analysis.histogram_data.iter().map(|b| b.percentage).sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert!(!analysis.interpretation.insights.is_empty());
        assert!(!analysis.interpretation.recommendations.is_empty());
    }

    #[test]
    fn risk_level_scales_with_base_cost() {
        let config = PolicyYearConfig::canonical();
        let low = MonteCarloParams::new(300.0, 5_000.0, 9_000.0, 3_000);
        let high = MonteCarloParams::new(40_000.0, 1_000.0, 5_000.0, 3_000);
        let low = analyze_monte_carlo(&low, &config, &mut rng()).unwrap();
        let high = analyze_monte_carlo(&high, &config, &mut rng()).unwrap();
        assert_eq!(low.interpretation.risk_level, RiskLevel::Low);
        assert_eq!(high.interpretation.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn summarize_runs_across_seeds() {
        let params = MonteCarloParams::new(4_000.0, 1_500.0, 8_700.0, 1_000);
        let results: Vec<MonteCarloResult> = (0..5u64)
            .map(|seed| {
                let mut r = ChaCha20Rng::seed_from_u64(seed);
                run_monte_carlo(&params, &settings(), &mut r).unwrap()
            })
            .collect();
        let spread = summarize_runs(&results).unwrap();
        assert_eq!(spread.median.n, 5);
        assert!(spread.median.min <= spread.median.p50 && spread.median.p50 <= spread.median.max);
        assert!(summarize_runs(&[]).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn percentiles_are_ordered_and_histogram_sums(
            base in 100.0..50_000.0f64,
            deductible in 0.0..8_000.0f64,
            extra in 0.0..8_000.0f64,
            coinsurance in 0.0..=1.0f64,
            seed in any::<u64>(),
        ) {
            let params = MonteCarloParams::new(base, deductible, deductible + extra, 500)
                .with_coinsurance(coinsurance);
            let mut r = ChaCha20Rng::seed_from_u64(seed);
            let config = PolicyYearConfig::canonical();
            let analysis = analyze_monte_carlo(&params, &config, &mut r).unwrap();
            let p = analysis.result.percentiles;
            prop_assert!(p.p5 <= p.p10 && p.p10 <= p.p25 && p.p25 <= p.p50);
            prop_assert!(p.p50 <= p.p75 && p.p75 <= p.p90 && p.p90 <= p.p95 && p.p95 <= p.p99);
            let total: f64 = analysis.histogram_data.iter().map(|b| b.percentage).sum();
            prop_assert!((total - 100.0).abs() < 1e-6);
        }
    }
}
