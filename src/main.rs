use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coverwise::breakeven::compare_break_even;
use coverwise::comparison::{UsageProfile, compare_plans, quick_comparison};
use coverwise::config::{PolicyYearConfig, PolicyYearTable};
use coverwise::hsa::{HsaProjectionInput, project_hsa};
use coverwise::monte_carlo::{
    MonteCarloParams, MonteCarloResult, RunSpread, analyze_monte_carlo, run_monte_carlo,
    summarize_runs,
};
use coverwise::plan::{PlanDetails, create_plan_from_tier};
use coverwise::types::MetalTier;
use coverwise::utilization::{HealthProfile, calculate_utilization_score};

#[derive(Parser, Debug)]
#[command(name = "coverwise")]
#[command(version)]
#[command(
    about = "Health insurance cost calculators: break-even, comparison, risk and HSA projection"
)]
struct Cli {
    /// Policy-year table (JSON object or array); built-in 2024 figures when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Plan year to use from the table; latest when omitted
    #[arg(long, global = true)]
    year: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Break-even medical spend between two plans ({plan_a, plan_b})
    Breakeven { input: PathBuf },
    /// Full side-by-side comparison ({plan_a, plan_b, profile?})
    Compare { input: PathBuf },
    /// Four-question comparison ({plan_a, plan_b})
    Quick { input: PathBuf },
    /// Utilization score of a health profile
    Score { input: PathBuf },
    /// Monte Carlo out-of-pocket risk
    Simulate {
        /// Expected raw annual claims
        #[arg(long, required_unless_present = "profile", conflicts_with = "profile")]
        base_cost: Option<f64>,
        /// Health profile whose expected claims become the base cost
        #[arg(long)]
        profile: Option<PathBuf>,
        #[arg(long)]
        deductible: f64,
        #[arg(long, default_value_t = 0.2)]
        coinsurance: f64,
        #[arg(long)]
        oop_max: f64,
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Independent seeds to run in parallel and summarise
        #[arg(long)]
        runs: Option<u64>,
    },
    /// HSA tax-benefit projection ({projection, plan?})
    Hsa { input: PathBuf },
}

/// A plan given in full or by metal tier.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanSpec {
    Tier { name: String, tier: MetalTier, monthly_premium: f64 },
    Full(PlanDetails),
}

impl PlanSpec {
    fn resolve(self, config: &PolicyYearConfig) -> coverwise::Result<PlanDetails> {
        match self {
            PlanSpec::Tier { name, tier, monthly_premium } => {
                create_plan_from_tier(name, tier, monthly_premium, config)
            }
            PlanSpec::Full(plan) => Ok(plan),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanPair {
    plan_a: PlanSpec,
    plan_b: PlanSpec,
    #[serde(default)]
    profile: Option<UsageProfile>,
}

impl PlanPair {
    fn resolve(
        self,
        config: &PolicyYearConfig,
    ) -> Result<(PlanDetails, PlanDetails, Option<UsageProfile>)> {
        let a = self.plan_a.resolve(config).context("plan_a")?;
        let b = self.plan_b.resolve(config).context("plan_b")?;
        Ok((a, b, self.profile))
    }
}

#[derive(Debug, Deserialize)]
struct HsaRequest {
    projection: HsaProjectionInput,
    #[serde(default)]
    plan: Option<PlanSpec>,
}

#[derive(Debug, Serialize)]
struct MultiRunReport {
    runs: u64,
    start_seed: u64,
    params: MonteCarloParams,
    spread: RunSpread,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn policy_year(cli: &Cli) -> Result<PolicyYearConfig> {
    let table = match &cli.config {
        Some(path) => PolicyYearTable::load(path)
            .with_context(|| format!("failed to load policy-year table {}", path.display()))?,
        None => PolicyYearTable::canonical(),
    };
    let config = match cli.year {
        Some(year) => table.for_year(year)?,
        None => table.latest().context("policy-year table is empty")?,
    };
    Ok(config.clone())
}

/// Seeds for `--runs` count up from `--seed`, wrapping at `u64::MAX`.
fn seed_for_run(start_seed: u64, run: u64) -> u64 {
    start_seed.wrapping_add(run)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = policy_year(&cli)?;
    info!(plan_year = config.plan_year, "loaded policy-year configuration");

    match cli.command {
        Command::Breakeven { input } => {
            let (a, b, _) = read_json::<PlanPair>(&input)?.resolve(&config)?;
            print_json(&compare_break_even(&a, &b, &config))
        }
        Command::Compare { input } => {
            let (a, b, profile) = read_json::<PlanPair>(&input)?.resolve(&config)?;
            print_json(&compare_plans(&a, &b, profile.as_ref(), &config))
        }
        Command::Quick { input } => {
            let (a, b, _) = read_json::<PlanPair>(&input)?.resolve(&config)?;
            print_json(&quick_comparison(&a, &b, &config))
        }
        Command::Score { input } => {
            let profile: HealthProfile = read_json(&input)?;
            print_json(&calculate_utilization_score(&profile))
        }
        Command::Simulate {
            base_cost,
            profile,
            deductible,
            coinsurance,
            oop_max,
            iterations,
            seed,
            runs,
        } => {
            let base_cost = match (base_cost, profile) {
                (Some(cost), _) => cost,
                (None, Some(path)) => {
                    let score = calculate_utilization_score(&read_json::<HealthProfile>(&path)?);
                    info!(
                        level = ?score.level,
                        claims = score.expected_annual_claims,
                        "base cost from profile"
                    );
                    score.expected_annual_claims
                }
                (None, None) => anyhow::bail!("either --base-cost or --profile is required"),
            };
            let iterations = iterations.unwrap_or(config.monte_carlo.default_iterations);
            let params = MonteCarloParams::new(base_cost, deductible, oop_max, iterations)
                .with_coinsurance(coinsurance);

            match runs {
                None => {
                    let mut rng = ChaCha20Rng::seed_from_u64(seed);
                    print_json(&analyze_monte_carlo(&params, &config, &mut rng)?)
                }
                Some(n) => {
                    if n < 2 {
                        warn!(runs = n, "cross-run spread needs at least 2 runs");
                    }
                    let results: Vec<MonteCarloResult> = (0..n)
                        .into_par_iter()
                        .map(|i| {
                            let mut rng = ChaCha20Rng::seed_from_u64(seed_for_run(seed, i));
                            run_monte_carlo(&params, &config.monte_carlo, &mut rng)
                        })
                        .collect::<coverwise::Result<_>>()?;
                    let spread = summarize_runs(&results).context("no simulation runs requested")?;
                    print_json(&MultiRunReport { runs: n, start_seed: seed, params, spread })
                }
            }
        }
        Command::Hsa { input } => {
            let request: HsaRequest = read_json(&input)?;
            let plan = request.plan.map(|p| p.resolve(&config)).transpose()?;
            print_json(&project_hsa(&request.projection, plan.as_ref(), &config))
        }
    }
}
