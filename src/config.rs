use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::types::MetalTier;

/// Cost-sharing defaults for a metal tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierDefaults {
    pub deductible: f64,
    pub coinsurance: f64,
    pub out_of_pocket_max: f64,
}

/// IRS HSA thresholds for one plan year (self-only coverage unless noted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsaLimits {
    /// Minimum deductible for an HSA-qualified HDHP.
    pub min_deductible_self: f64,
    /// Maximum out-of-pocket for an HSA-qualified HDHP.
    pub max_out_of_pocket_self: f64,
    pub contribution_limit_self: f64,
    pub contribution_limit_family: f64,
    pub catch_up_contribution: f64,
    pub catch_up_age: u32,
}

/// Unit prices used to turn visit / prescription counts into claims when a
/// plan has no copay for the service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceCosts {
    pub primary_visit: f64,
    pub specialist_visit: f64,
    pub generic_prescription: f64,
    pub emergency_visit: f64,
    /// Claims incurred beyond the deductible in the "Major Medical Event" scenario.
    pub major_event_claims_above_deductible: f64,
}

/// Deltas a plan comparison must exceed before it is reported as a key difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialityThresholds {
    pub monthly_premium: f64,
    pub deductible: f64,
    pub out_of_pocket_max: f64,
    pub quality_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSettings {
    /// ln-space standard deviation of the annual-cost lognormal.
    pub sigma: f64,
    pub histogram_buckets: usize,
    pub default_iterations: usize,
}

/// All policy-year constants consumed by the calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyYearConfig {
    pub plan_year: u16,
    pub tier_defaults: BTreeMap<MetalTier, TierDefaults>,
    pub hsa: HsaLimits,
    /// Reference annual medical spend used to turn a break-even point into a recommendation.
    pub typical_annual_spending: f64,
    pub service_costs: ServiceCosts,
    pub materiality: MaterialityThresholds,
    pub monte_carlo: MonteCarloSettings,
}

impl PolicyYearConfig {
    /// 2024 marketplace / IRS figures.
    pub fn canonical() -> Self {
        let tier_defaults = BTreeMap::from([
            (
                MetalTier::Bronze,
                TierDefaults { deductible: 7_000.0, coinsurance: 0.4, out_of_pocket_max: 9_450.0 },
            ),
            (
                MetalTier::Silver,
                TierDefaults { deductible: 5_000.0, coinsurance: 0.3, out_of_pocket_max: 9_450.0 },
            ),
            (
                MetalTier::Gold,
                TierDefaults { deductible: 1_500.0, coinsurance: 0.2, out_of_pocket_max: 8_700.0 },
            ),
            (
                MetalTier::Platinum,
                TierDefaults { deductible: 500.0, coinsurance: 0.1, out_of_pocket_max: 4_000.0 },
            ),
            (
                MetalTier::Hdhp,
                TierDefaults { deductible: 3_200.0, coinsurance: 0.2, out_of_pocket_max: 8_050.0 },
            ),
        ]);

        PolicyYearConfig {
            plan_year: 2024,
            tier_defaults,
            hsa: HsaLimits {
                min_deductible_self: 1_600.0,
                max_out_of_pocket_self: 8_050.0,
                contribution_limit_self: 4_150.0,
                contribution_limit_family: 8_300.0,
                catch_up_contribution: 1_000.0,
                catch_up_age: 55,
            },
            typical_annual_spending: 5_000.0,
            service_costs: ServiceCosts {
                primary_visit: 150.0,
                specialist_visit: 250.0,
                generic_prescription: 30.0,
                emergency_visit: 1_500.0,
                major_event_claims_above_deductible: 10_000.0,
            },
            materiality: MaterialityThresholds {
                monthly_premium: 50.0,
                deductible: 500.0,
                out_of_pocket_max: 1_000.0,
                quality_rating: 1.0,
            },
            monte_carlo: MonteCarloSettings {
                sigma: 1.0,
                histogram_buckets: 10,
                default_iterations: 10_000,
            },
        }
    }

    pub fn tier(&self, tier: MetalTier) -> Option<&TierDefaults> {
        self.tier_defaults.get(&tier)
    }
}

impl Default for PolicyYearConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Policy-year configurations keyed by plan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyYearTable {
    years: BTreeMap<u16, PolicyYearConfig>,
}

impl PolicyYearTable {
    pub fn canonical() -> Self {
        let config = PolicyYearConfig::canonical();
        PolicyYearTable { years: BTreeMap::from([(config.plan_year, config)]) }
    }

    pub fn from_configs(configs: impl IntoIterator<Item = PolicyYearConfig>) -> Self {
        PolicyYearTable { years: configs.into_iter().map(|c| (c.plan_year, c)).collect() }
    }

    /// Accepts either a single `PolicyYearConfig` object or a JSON array of them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let configs: Vec<PolicyYearConfig> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        Ok(Self::from_configs(configs))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn for_year(&self, year: u16) -> Result<&PolicyYearConfig> {
        self.years.get(&year).ok_or(CoverageError::UnknownPlanYear(year))
    }

    /// Most recent plan year in the table.
    pub fn latest(&self) -> Option<&PolicyYearConfig> {
        self.years.values().next_back()
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }
}

impl Default for PolicyYearTable {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_has_every_tier() {
        let config = PolicyYearConfig::canonical();
        for tier in MetalTier::ALL {
            assert!(config.tier(tier).is_some(), "missing defaults for {tier}");
        }
        let gold = config.tier(MetalTier::Gold).unwrap();
        assert_eq!(gold.deductible, 1_500.0);
        assert_eq!(gold.coinsurance, 0.2);
        assert_eq!(gold.out_of_pocket_max, 8_700.0);
    }

    #[test]
    fn table_lookup_by_year() {
        let table = PolicyYearTable::canonical();
        assert_eq!(table.for_year(2024).unwrap().plan_year, 2024);
        assert!(matches!(table.for_year(1999), Err(CoverageError::UnknownPlanYear(1999))));
        assert_eq!(table.latest().map(|c| c.plan_year), Some(2024));
    }

    #[test]
    fn json_round_trip_single_and_array() {
        let config = PolicyYearConfig::canonical();
        let single = serde_json::to_string(&config).unwrap();
        let table = PolicyYearTable::from_json_str(&single).unwrap();
        assert_eq!(table.for_year(2024).unwrap(), &config);

        let mut next = config.clone();
        next.plan_year = 2025;
        next.hsa.min_deductible_self = 1_650.0;
        let array = serde_json::to_string(&vec![config, next]).unwrap();
        let table = PolicyYearTable::from_json_str(&array).unwrap();
        assert_eq!(table.years().collect::<Vec<_>>(), vec![2024, 2025]);
        assert_eq!(table.latest().unwrap().hsa.min_deductible_self, 1_650.0);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = PolicyYearTable::from_json_str("{\"plan_year\": 2024}").unwrap_err();
        assert!(matches!(err, CoverageError::Config(_)));
    }
}
