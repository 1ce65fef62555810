//! Household healthcare-utilization scoring.
//!
//! Self-reported usage buckets are turned into an additive 0–100 score,
//! a utilization level, an expected-claims estimate, and plan-shape
//! recommendations.

use serde::{Deserialize, Serialize};

use crate::types::PlanType;

pub const MAX_SCORE: u32 = 100;
const POINTS_PER_CHRONIC_CONDITION: u32 = 5;
const MAX_CHRONIC_POINTS: u32 = 15;
const SPECIALTY_MEDICATION_POINTS: u32 = 10;
const PLANNED_PROCEDURE_POINTS: u32 = 15;
/// Scores below this, with no planned procedures, point to an HDHP.
const HDHP_SCORE_CEILING: u32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorVisits {
    /// 0–2 per year.
    #[default]
    ZeroToTwo,
    /// 3–5 per year.
    ThreeToFive,
    /// 6–10 per year.
    SixToTen,
    /// More than 10 per year.
    MoreThanTen,
}

impl DoctorVisits {
    fn points(self) -> u32 {
        match self {
            DoctorVisits::ZeroToTwo => 0,
            DoctorVisits::ThreeToFive => 10,
            DoctorVisits::SixToTen => 20,
            DoctorVisits::MoreThanTen => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistVisits {
    #[default]
    None,
    /// 1–3 per year.
    Occasional,
    /// Monthly or more.
    Frequent,
}

impl SpecialistVisits {
    fn points(self) -> u32 {
        match self {
            SpecialistVisits::None => 0,
            SpecialistVisits::Occasional => 12,
            SpecialistVisits::Frequent => 25,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErVisits {
    #[default]
    None,
    /// 1–2 per year.
    OneToTwo,
    /// 3 or more per year.
    ThreeOrMore,
}

impl ErVisits {
    fn points(self) -> u32 {
        match self {
            ErVisits::None => 0,
            ErVisits::OneToTwo => 10,
            ErVisits::ThreeOrMore => 20,
        }
    }
}

/// Monthly out-of-pocket spend on prescriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicationCost {
    #[default]
    UnderFifty,
    FiftyToTwoHundred,
    TwoHundredToFiveHundred,
    FiveHundredToThousand,
    OverThousand,
}

impl MedicationCost {
    fn points(self) -> u32 {
        match self {
            MedicationCost::UnderFifty => 0,
            MedicationCost::FiftyToTwoHundred => 5,
            MedicationCost::TwoHundredToFiveHundred => 10,
            MedicationCost::FiveHundredToThousand => 15,
            MedicationCost::OverThousand => 20,
        }
    }

    /// Annual prescription claims expected from this bucket.
    fn annual_claims(self) -> f64 {
        match self {
            MedicationCost::UnderFifty => 300.0,
            MedicationCost::FiftyToTwoHundred => 1_500.0,
            MedicationCost::TwoHundredToFiveHundred => 4_200.0,
            MedicationCost::FiveHundredToThousand => 9_000.0,
            MedicationCost::OverThousand => 12_000.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MedicationCost::UnderFifty => "under $50",
            MedicationCost::FiftyToTwoHundred => "$50–$200",
            MedicationCost::TwoHundredToFiveHundred => "$200–$500",
            MedicationCost::FiveHundredToThousand => "$500–$1,000",
            MedicationCost::OverThousand => "over $1,000",
        }
    }
}

/// Self-reported household healthcare usage. Missing fields score zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthProfile {
    pub doctor_visits: DoctorVisits,
    pub specialist_visits: SpecialistVisits,
    pub er_visits: ErVisits,
    pub chronic_conditions: Vec<String>,
    pub monthly_medication_cost: MedicationCost,
    pub specialty_medications: bool,
    pub planned_procedures: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtilizationLevel {
    Minimal,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl UtilizationLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            75.. => UtilizationLevel::VeryHigh,
            50.. => UtilizationLevel::High,
            25.. => UtilizationLevel::Moderate,
            10.. => UtilizationLevel::Low,
            _ => UtilizationLevel::Minimal,
        }
    }

    /// Baseline annual medical claims for a household at this level.
    fn baseline_claims(self) -> f64 {
        match self {
            UtilizationLevel::Minimal => 500.0,
            UtilizationLevel::Low => 1_500.0,
            UtilizationLevel::Moderate => 4_000.0,
            UtilizationLevel::High => 8_000.0,
            UtilizationLevel::VeryHigh => 15_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductibleTier {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationScore {
    pub score: u32,
    pub level: UtilizationLevel,
    pub expected_annual_claims: f64,
    pub recommended_deductible: DeductibleTier,
    pub recommended_plan_type: PlanType,
    pub reasoning: Vec<String>,
}

pub fn calculate_utilization_score(profile: &HealthProfile) -> UtilizationScore {
    let mut raw = 0u32;
    let mut reasoning = Vec::new();

    let doctor = profile.doctor_visits.points();
    if doctor > 0 {
        raw += doctor;
        reasoning.push(format!("Regular doctor visits add {doctor} points"));
    }

    let specialist = profile.specialist_visits.points();
    if specialist > 0 {
        raw += specialist;
        reasoning.push(format!("Specialist care adds {specialist} points"));
    }

    let er = profile.er_visits.points();
    if er > 0 {
        raw += er;
        reasoning.push(format!("Emergency room visits add {er} points"));
    }

    let conditions = profile.chronic_conditions.len() as u32;
    if conditions > 0 {
        let points = (conditions * POINTS_PER_CHRONIC_CONDITION).min(MAX_CHRONIC_POINTS);
        raw += points;
        reasoning.push(format!(
            "{conditions} chronic condition{} add{} {points} points",
            if conditions == 1 { "" } else { "s" },
            if conditions == 1 { "s" } else { "" },
        ));
    }

    let medication = profile.monthly_medication_cost.points();
    if medication > 0 {
        raw += medication;
        reasoning.push(format!(
            "Monthly medication costs of {} add {medication} points",
            profile.monthly_medication_cost.label()
        ));
    }

    if profile.specialty_medications {
        raw += SPECIALTY_MEDICATION_POINTS;
        reasoning.push(format!("Specialty medications add {SPECIALTY_MEDICATION_POINTS} points"));
    }

    if profile.planned_procedures {
        raw += PLANNED_PROCEDURE_POINTS;
        reasoning.push(format!("Planned procedures add {PLANNED_PROCEDURE_POINTS} points"));
    }

    let score = raw.min(MAX_SCORE);
    if raw > MAX_SCORE {
        reasoning.push(format!("Score capped at {MAX_SCORE} (raw total {raw})"));
    }

    let level = UtilizationLevel::from_score(score);
    let expected_annual_claims =
        level.baseline_claims() + profile.monthly_medication_cost.annual_claims();

    let recommended_deductible = if score >= 50 || profile.planned_procedures {
        DeductibleTier::Low
    } else if score >= 25 {
        DeductibleTier::Medium
    } else {
        DeductibleTier::High
    };

    let recommended_plan_type =
        if profile.specialist_visits == SpecialistVisits::Frequent || conditions > 0 {
            reasoning.push(
                "Ongoing specialist or chronic care favours a PPO's wider network".to_string(),
            );
            PlanType::Ppo
        } else if score < HDHP_SCORE_CEILING && !profile.planned_procedures {
            reasoning
                .push("Low expected usage makes an HSA-eligible HDHP cost-effective".to_string());
            PlanType::Hdhp
        } else {
            reasoning.push("Moderate usage without specialist needs suits an HMO".to_string());
            PlanType::Hmo
        };

    UtilizationScore {
        score,
        level,
        expected_annual_claims,
        recommended_deductible,
        recommended_plan_type,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn heavy_user_is_capped_at_100() {
        let profile = HealthProfile {
            doctor_visits: DoctorVisits::MoreThanTen,
            specialist_visits: SpecialistVisits::Frequent,
            er_visits: ErVisits::ThreeOrMore,
            chronic_conditions: vec!["diabetes".into(), "asthma".into()],
            monthly_medication_cost: MedicationCost::OverThousand,
            ..HealthProfile::default()
        };
        let result = calculate_utilization_score(&profile);
        assert_eq!(result.score, 100);
        assert_eq!(result.level, UtilizationLevel::VeryHigh);
        assert_eq!(result.recommended_plan_type, PlanType::Ppo);
        assert_eq!(result.recommended_deductible, DeductibleTier::Low);
        assert_eq!(result.expected_annual_claims, 15_000.0 + 12_000.0);
        assert!(result.reasoning.iter().any(|r| r.contains("capped")));
    }

    #[test]
    fn light_user_scores_zero() {
        let result = calculate_utilization_score(&HealthProfile::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.level, UtilizationLevel::Minimal);
        assert_eq!(result.recommended_plan_type, PlanType::Hdhp);
        assert_eq!(result.recommended_deductible, DeductibleTier::High);
        assert_eq!(result.expected_annual_claims, 800.0);
    }

    #[test]
    fn level_thresholds_are_exact() {
        assert_eq!(UtilizationLevel::from_score(75), UtilizationLevel::VeryHigh);
        assert_eq!(UtilizationLevel::from_score(74), UtilizationLevel::High);
        assert_eq!(UtilizationLevel::from_score(50), UtilizationLevel::High);
        assert_eq!(UtilizationLevel::from_score(49), UtilizationLevel::Moderate);
        assert_eq!(UtilizationLevel::from_score(25), UtilizationLevel::Moderate);
        assert_eq!(UtilizationLevel::from_score(24), UtilizationLevel::Low);
        assert_eq!(UtilizationLevel::from_score(10), UtilizationLevel::Low);
        assert_eq!(UtilizationLevel::from_score(9), UtilizationLevel::Minimal);
    }

    #[test]
    fn chronic_points_are_capped() {
        let profile = HealthProfile {
            chronic_conditions: (0..6).map(|i| format!("c{i}")).collect(),
            ..HealthProfile::default()
        };
        let result = calculate_utilization_score(&profile);
        assert_eq!(result.score, 15);
        assert_eq!(result.level, UtilizationLevel::Low);
        assert_eq!(result.recommended_plan_type, PlanType::Ppo);
    }

    #[test]
    fn planned_procedure_forces_low_deductible_and_hmo() {
        let profile = HealthProfile { planned_procedures: true, ..HealthProfile::default() };
        let result = calculate_utilization_score(&profile);
        assert_eq!(result.score, 15);
        assert_eq!(result.recommended_deductible, DeductibleTier::Low);
        assert_eq!(result.recommended_plan_type, PlanType::Hmo);
    }

    #[test]
    fn moderate_profile() {
        let profile = HealthProfile {
            doctor_visits: DoctorVisits::ThreeToFive,
            specialist_visits: SpecialistVisits::Occasional,
            monthly_medication_cost: MedicationCost::FiftyToTwoHundred,
            ..HealthProfile::default()
        };
        let result = calculate_utilization_score(&profile);
        assert_eq!(result.score, 27);
        assert_eq!(result.level, UtilizationLevel::Moderate);
        assert_eq!(result.recommended_deductible, DeductibleTier::Medium);
        assert_eq!(result.recommended_plan_type, PlanType::Hmo);
        assert_eq!(result.expected_annual_claims, 4_000.0 + 1_500.0);
        assert_eq!(result.reasoning.len(), 4);
    }

    #[test]
    fn profile_deserializes_with_missing_fields() {
        let json = r#"{"er_visits":"one_to_two","specialty_medications":true}"#;
        let profile: HealthProfile = serde_json::from_str(json).unwrap();
        let result = calculate_utilization_score(&profile);
        assert_eq!(result.score, 20);
    }

    fn profile_strategy() -> impl Strategy<Value = HealthProfile> {
        (
            prop_oneof![
                Just(DoctorVisits::ZeroToTwo),
                Just(DoctorVisits::ThreeToFive),
                Just(DoctorVisits::SixToTen),
                Just(DoctorVisits::MoreThanTen),
            ],
            prop_oneof![
                Just(SpecialistVisits::None),
                Just(SpecialistVisits::Occasional),
                Just(SpecialistVisits::Frequent),
            ],
            prop_oneof![
                Just(ErVisits::None),
                Just(ErVisits::OneToTwo),
                Just(ErVisits::ThreeOrMore),
            ],
            0usize..10,
            prop_oneof![
                Just(MedicationCost::UnderFifty),
                Just(MedicationCost::FiftyToTwoHundred),
                Just(MedicationCost::TwoHundredToFiveHundred),
                Just(MedicationCost::FiveHundredToThousand),
                Just(MedicationCost::OverThousand),
            ],
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(doctor, specialist, er, n, meds, specialty, planned)| HealthProfile {
                doctor_visits: doctor,
                specialist_visits: specialist,
                er_visits: er,
                chronic_conditions: (0..n).map(|i| format!("condition {i}")).collect(),
                monthly_medication_cost: meds,
                specialty_medications: specialty,
                planned_procedures: planned,
            })
    }

    proptest! {
        #[test]
        fn score_within_bounds_and_level_consistent(profile in profile_strategy()) {
            let result = calculate_utilization_score(&profile);
            prop_assert!(result.score <= MAX_SCORE);
            prop_assert_eq!(result.level, UtilizationLevel::from_score(result.score));
            prop_assert!(result.expected_annual_claims >= 800.0);
        }
    }
}
