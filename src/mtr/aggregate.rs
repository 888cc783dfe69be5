//! Marginal tax rates from paired benefit results, reassembled by household

use crate::population::{Individual, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Months of benefit per year
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Years of benefit receipt credited per unit of monthly benefit change
pub const BENEFIT_YEARS: f64 = 13.0;

/// Calculator output for one individual under one scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenefitResult {
    pub individual_id: u64,
    pub benefit_amount: f64,
}

/// Baseline and adjusted benefit for one individual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedBenefit {
    pub individual_id: u64,
    pub benefit_baseline: f64,
    pub benefit_adjusted: f64,
}

/// MTR of one individual after zero-filling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndividualOutcome {
    pub individual_id: u64,
    pub household_id: u64,
    pub role: Role,
    pub mtr: f64,
}

/// One row per household with head and spouse MTRs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseholdOutcome {
    #[serde(rename = "SS_MTR_head")]
    pub mtr_head: f64,
    #[serde(rename = "SS_MTR_spouse")]
    pub mtr_spouse: f64,
    #[serde(rename = "RECID")]
    pub household_id: u64,
}

/// Change in lifetime benefit per unit of current-year earnings
pub fn marginal_tax_rate(benefit_baseline: f64, benefit_adjusted: f64, adjustment: f64) -> f64 {
    (benefit_adjusted - benefit_baseline) / adjustment * MONTHS_PER_YEAR * BENEFIT_YEARS
}

/// Turns per-scenario benefit results into household MTRs
#[derive(Debug, Clone, Copy)]
pub struct MTRAggregator {
    adjustment: f64,
}

impl MTRAggregator {
    pub fn new(adjustment: f64) -> Self {
        Self { adjustment }
    }

    /// Inner join of baseline and adjusted results on individual id
    ///
    /// Output follows the order of `baseline`. Individuals missing on either
    /// side are dropped.
    pub fn pivot(&self, baseline: &[BenefitResult], adjusted: &[BenefitResult]) -> Vec<PairedBenefit> {
        let adjusted: HashMap<u64, f64> = adjusted
            .iter()
            .map(|r| (r.individual_id, r.benefit_amount))
            .collect();

        baseline
            .iter()
            .filter_map(|b| {
                adjusted.get(&b.individual_id).map(|&benefit_adjusted| PairedBenefit {
                    individual_id: b.individual_id,
                    benefit_baseline: b.benefit_amount,
                    benefit_adjusted,
                })
            })
            .collect()
    }

    /// MTR per individual with results under both scenarios
    pub fn aggregate(&self, baseline: &[BenefitResult], adjusted: &[BenefitResult]) -> HashMap<u64, f64> {
        self.pivot(baseline, adjusted)
            .into_iter()
            .map(|p| {
                (
                    p.individual_id,
                    marginal_tax_rate(p.benefit_baseline, p.benefit_adjusted, self.adjustment),
                )
            })
            .collect()
    }

    /// Attach MTRs to the whole population, 0 where none was computed
    pub fn merge_population(&self, population: &[Individual], mtrs: &HashMap<u64, f64>) -> Vec<IndividualOutcome> {
        population
            .iter()
            .map(|p| IndividualOutcome {
                individual_id: p.id,
                household_id: p.household_id,
                role: p.role,
                mtr: mtrs.get(&p.id).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Join head and spouse outcomes on household id
    ///
    /// Rows appear in order of each household's first member. A household
    /// without a spouse (or head) reports 0 for the absent member.
    pub fn households(&self, outcomes: &[IndividualOutcome]) -> Vec<HouseholdOutcome> {
        let mut rows: Vec<HouseholdOutcome> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for outcome in outcomes {
            let i = *index.entry(outcome.household_id).or_insert_with(|| {
                rows.push(HouseholdOutcome {
                    mtr_head: 0.0,
                    mtr_spouse: 0.0,
                    household_id: outcome.household_id,
                });
                rows.len() - 1
            });

            match outcome.role {
                Role::Head => rows[i].mtr_head = outcome.mtr,
                Role::Spouse => rows[i].mtr_spouse = outcome.mtr,
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::Sex;
    use approx::assert_relative_eq;

    fn result(individual_id: u64, benefit_amount: f64) -> BenefitResult {
        BenefitResult {
            individual_id,
            benefit_amount,
        }
    }

    fn member(id: u64, household_id: u64, role: Role) -> Individual {
        Individual {
            id,
            survey_id: household_id.to_string(),
            household_id,
            role,
            age: 40,
            sex: Sex::Male,
            education_years: 2,
            earned_income: 10_000.0,
            full_time: true,
        }
    }

    #[test]
    fn test_mtr_formula() {
        assert_relative_eq!(marginal_tax_rate(1000.0, 1010.0, 500.0), 3.12, epsilon = 1e-12);
        assert_eq!(marginal_tax_rate(800.0, 800.0, 500.0), 0.0);
    }

    #[test]
    fn test_pivot_is_inner_join() {
        let agg = MTRAggregator::new(500.0);
        let baseline = [result(1, 100.0), result(2, 200.0), result(3, 300.0)];
        let adjusted = [result(3, 310.0), result(1, 105.0), result(4, 999.0)];

        let paired = agg.pivot(&baseline, &adjusted);
        assert_eq!(
            paired,
            vec![
                PairedBenefit { individual_id: 1, benefit_baseline: 100.0, benefit_adjusted: 105.0 },
                PairedBenefit { individual_id: 3, benefit_baseline: 300.0, benefit_adjusted: 310.0 },
            ]
        );

        let mtrs = agg.aggregate(&baseline, &adjusted);
        assert_eq!(mtrs.len(), 2);
        assert!(!mtrs.contains_key(&2));
        assert_relative_eq!(mtrs[&3], 10.0 / 500.0 * 156.0, epsilon = 1e-12);
    }

    #[test]
    fn test_households_join_by_key_not_position() {
        let agg = MTRAggregator::new(500.0);
        // Spouse listed before its head, and a head without spouse
        let population = vec![
            member(5, 200, Role::Spouse),
            member(1, 100, Role::Head),
            member(2, 200, Role::Head),
        ];
        let mtrs: HashMap<u64, f64> = [(5, 0.5), (2, 0.25)].into_iter().collect();

        let outcomes = agg.merge_population(&population, &mtrs);
        assert_eq!(outcomes[1].mtr, 0.0);

        let households = agg.households(&outcomes);
        assert_eq!(
            households,
            vec![
                HouseholdOutcome { mtr_head: 0.25, mtr_spouse: 0.5, household_id: 200 },
                HouseholdOutcome { mtr_head: 0.0, mtr_spouse: 0.0, household_id: 100 },
            ]
        );
    }
}
