//! Marginal tax rate aggregation and household output

mod aggregate;
pub mod export;

pub use aggregate::{
    marginal_tax_rate, BenefitResult, HouseholdOutcome, IndividualOutcome, MTRAggregator,
    PairedBenefit, BENEFIT_YEARS, MONTHS_PER_YEAR,
};
pub use export::{write_households, write_households_to};
