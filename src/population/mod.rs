//! Survey population: individuals, inclusion filters and loading

mod data;
pub mod loader;

pub use data::{
    fit_sample_description, years_past_secondary, Individual, Role, Sex, LABOR_FORCE_ENTRY_AGE,
    MAX_WORKING_AGE, MIN_FIT_AGE, MIN_SIMULATION_AGE,
};
pub use loader::{load_population, load_population_from_reader};
