//! Historical average-wage index used to inflate simulated earnings

mod index;
pub mod loader;

pub use index::WageIndex;
pub use loader::{load_wage_index, load_wage_index_from_reader, DEFAULT_WAGE_COLUMN};
