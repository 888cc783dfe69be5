//! Load the average-wage series from CSV

use super::WageIndex;
use std::error::Error;
use std::path::Path;

/// Column holding the national average wage
pub const DEFAULT_WAGE_COLUMN: &str = "Avg_Wage";

fn read_levels<R: std::io::Read>(reader: R) -> Result<Vec<f64>, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let column = csv_reader
        .headers()?
        .iter()
        .position(|h| h == DEFAULT_WAGE_COLUMN)
        .ok_or_else(|| format!("Missing column: {}", DEFAULT_WAGE_COLUMN))?;

    let mut levels = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let level: f64 = record[column].trim().parse()?;
        levels.push(level);
    }

    Ok(levels)
}

/// Load and normalize the wage index from a CSV file
pub fn load_wage_index<P: AsRef<Path>>(path: P) -> Result<WageIndex, Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    let levels = read_levels(file)?;
    Ok(WageIndex::from_levels(&levels)?)
}

/// Load the wage index from any reader
pub fn load_wage_index_from_reader<R: std::io::Read>(reader: R) -> Result<WageIndex, Box<dyn Error>> {
    let levels = read_levels(reader)?;
    Ok(WageIndex::from_levels(&levels)?)
}
