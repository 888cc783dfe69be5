//! Household MTR table output

use super::HouseholdOutcome;
use std::error::Error;
use std::path::Path;

/// Write households to CSV with columns SS_MTR_head, SS_MTR_spouse, RECID
pub fn write_households<P: AsRef<Path>>(path: P, households: &[HouseholdOutcome]) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(path)?;
    write_households_to(file, households)
}

/// Write households to any writer
pub fn write_households_to<W: std::io::Write>(writer: W, households: &[HouseholdOutcome]) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in households {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_layout() {
        let rows = [
            HouseholdOutcome { mtr_head: 3.12, mtr_spouse: 0.0, household_id: 7 },
            HouseholdOutcome { mtr_head: 0.0, mtr_spouse: 1.5, household_id: 8 },
        ];
        let mut buffer = Vec::new();
        write_households_to(&mut buffer, &rows).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "SS_MTR_head,SS_MTR_spouse,RECID\n3.12,0.0,7\n0.0,1.5,8\n");
    }
}
