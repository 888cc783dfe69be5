//! Load individuals from the tax-unit survey extract
//!
//! Each CSV row is one tax unit with head and spouse columns side by side.
//! Heads are emitted first (ids 0..n), spouses follow with ids continuing
//! from n, mirroring how the extract is stacked for estimation.

use super::{years_past_secondary, Individual, Role, Sex};
use csv::Reader;
use std::error::Error;
use std::path::Path;

/// Spouse age recorded for tax units without a spouse
pub const NO_SPOUSE_AGE: u32 = 1;

/// Raw CSV row matching the survey extract columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "e00200p")]
    wages_head: f64,
    #[serde(rename = "e00200s")]
    wages_spouse: f64,
    #[serde(rename = "e00900p")]
    business_head: f64,
    #[serde(rename = "e00900s")]
    business_spouse: f64,
    #[serde(rename = "e02100p")]
    farm_head: f64,
    #[serde(rename = "e02100s")]
    farm_spouse: f64,
    age_head: f64,
    age_spouse: f64,
    hga_head: f64,
    hga_spouse: f64,
    ftpt_head: f64,
    ftpt_spouse: f64,
    gender_head: f64,
    gender_spouse: f64,
    peridnum: String,
    #[serde(rename = "RECID")]
    recid: u64,
}

/// One side (head or spouse) of a tax unit before ids are assigned
struct Member {
    earned_income: f64,
    age: f64,
    education_code: f64,
    ftpt: f64,
    gender: f64,
}

impl CsvRow {
    fn head(&self) -> Member {
        Member {
            earned_income: self.wages_head + self.business_head + self.farm_head,
            age: self.age_head,
            education_code: self.hga_head,
            ftpt: self.ftpt_head,
            gender: self.gender_head,
        }
    }

    fn spouse(&self) -> Option<Member> {
        if survey_code(self.age_spouse) == Some(NO_SPOUSE_AGE) {
            return None;
        }
        Some(Member {
            earned_income: self.wages_spouse + self.business_spouse + self.farm_spouse,
            age: self.age_spouse,
            education_code: self.hga_spouse,
            ftpt: self.ftpt_spouse,
            gender: self.gender_spouse,
        })
    }
}

impl Member {
    fn to_individual(
        &self,
        id: u64,
        role: Role,
        survey_id: &str,
        household_id: u64,
    ) -> Result<Individual, Box<dyn Error>> {
        let age = survey_code(self.age)
            .ok_or_else(|| format!("Invalid age {} for household {}", self.age, household_id))?;

        let education_years = survey_code(self.education_code)
            .and_then(|code| u8::try_from(code).ok())
            .and_then(years_past_secondary)
            .ok_or_else(|| {
                format!(
                    "Unknown education code {} for household {}",
                    self.education_code, household_id
                )
            })?;

        let sex = survey_code(self.gender)
            .and_then(|code| u8::try_from(code).ok())
            .and_then(Sex::from_survey_code)
            .ok_or_else(|| format!("Unknown gender code {} for household {}", self.gender, household_id))?;

        Ok(Individual {
            id,
            survey_id: survey_id.to_string(),
            household_id,
            role,
            age,
            sex,
            education_years,
            earned_income: self.earned_income,
            full_time: self.ftpt == 0.0,
        })
    }
}

/// Whole, non-negative survey code; None for fractional or out-of-range values
fn survey_code(value: f64) -> Option<u32> {
    if value.fract() == 0.0 && value >= 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

fn rows_to_population(rows: Vec<CsvRow>) -> Result<Vec<Individual>, Box<dyn Error>> {
    let head_count = rows.len() as u64;
    let mut heads = Vec::with_capacity(rows.len());
    let mut spouses = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        heads.push(row.head().to_individual(i as u64, Role::Head, &row.peridnum, row.recid)?);
        if let Some(spouse) = row.spouse() {
            let id = head_count + spouses.len() as u64;
            spouses.push(spouse.to_individual(id, Role::Spouse, &row.peridnum, row.recid)?);
        }
    }

    heads.extend(spouses);
    Ok(heads)
}

/// Load the stacked head + spouse population from a CSV file
pub fn load_population<P: AsRef<Path>>(path: P) -> Result<Vec<Individual>, Box<dyn Error>> {
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        rows.push(row);
    }

    rows_to_population(rows)
}

/// Load the population from any reader (e.g., string buffer)
pub fn load_population_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Individual>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        rows.push(row);
    }

    rows_to_population(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
e00200p,e00200s,e00900p,e00900s,e02100p,e02100s,age_head,age_spouse,hga_head,hga_spouse,ftpt_head,ftpt_spouse,gender_head,gender_spouse,peridnum,RECID
50000,30000,1000,0,0,500,45,43,43,39,0,0,1,2,4401234567890,7
20000,0,0,0,0,0,30,1,40,0,1,0,2,0,4409876543210,8
";

    #[test]
    fn test_load_population_stacks_heads_then_spouses() {
        let population = load_population_from_reader(SAMPLE.as_bytes()).expect("Failed to load");
        assert_eq!(population.len(), 3);

        let head = &population[0];
        assert_eq!(head.id, 0);
        assert_eq!(head.role, Role::Head);
        assert_eq!(head.household_id, 7);
        assert_eq!(head.earned_income, 51_000.0);
        assert_eq!(head.education_years, 6);
        assert_eq!(head.sex, Sex::Male);
        assert!(head.full_time);

        let second_head = &population[1];
        assert_eq!(second_head.id, 1);
        assert!(!second_head.full_time);

        let spouse = &population[2];
        assert_eq!(spouse.id, 2);
        assert_eq!(spouse.role, Role::Spouse);
        assert_eq!(spouse.household_id, 7);
        assert_eq!(spouse.earned_income, 30_500.0);
        assert_eq!(spouse.education_years, 1);
        assert_eq!(spouse.sex, Sex::Female);
        assert_eq!(spouse.survey_id, "4401234567890");
    }

    #[test]
    fn test_unknown_education_code_is_rejected() {
        let csv = SAMPLE.replace(",43,39,", ",99,39,");
        let err = load_population_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("education code"));

        for code in ["-7", "40.5", "295"] {
            let csv = SAMPLE.replace(",43,39,", &format!(",{},39,", code));
            let err = load_population_from_reader(csv.as_bytes()).unwrap_err();
            assert!(err.to_string().contains("Unknown education code"), "{}", code);
        }
    }

    #[test]
    fn test_fractional_gender_code_is_rejected() {
        let csv = SAMPLE.replace(",0,0,1,2,", ",0,0,1.9,2,");
        let err = load_population_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Unknown gender code 1.9 for household 7"));
    }

    #[test]
    fn test_fractional_ages_are_rejected() {
        // 1.5 is not the no-spouse marker, so the spouse is loaded and fails
        let csv = SAMPLE.replace(",30,1,40,", ",30,1.5,40,");
        let err = load_population_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid age 1.5 for household 8"));

        let csv = SAMPLE.replace(",45,43,", ",-45,43,");
        let err = load_population_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid age"));
    }
}
