//! Fixed-width `.pia` records for the external benefit calculator
//!
//! Record layout (one field group per line):
//!
//! ```text
//! 01<id:9><sex><mmdd><birth year>
//! 03101<retirement year>
//! 06<first earnings year><last earnings year>
//! 16<full id>
//! 22<earnings x 10, each %8d.00>
//! 23<next 10 earnings> ...
//! 402017551
//! ```

use crate::earnings::EarningsPath;
use crate::population::Individual;

/// Birth month and day written for every individual (January 1st)
pub const BIRTH_MONTH_DAY: &str = "0101";

/// Final line of every record
pub const TERMINATOR: &str = "402017551";

/// Tag of the first earnings line
pub const FIRST_EARNINGS_TAG: u32 = 22;

/// Earnings values per physical line
pub const VALUES_PER_LINE: usize = 10;

/// Width of the right-justified integer part of each earnings field
pub const EARNINGS_WIDTH: usize = 8;

/// Maximum id characters on the identity line
const SHORT_ID_LEN: usize = 9;

/// Calendar anchoring of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Survey (current earnings) year
    pub base_year: i32,
    /// Assumed retirement age
    pub retirement_age: i32,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            base_year: 2014,
            retirement_age: 65,
        }
    }
}

/// Encodes individuals and earnings paths into calculator records
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordEncoder {
    layout: RecordLayout,
}

impl RecordEncoder {
    pub fn new(layout: RecordLayout) -> Self {
        Self { layout }
    }

    /// Encode one scenario path. `experience` is clamped at zero here.
    pub fn encode(&self, individual: &Individual, experience: i32, path: &EarningsPath) -> String {
        let base_year = self.layout.base_year;
        let age = individual.age as i32;
        let experience = experience.max(0);

        let identity = format!(
            "01{}{}{}{}",
            short_id(&individual.survey_id),
            individual.sex.code(),
            BIRTH_MONTH_DAY,
            base_year - age
        );
        let retirement = format!("03101{}", base_year + (self.layout.retirement_age - age));
        let earnings_years = format!("06{}{}", base_year - experience, base_year);
        let id_line = format!("16{}", individual.survey_id);

        [
            identity,
            retirement,
            earnings_years,
            id_line,
            earnings_block(&path.values),
            TERMINATOR.to_string(),
        ]
        .join("\n")
    }
}

/// Last nine characters of an identifier
fn short_id(id: &str) -> &str {
    let skip = id.chars().count().saturating_sub(SHORT_ID_LEN);
    match id.char_indices().nth(skip) {
        Some((start, _)) => &id[start..],
        None => id,
    }
}

fn earnings_block(values: &[u64]) -> String {
    let mut block = FIRST_EARNINGS_TAG.to_string();
    for (i, value) in values.iter().enumerate() {
        if i > 0 && i % VALUES_PER_LINE == 0 {
            block.push('\n');
            block.push_str(&(FIRST_EARNINGS_TAG + (i / VALUES_PER_LINE) as u32).to_string());
        }
        block.push_str(&format!("{:>width$}.00", value, width = EARNINGS_WIDTH));
    }
    block
}

/// Recover the earnings sequence from an encoded record
///
/// Returns None if the earnings lines are missing, out of sequence or hold a
/// field that is not a whole-unit amount.
pub fn decode_earnings(record: &str) -> Option<Vec<u64>> {
    let mut values = Vec::new();

    let block = record
        .lines()
        .skip(4)
        .take_while(|line| *line != TERMINATOR);

    let mut lines = 0;
    for (i, line) in block.enumerate() {
        let tag = (FIRST_EARNINGS_TAG + i as u32).to_string();
        let fields = line.strip_prefix(tag.as_str())?;
        lines += 1;

        if fields.is_empty() {
            continue;
        }
        let fields = fields.strip_suffix(".00")?;
        for field in fields.split(".00") {
            values.push(field.trim().parse().ok()?);
        }
    }

    if lines == 0 {
        return None;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::{Role, Sex};

    fn person(age: u32, survey_id: &str, sex: Sex) -> Individual {
        Individual {
            id: 0,
            survey_id: survey_id.to_string(),
            household_id: 0,
            role: Role::Head,
            age,
            sex,
            education_years: 4,
            earned_income: 50_000.0,
            full_time: true,
        }
    }

    fn path(values: Vec<u64>) -> EarningsPath {
        EarningsPath {
            years: (0..values.len() as u32).collect(),
            values,
        }
    }

    #[test]
    fn test_header_lines() {
        let p = person(40, "4401234567890", Sex::Female);
        let record = RecordEncoder::default().encode(&p, 19, &path(vec![1000, 2000]));
        let lines: Vec<&str> = record.lines().collect();

        assert_eq!(lines[0], "01234567890101011974");
        assert_eq!(lines[1], "031012039");
        assert_eq!(lines[2], "0619952014");
        assert_eq!(lines[3], "164401234567890");
        assert_eq!(lines[4], "22    1000.00    2000.00");
        assert_eq!(lines[5], TERMINATOR);
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_negative_experience_is_clamped() {
        let p = person(20, "77", Sex::Male);
        let record = RecordEncoder::default().encode(&p, -3, &path(vec![15000]));
        let lines: Vec<&str> = record.lines().collect();

        assert_eq!(lines[0], "0177001011994");
        assert_eq!(lines[2], "0620142014");
    }

    #[test]
    fn test_earnings_wrap_every_ten_values() {
        let values: Vec<u64> = (1..=23).map(|v| v * 100).collect();
        let record = RecordEncoder::default().encode(&person(45, "1", Sex::Male), 23, &path(values));
        let lines: Vec<&str> = record.lines().collect();

        assert!(lines[4].starts_with("22     100.00"));
        assert_eq!(lines[4].len(), 2 + 10 * 11);
        assert!(lines[5].starts_with("23    1100.00"));
        assert_eq!(lines[5].len(), 2 + 10 * 11);
        assert_eq!(lines[6], "24    2100.00    2200.00    2300.00");
        assert_eq!(lines[7], TERMINATOR);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let p = person(52, "998877665544", Sex::Female);
        let earnings = path(vec![12_345, 23_456, 34_567, 123_456_789]);
        let encoder = RecordEncoder::default();

        let a = encoder.encode(&p, 30, &earnings);
        let b = encoder.encode(&p, 30, &earnings);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_decode_recovers_values() {
        let values: Vec<u64> = vec![0, 7, 18_250, 99_999_999, 123_456_789, 5, 41_000, 41_001, 3, 2, 1, 60_000];
        let record = RecordEncoder::default().encode(&person(60, "42", Sex::Male), 11, &path(values.clone()));
        assert_eq!(decode_earnings(&record), Some(values));
    }

    #[test]
    fn test_single_year_record() {
        let record = RecordEncoder::default().encode(&person(18, "5", Sex::Male), 1, &path(vec![9_000]));
        assert_eq!(record.lines().nth(4), Some("22    9000.00"));
        assert_eq!(decode_earnings(&record), Some(vec![9_000]));
    }

    #[test]
    fn test_custom_layout() {
        let encoder = RecordEncoder::new(RecordLayout {
            base_year: 2020,
            retirement_age: 67,
        });
        let record = encoder.encode(&person(40, "1", Sex::Male), 10, &path(vec![1]));
        let lines: Vec<&str> = record.lines().collect();
        assert_eq!(lines[1], "031012047");
        assert_eq!(lines[2], "0620102020");
    }
}
