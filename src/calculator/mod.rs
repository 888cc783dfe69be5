//! Interface to the external benefit calculator: record encoding and invocation

mod record;
mod invoker;

pub use record::{
    decode_earnings, RecordEncoder, RecordLayout, BIRTH_MONTH_DAY, EARNINGS_WIDTH,
    FIRST_EARNINGS_TAG, TERMINATOR, VALUES_PER_LINE,
};
pub use invoker::{
    parse_benefit, BenefitCalculator, CalculatorConfig, ExternalCalculator, DEFAULT_INPUT_STEM,
    DEFAULT_OUTPUT_FILE, DEFAULT_TIMEOUT,
};
