//! Input validation shared by the service and shell.
//!
//! Every check here runs before the store is touched.

use super::lote::NewBatch;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest accepted bag and unit count.
pub const MIN_COUNT: i64 = 1;

/// Largest unit count one batch may be created with.
///
/// Units are inserted one by one inside a single write transaction, so this
/// also bounds how long batch creation holds the store's write lock.
pub const MAX_UNIT_COUNT: i64 = 100;

/// Largest bag count accepted for a batch.
pub const MAX_BAG_COUNT: i64 = 100_000;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyBatchNumber,
    BagCountBelowMinimum(i64),
    UnitCountBelowMinimum(i64),
    BagCountAboveMaximum(i64),
    UnitCountAboveMaximum(i64),
    EmptyAgent,
    UnknownFirm(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBatchNumber => write!(f, "batch number is required"),
            Self::BagCountBelowMinimum(value) => {
                write!(f, "bag count must be at least {MIN_COUNT}, got {value}")
            }
            Self::UnitCountBelowMinimum(value) => {
                write!(f, "unit count must be at least {MIN_COUNT}, got {value}")
            }
            Self::BagCountAboveMaximum(value) => {
                write!(f, "bag count must be at most {MAX_BAG_COUNT}, got {value}")
            }
            Self::UnitCountAboveMaximum(value) => {
                write!(f, "unit count must be at most {MAX_UNIT_COUNT}, got {value}")
            }
            Self::EmptyAgent => write!(f, "agent name is required"),
            Self::UnknownFirm(firm) => write!(f, "firm `{firm}` is not in the configured list"),
        }
    }
}

impl Error for ValidationError {}

/// Checks raw batch-creation input and returns the normalized request.
///
/// Counts arrive signed so that negative form input is representable and
/// rejected here instead of wrapping.
pub fn validate_new_batch(
    number: &str,
    bag_count: i64,
    unit_count: i64,
) -> Result<NewBatch, ValidationError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(ValidationError::EmptyBatchNumber);
    }
    let bag_count = bounded_count(
        bag_count,
        MAX_BAG_COUNT,
        ValidationError::BagCountBelowMinimum,
        ValidationError::BagCountAboveMaximum,
    )?;
    let unit_count = bounded_count(
        unit_count,
        MAX_UNIT_COUNT,
        ValidationError::UnitCountBelowMinimum,
        ValidationError::UnitCountAboveMaximum,
    )?;

    Ok(NewBatch {
        number: number.to_string(),
        bag_count,
        unit_count,
    })
}

/// Trims the agent name and rejects blank input.
pub fn validate_agent(agent: &str) -> Result<String, ValidationError> {
    let agent = agent.trim();
    if agent.is_empty() {
        return Err(ValidationError::EmptyAgent);
    }
    Ok(agent.to_string())
}

fn bounded_count(
    value: i64,
    max: i64,
    below: fn(i64) -> ValidationError,
    above: fn(i64) -> ValidationError,
) -> Result<u32, ValidationError> {
    if value < MIN_COUNT {
        return Err(below(value));
    }
    if value > max {
        return Err(above(value));
    }
    u32::try_from(value).map_err(|_| above(value))
}

#[cfg(test)]
mod tests {
    use super::{
        validate_agent, validate_new_batch, ValidationError, MAX_BAG_COUNT, MAX_UNIT_COUNT,
    };

    #[test]
    fn new_batch_trims_number_and_keeps_counts() {
        let batch = validate_new_batch("  L100 ", 50, 3).expect("valid input");
        assert_eq!(batch.number, "L100");
        assert_eq!(batch.bag_count, 50);
        assert_eq!(batch.unit_count, 3);
    }

    #[test]
    fn new_batch_rejects_blank_number_and_low_counts() {
        assert_eq!(
            validate_new_batch("   ", 1, 1),
            Err(ValidationError::EmptyBatchNumber)
        );
        assert_eq!(
            validate_new_batch("L1", -5, 1),
            Err(ValidationError::BagCountBelowMinimum(-5))
        );
        assert_eq!(
            validate_new_batch("L1", 10, 0),
            Err(ValidationError::UnitCountBelowMinimum(0))
        );
    }

    #[test]
    fn new_batch_caps_counts() {
        let batch =
            validate_new_batch("L1", MAX_BAG_COUNT, MAX_UNIT_COUNT).expect("counts at the cap");
        assert_eq!(batch.unit_count, 100);

        assert_eq!(
            validate_new_batch("L1", 1, MAX_UNIT_COUNT + 1),
            Err(ValidationError::UnitCountAboveMaximum(101))
        );
        assert_eq!(
            validate_new_batch("L1", 1, i64::from(u32::MAX)),
            Err(ValidationError::UnitCountAboveMaximum(i64::from(u32::MAX)))
        );
        assert_eq!(
            validate_new_batch("L1", i64::MAX, 1),
            Err(ValidationError::BagCountAboveMaximum(i64::MAX))
        );
    }

    #[test]
    fn agent_must_not_be_blank() {
        assert_eq!(validate_agent(" Maria "), Ok("Maria".to_string()));
        assert_eq!(validate_agent("\t"), Err(ValidationError::EmptyAgent));
    }
}
