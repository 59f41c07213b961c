//! Transaction entry form

use crate::shared::{Direction, Record, SharedError};

const MISSING_INFORMATION: &str = "Missing Information";
const OUT_OF_RANGE: &str = "Amount is out of range";

/// Largest magnitude accepted for a single entry
pub const MAX_AMOUNT: u64 = 1_000_000_000_000_000;

/// Raw user input for one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionForm {
    pub name: String,
    pub amount: String,
    pub direction: Direction,
}

impl TransactionForm {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            direction,
        }
    }

    /// Validate the input and build a timestamped record
    ///
    /// The sign of the amount follows the direction.
    pub fn into_record(self) -> Result<Record, SharedError> {
        let name = self.name.trim();
        let amount = self.amount.trim();

        if name.is_empty() {
            return Err(SharedError::validation("name", MISSING_INFORMATION));
        }
        if amount.is_empty() {
            return Err(SharedError::validation("amount", MISSING_INFORMATION));
        }

        let amount: i64 = amount
            .parse()
            .map_err(|_| SharedError::validation("amount", "Amount must be a whole number"))?;

        if amount.unsigned_abs() > MAX_AMOUNT {
            return Err(SharedError::validation("amount", OUT_OF_RANGE));
        }
        let value = self
            .direction
            .apply(amount)
            .ok_or_else(|| SharedError::validation("amount", OUT_OF_RANGE))?;

        Ok(Record::new(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtract_negates() {
        let record = TransactionForm::new("rent", "500", Direction::Subtract)
            .into_record()
            .unwrap();
        assert_eq!(record.value, -500);
        assert_eq!(record.name, "rent");
        assert!(!record.pending);
    }

    #[test]
    fn test_missing_fields() {
        let err = TransactionForm::new("  ", "5", Direction::Add)
            .into_record()
            .unwrap_err();
        assert_eq!(err, SharedError::validation("name", "Missing Information"));

        let err = TransactionForm::new("rent", "", Direction::Add)
            .into_record()
            .unwrap_err();
        assert_eq!(err, SharedError::validation("amount", "Missing Information"));
    }

    #[test]
    fn test_extreme_amounts_rejected() {
        let err = TransactionForm::new("rent", "-9223372036854775808", Direction::Subtract)
            .into_record()
            .unwrap_err();
        assert_eq!(err, SharedError::validation("amount", "Amount is out of range"));

        let err = TransactionForm::new("rent", "9223372036854775807", Direction::Add)
            .into_record()
            .unwrap_err();
        assert!(err.is_validation());

        let record = TransactionForm::new("car", &MAX_AMOUNT.to_string(), Direction::Subtract)
            .into_record()
            .unwrap();
        assert_eq!(record.value, -(MAX_AMOUNT as i64));
    }

    #[test]
    fn test_non_numeric_amount() {
        let err = TransactionForm::new("rent", "five", Direction::Add)
            .into_record()
            .unwrap_err();
        assert!(err.is_validation());
    }
}
