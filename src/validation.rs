//! Field checks shared by the request bodies of the CRUD resources.

use crate::{Error, money::has_at_most_two_decimals};

/// The maximum number of characters in the name of an account, credit card or category.
pub const MAX_NAME_LENGTH: usize = 100;

/// The maximum number of characters in a transaction description.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Trim `name` and check that it is non-empty and not too long.
///
/// # Errors
/// Returns [Error::InvalidField] if the trimmed name is empty or longer than
/// [MAX_NAME_LENGTH] characters.
pub fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::InvalidField {
            field: "name",
            reason: "must not be empty".to_owned(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::InvalidField {
            field: "name",
            reason: format!("must be at most {MAX_NAME_LENGTH} characters"),
        });
    }

    Ok(name.to_owned())
}

/// Trim `description` and check that it is not too long. Empty descriptions are allowed.
///
/// # Errors
/// Returns [Error::InvalidField] if the trimmed description is longer than
/// [MAX_DESCRIPTION_LENGTH] characters.
pub fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::InvalidField {
            field: "description",
            reason: format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        });
    }

    Ok(description.to_owned())
}

/// Check that a currency value is finite and has at most two decimal places.
///
/// # Errors
/// Returns [Error::InvalidField] naming `field` if the check fails.
pub fn validate_money(field: &'static str, value: f64) -> Result<f64, Error> {
    if !value.is_finite() {
        return Err(Error::InvalidField {
            field,
            reason: "must be a finite number".to_owned(),
        });
    }

    if !has_at_most_two_decimals(value) {
        return Err(Error::InvalidField {
            field,
            reason: "must have at most two decimal places".to_owned(),
        });
    }

    Ok(value)
}

/// Check that a transaction amount is positive and has at most two decimal places.
///
/// # Errors
/// Returns [Error::InvalidField] if the amount is not positive or has more
/// than two decimal places.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    let amount = validate_money("amount", amount)?;

    if amount <= 0.0 {
        return Err(Error::InvalidField {
            field: "amount",
            reason: "must be greater than zero".to_owned(),
        });
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{validate_amount, validate_description, validate_money, validate_name};

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  Wallet "), Ok("Wallet".to_owned()));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(
            validate_name("   "),
            Err(Error::InvalidField { field: "name", .. })
        ));
    }

    #[test]
    fn long_name_is_rejected() {
        assert!(validate_name(&"a".repeat(100)).is_ok());
        assert!(validate_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn long_description_is_rejected() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"é".repeat(255)).is_ok());
        assert!(validate_description(&"é".repeat(256)).is_err());
    }

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(validate_amount(0.01), Ok(0.01));
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
    }

    #[test]
    fn amount_must_have_two_decimals_at_most() {
        assert!(validate_amount(9.999).is_err());
    }

    #[test]
    fn money_may_be_negative() {
        assert_eq!(validate_money("initial_balance", -120.5), Ok(-120.5));
        assert!(validate_money("initial_balance", f64::NAN).is_err());
    }
}
