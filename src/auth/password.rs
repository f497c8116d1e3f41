//! Password strength checks and bcrypt hashing.
//!
//! A plain-text password from a registration or reset request must pass
//! [ValidatedPassword::new] before it can be turned into a [PasswordHash],
//! which is the only form a password is ever stored in.

use std::fmt::Display;

use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// A plain-text password that zxcvbn scored as hard to guess.
///
/// The password is never printed: [Display] writes asterisks instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `password`.
    ///
    /// `user_inputs` are account details the password should not be built
    /// from, such as the email address being registered.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] with zxcvbn's suggestion when the password
    /// scores below three out of four.
    pub fn new(password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let entropy = zxcvbn(password, user_inputs);

        if matches!(entropy.score(), Score::Three | Score::Four) {
            return Ok(Self(password.to_owned()));
        }

        let advice = entropy
            .feedback()
            .map(|feedback| feedback.to_string())
            .filter(|advice| !advice.trim().is_empty())
            .unwrap_or_else(|| "use a longer password with fewer common words".to_owned());

        Err(Error::TooWeak(advice))
    }

    /// Wrap `password` without checking its strength.
    ///
    /// Only for fixtures and passwords that were validated elsewhere.
    pub fn new_unchecked(password: &str) -> Self {
        Self(password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A bcrypt hash of a user's password, as stored in the `user` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used by the server and the reset tool.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Salt and hash `password` with `cost` rounds of bcrypt.
    ///
    /// Tests use a cost of 4 to stay fast.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(hash: &str) -> Self {
        Self(hash.to_owned())
    }

    /// Whether `password`, as typed at log in, matches this hash.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, password: &str) -> Result<bool, Error> {
        bcrypt::verify(password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
