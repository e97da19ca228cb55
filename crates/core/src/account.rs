use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of trailing digits kept by [`AccountNumber::canonical`].
pub const CANONICAL_ACCOUNT_DIGITS: usize = 4;

/// Digits-only, last-N account identity.
///
/// Statements print the full number on some pages and a masked one
/// (`XXXX-XXXX-1111`) on others, and check images carry yet another form.
/// The trailing digits are the only part every source agrees on, so all
/// cross-document matching goes through this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn canonical(raw: &str) -> Self {
        Self::canonical_with_digits(raw, CANONICAL_ACCOUNT_DIGITS)
    }

    pub fn canonical_with_digits(raw: &str, digits: usize) -> Self {
        let all: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        let skip = all.len().saturating_sub(digits);
        AccountNumber(all[skip..].iter().collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the raw input had no digits at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Account number is not canonical (digits only): '{0}'")]
pub struct AccountNumberError(pub String);

/// Accepts an already-canonical value. Deserialization cannot know the digit
/// count it was made with, so it checks the form rather than re-truncating.
impl TryFrom<String> for AccountNumber {
    type Error = AccountNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.chars().all(|c| c.is_ascii_digit()) {
            Ok(AccountNumber(value))
        } else {
            Err(AccountNumberError(value))
        }
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckNumberError {
    #[error("Check number has no digits: '{0}'")]
    NoDigits(String),
    #[error("Check number out of range: '{0}'")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckNumber(pub u64);

impl fmt::Display for CheckNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckNumber {
    type Err = CheckNumberError;

    /// Accepts `1000`, `#1000`, `No. 001000`; leading zeros are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(CheckNumberError::NoDigits(s.to_string()));
        }
        digits
            .parse::<u64>()
            .map(CheckNumber)
            .map_err(|_| CheckNumberError::OutOfRange(s.to_string()))
    }
}

/// Join key between a statement transaction and an extracted check image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckDataKey {
    pub account: AccountNumber,
    pub check_number: CheckNumber,
}

impl CheckDataKey {
    pub fn new(account: AccountNumber, check_number: CheckNumber) -> Self {
        CheckDataKey { account, check_number }
    }
}

impl fmt::Display for CheckDataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.check_number)
    }
}
