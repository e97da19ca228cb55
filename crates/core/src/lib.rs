pub mod account;
pub mod date;
pub mod money;

pub use account::{
    AccountNumber, AccountNumberError, CheckDataKey, CheckNumber, CheckNumberError,
    CANONICAL_ACCOUNT_DIGITS,
};
pub use date::{resolve, PartialDate, PartialDateError};
pub use money::Money;
