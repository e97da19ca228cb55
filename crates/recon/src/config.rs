use serde::{Deserialize, Serialize};
use tally_core::CANONICAL_ACCOUNT_DIGITS;

use crate::error::ConfigError;

/// Engine tunables. The defaults are the production constants; a TOML file
/// only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    /// Trailing digits kept when canonicalizing account numbers.
    pub canonical_digits: usize,
    /// Description that marks a transaction as a check payment.
    pub check_keyword: String,
    /// Flag matched checks whose image amount differs from the statement line.
    pub cross_validate_check_amounts: bool,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            canonical_digits: CANONICAL_ACCOUNT_DIGITS,
            check_keyword: "check".to_string(),
            cross_validate_check_amounts: false,
        }
    }
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ReconConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canonical_digits == 0 {
            return Err(ConfigError::Invalid(
                "canonical_digits must be at least 1".into(),
            ));
        }
        if normalize_description(&self.check_keyword).is_empty() {
            return Err(ConfigError::Invalid("check_keyword must not be blank".into()));
        }
        Ok(())
    }

    /// True when `description` is the check keyword once case and
    /// whitespace are normalized. Nothing looser than equality counts.
    pub fn is_check_description(&self, description: Option<&str>) -> bool {
        description.is_some_and(|d| {
            normalize_description(d) == normalize_description(&self.check_keyword)
        })
    }
}

fn normalize_description(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
