//! Progression configuration: XP award amounts, unlock target and record name.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the persisted record the site has always used.
pub const DEFAULT_RECORD_NAME: &str = "armando-os-xp-store";

/// XP needed for 100% system understanding.
pub const DEFAULT_UNDERSTANDING_TARGET_XP: u64 = 350;

/// Fixed XP awards, one per kind of triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpRules {
    /// First time a module is opened.
    pub first_module_open: u64,
    /// First time a module's completion predicate holds.
    pub module_complete: u64,
    /// First discovery of a given easter egg id.
    pub easter_egg: u64,
    /// The one-shot TPM simulator completion.
    pub tpm_simulator: u64,
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            first_module_open: 10,
            module_complete: 40,
            easter_egg: 50,
            tpm_simulator: 100,
        }
    }
}

/// Configuration for a [`crate::ProgressionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// XP award table.
    pub rules: XpRules,
    /// XP corresponding to 100% system understanding.
    pub understanding_target_xp: u64,
    /// Name of the persisted record. [`crate::ProgressionStore::open_in_dir`]
    /// stores it in `<dir>/<record_name>.opxp`.
    pub record_name: String,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            rules: XpRules::default(),
            understanding_target_xp: DEFAULT_UNDERSTANDING_TARGET_XP,
            record_name: DEFAULT_RECORD_NAME.to_string(),
        }
    }
}

impl ProgressionConfig {
    /// Check the configuration, returning it unchanged when valid.
    ///
    /// # Errors
    /// - `ZeroUnderstandingTarget` if the target is zero
    /// - `EmptyRecordName` / `BelowMinimum` if the record name is unusable
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.understanding_target_xp == 0 {
            return Err(ConfigError::ZeroUnderstandingTarget);
        }
        validate_record_name(&self.record_name)?;
        Ok(self)
    }
}

/// Record names double as file stems, so they are limited to `[A-Za-z0-9_-]`.
pub(crate) fn validate_record_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyRecordName);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(ConfigError::InvalidRecordName {
            name: name.to_string(),
            character: bad,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_rules() {
        let cfg = ProgressionConfig::default().validate().unwrap();
        assert_eq!(cfg.rules.first_module_open, 10);
        assert_eq!(cfg.rules.module_complete, 40);
        assert_eq!(cfg.rules.easter_egg, 50);
        assert_eq!(cfg.rules.tpm_simulator, 100);
        assert_eq!(cfg.understanding_target_xp, 350);
        assert_eq!(cfg.record_name, "armando-os-xp-store");
    }

    #[test]
    fn zero_target_is_rejected() {
        let cfg = ProgressionConfig {
            understanding_target_xp: 0,
            ..ProgressionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroUnderstandingTarget)));
    }

    #[test]
    fn record_name_rules() {
        assert!(validate_record_name("armando-os-xp-store").is_ok());
        assert!(validate_record_name("profile_2").is_ok());
        assert!(matches!(validate_record_name("  "), Err(ConfigError::EmptyRecordName)));
        assert!(matches!(
            validate_record_name("a/b"),
            Err(ConfigError::InvalidRecordName { character: '/', .. })
        ));
        assert!(validate_record_name("x.y").is_err());
    }
}
