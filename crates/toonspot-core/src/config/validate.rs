//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Largest accepted `limits.max_file_size_mb`.
const MAX_FILE_SIZE_MB: u64 = 1024;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.classify.threshold) {
            return Err(ConfigError::ValidationError(
                "classify.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.model.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.image_size must be > 0".into(),
            ));
        }
        if self.model.max_text_length < 2 {
            return Err(ConfigError::ValidationError(
                "model.max_text_length must be >= 2".into(),
            ));
        }
        if !(self.model.logit_scale > 0.0 && self.model.logit_scale.is_finite()) {
            return Err(ConfigError::ValidationError(
                "model.logit_scale must be a positive number".into(),
            ));
        }
        if !(1..=MAX_FILE_SIZE_MB).contains(&self.limits.max_file_size_mb) {
            return Err(ConfigError::ValidationError(format!(
                "limits.max_file_size_mb must be between 1 and {MAX_FILE_SIZE_MB}"
            )));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.item_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.item_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_files_per_request == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_files_per_request must be > 0".into(),
            ));
        }
        if self.server.preview_size == 0 {
            return Err(ConfigError::ValidationError(
                "server.preview_size must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_invalid_threshold() {
        let mut config = Config::default();
        config.classify.threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("classify.threshold"));

        config.classify.threshold = -0.1;
        assert!(config.validate().is_err());

        config.classify.threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_threshold_bounds() {
        let mut config = Config::default();
        config.classify.threshold = 0.0;
        assert!(config.validate().is_ok());
        config.classify.threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.limits.max_files_per_request = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_files_per_request"));

        let mut config = Config::default();
        config.limits.item_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("item_timeout_ms"));
    }

    #[test]
    fn test_validate_caps_file_size() {
        let mut config = Config::default();
        config.limits.max_file_size_mb = MAX_FILE_SIZE_MB;
        assert!(config.validate().is_ok());

        config.limits.max_file_size_mb = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size_mb"));

        config.limits.max_file_size_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_size_bytes_saturates() {
        let mut config = Config::default();
        assert_eq!(config.limits.max_file_size_bytes(), 20 * 1024 * 1024);
        config.limits.max_file_size_mb = u64::MAX;
        assert_eq!(config.limits.max_file_size_bytes(), u64::MAX);
    }

    #[test]
    fn test_validate_rejects_bad_model_settings() {
        let mut config = Config::default();
        config.model.logit_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.max_text_length = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_text_length"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }
}
