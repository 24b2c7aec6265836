//! Startup checks beyond what `Config` validates on load.

use anyhow::Result;
use guestdrop_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Fails on settings that would leave the service insecure; warns on ones that
/// merely look wrong.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() {
        if config.cors_origins().iter().any(|origin| origin == "*") {
            return Err(anyhow::anyhow!(
                "CORS configured to allow all origins (*) in production. \
                Set specific allowed origins via CORS_ORIGINS."
            ));
        }

        if config.admin_password().len() < 12 {
            tracing::warn!("ADMIN_PASSWORD is shorter than 12 characters");
        }

        if !config.public_base_url().starts_with("https://") {
            tracing::warn!(
                public_base_url = %config.public_base_url(),
                "PUBLIC_BASE_URL is not HTTPS; guest links will be sent in clear text"
            );
        }
    }

    if config.storage_backend() == Some(StorageBackend::Local)
        && config.local_storage_signing_key() == config.admin_password()
    {
        tracing::warn!(
            "LOCAL_STORAGE_SIGNING_KEY not set; retrieval tokens are signed with the admin password"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestdrop_core::UploadServiceConfig;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(Config(Box::new(UploadServiceConfig::from_lookup(|key| {
            vars.get(key).cloned()
        })?)))
    }

    #[test]
    fn test_local_development_config_passes() {
        let config = config(&[
            ("ADMIN_PASSWORD", "secret"),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/guestdrop"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000"),
        ])
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut config = config(&[
            ("ADMIN_PASSWORD", "a-long-admin-secret"),
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://photos.example.com"),
            ("S3_BUCKET", "bucket"),
            ("S3_REGION", "eu-west-1"),
        ])
        .unwrap();
        assert!(validate_config(&config).is_ok());

        config.0.base.cors_origins = vec!["*".to_string()];
        assert!(validate_config(&config).is_err());
    }
}
