// ABOUTME: Configuration loading and validation for stack synthesis.
// ABOUTME: Reads certificate ARNs, JWT settings, domain suffix and image directory from environment variables.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment::Environment;

/// Issuer URL template; `{env}` is replaced with the environment identifier.
pub const DEFAULT_ISSUER_TEMPLATE: &str = "https://repo-prod.{env}.sagebase.org/auth/v1";
pub const DEFAULT_DOMAIN_SUFFIX: &str = "synapse.org";
pub const DEFAULT_IMAGE_DIR: &str = "./nbconvert";
/// Non-production audience placeholder.
pub const PLACEHOLDER_AUDIENCE: &str = "0";

const ENV_PLACEHOLDER: &str = "{env}";

pub const DEV_CERT_VAR: &str = "NBSTACK_DEV_CERT_ARN";
pub const PROD_CERT_VAR: &str = "NBSTACK_PROD_CERT_ARN";
pub const AUDIENCE_VAR: &str = "NBSTACK_JWT_AUDIENCE";
pub const ISSUER_TEMPLATE_VAR: &str = "NBSTACK_JWT_ISSUER_TEMPLATE";
pub const DOMAIN_SUFFIX_VAR: &str = "NBSTACK_DOMAIN_SUFFIX";
pub const IMAGE_DIR_VAR: &str = "NBSTACK_IMAGE_DIR";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NBSTACK_JWT_ISSUER_TEMPLATE must contain the {{env}} placeholder: {0}")]
    InvalidIssuerTemplate(String),

    #[error("NBSTACK_JWT_AUDIENCE must name at least one audience")]
    EmptyAudience,

    #[error("{variable} is not an ACM certificate ARN: {value}")]
    InvalidCertificateArn {
        variable: &'static str,
        value: String,
    },

    #[error("NBSTACK_DOMAIN_SUFFIX must not be empty")]
    EmptyDomainSuffix,
}

/// Account-specific inputs of a stack, kept out of the stack model so the
/// same definition can be synthesized against different accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSettings {
    pub dev_certificate_arn: Option<String>,
    pub prod_certificate_arn: Option<String>,
    pub jwt_audience: Vec<String>,
    pub issuer_template: String,
    pub domain_suffix: String,
    pub image_directory: PathBuf,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            dev_certificate_arn: None,
            prod_certificate_arn: None,
            jwt_audience: vec![PLACEHOLDER_AUDIENCE.to_string()],
            issuer_template: DEFAULT_ISSUER_TEMPLATE.to_string(),
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
            image_directory: PathBuf::from(DEFAULT_IMAGE_DIR),
        }
    }
}

impl StackSettings {
    /// Load settings from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - NBSTACK_DEV_CERT_ARN: ACM certificate for the dev custom domain (optional)
    /// - NBSTACK_PROD_CERT_ARN: ACM certificate for the prod custom domain (optional)
    /// - NBSTACK_JWT_AUDIENCE: comma-separated audiences (default: 0)
    /// - NBSTACK_JWT_ISSUER_TEMPLATE: issuer URL with an {env} placeholder
    /// - NBSTACK_DOMAIN_SUFFIX: parent domain of api-{env} (default: synapse.org)
    /// - NBSTACK_IMAGE_DIR: container image build directory (default: ./nbconvert)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let jwt_audience = match get(AUDIENCE_VAR) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.jwt_audience,
        };

        let settings = Self {
            dev_certificate_arn: get(DEV_CERT_VAR),
            prod_certificate_arn: get(PROD_CERT_VAR),
            jwt_audience,
            issuer_template: get(ISSUER_TEMPLATE_VAR).unwrap_or(defaults.issuer_template),
            domain_suffix: get(DOMAIN_SUFFIX_VAR).unwrap_or(defaults.domain_suffix),
            image_directory: get(IMAGE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.image_directory),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check the invariants that `from_lookup` enforces. Useful for settings
    /// built by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.issuer_template.contains(ENV_PLACEHOLDER) {
            return Err(ConfigError::InvalidIssuerTemplate(self.issuer_template.clone()));
        }
        if self.jwt_audience.is_empty() {
            return Err(ConfigError::EmptyAudience);
        }
        if self.domain_suffix.trim().is_empty() {
            return Err(ConfigError::EmptyDomainSuffix);
        }
        for (variable, arn) in [
            (DEV_CERT_VAR, &self.dev_certificate_arn),
            (PROD_CERT_VAR, &self.prod_certificate_arn),
        ] {
            if let Some(value) = arn.as_ref().filter(|v| !is_acm_certificate_arn(v)) {
                return Err(ConfigError::InvalidCertificateArn {
                    variable,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Certificate ARN configured for `environment`, if any.
    pub fn certificate_arn(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Prod => self.prod_certificate_arn.as_deref(),
            Environment::Dev => self.dev_certificate_arn.as_deref(),
        }
    }

    /// Name of the variable that supplies the certificate for `environment`.
    pub fn certificate_variable(environment: Environment) -> &'static str {
        match environment {
            Environment::Prod => PROD_CERT_VAR,
            Environment::Dev => DEV_CERT_VAR,
        }
    }

    pub fn issuer_for(&self, environment: Environment) -> String {
        self.issuer_template.replace(ENV_PLACEHOLDER, environment.as_str())
    }

    pub fn domain_for(&self, environment: Environment) -> String {
        format!("api-{}.{}", environment, self.domain_suffix)
    }

    /// True when the audience is still the non-production placeholder.
    pub fn uses_placeholder_audience(&self) -> bool {
        self.jwt_audience.len() == 1 && self.jwt_audience[0] == PLACEHOLDER_AUDIENCE
    }
}

/// `arn:<partition>:acm:<region>:<account>:certificate/<id>`
fn is_acm_certificate_arn(value: &str) -> bool {
    let parts: Vec<&str> = value.splitn(6, ':').collect();
    parts.len() == 6
        && parts[0] == "arn"
        && parts[2] == "acm"
        && parts[5].starts_with("certificate/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DEV_ARN: &str = "arn:aws:acm:us-east-1:111111111111:certificate/dev-cert";
    const PROD_ARN: &str = "arn:aws:acm:us-east-1:222222222222:certificate/prod-cert";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn settings_load_defaults() {
        let settings = StackSettings::from_lookup(lookup_from(&[])).unwrap();

        assert!(settings.dev_certificate_arn.is_none());
        assert!(settings.prod_certificate_arn.is_none());
        assert_eq!(settings.jwt_audience, vec!["0".to_string()]);
        assert_eq!(settings.issuer_template, DEFAULT_ISSUER_TEMPLATE);
        assert_eq!(settings.domain_suffix, "synapse.org");
        assert_eq!(settings.image_directory, PathBuf::from("./nbconvert"));
        assert!(settings.uses_placeholder_audience());
    }

    #[test]
    fn settings_read_all_variables() {
        let settings = StackSettings::from_lookup(lookup_from(&[
            (DEV_CERT_VAR, DEV_ARN),
            (PROD_CERT_VAR, PROD_ARN),
            (AUDIENCE_VAR, "web-client, cli-client"),
            (ISSUER_TEMPLATE_VAR, "https://auth.{env}.example.org"),
            (DOMAIN_SUFFIX_VAR, "example.org"),
            (IMAGE_DIR_VAR, "images/nbconvert"),
        ]))
        .unwrap();

        assert_eq!(settings.certificate_arn(Environment::Dev), Some(DEV_ARN));
        assert_eq!(settings.certificate_arn(Environment::Prod), Some(PROD_ARN));
        assert_eq!(settings.jwt_audience, vec!["web-client", "cli-client"]);
        assert_eq!(settings.issuer_for(Environment::Prod), "https://auth.prod.example.org");
        assert_eq!(settings.domain_for(Environment::Dev), "api-dev.example.org");
        assert_eq!(settings.image_directory, PathBuf::from("images/nbconvert"));
        assert!(!settings.uses_placeholder_audience());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let settings = StackSettings::from_lookup(lookup_from(&[
            (DEV_CERT_VAR, ""),
            (DOMAIN_SUFFIX_VAR, "  "),
        ]))
        .unwrap();

        assert!(settings.dev_certificate_arn.is_none());
        assert_eq!(settings.domain_suffix, "synapse.org");
    }

    #[test]
    fn issuer_template_must_contain_placeholder() {
        let err = StackSettings::from_lookup(lookup_from(&[(
            ISSUER_TEMPLATE_VAR,
            "https://repo-prod.prod.sagebase.org/auth/v1",
        )]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidIssuerTemplate(_)));
        assert!(err.to_string().contains("{env}"), "error should name the placeholder: {}", err);
    }

    #[test]
    fn audience_of_only_separators_is_rejected() {
        let err = StackSettings::from_lookup(lookup_from(&[(AUDIENCE_VAR, " , ,")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAudience));
    }

    #[test]
    fn certificate_arn_must_be_acm() {
        let err = StackSettings::from_lookup(lookup_from(&[(
            PROD_CERT_VAR,
            "arn:aws:iam::222222222222:role/not-a-cert",
        )]))
        .unwrap_err();

        assert!(
            err.to_string().contains("NBSTACK_PROD_CERT_ARN"),
            "error should mention the variable: {}",
            err
        );
    }

    #[test]
    fn default_issuer_embeds_environment() {
        let settings = StackSettings::default();
        assert_eq!(
            settings.issuer_for(Environment::Dev),
            "https://repo-prod.dev.sagebase.org/auth/v1"
        );
        assert_eq!(
            settings.issuer_for(Environment::Prod),
            "https://repo-prod.prod.sagebase.org/auth/v1"
        );
    }

    #[test]
    fn default_domain_has_api_prefix() {
        let settings = StackSettings::default();
        assert_eq!(settings.domain_for(Environment::Dev), "api-dev.synapse.org");
        assert_eq!(settings.domain_for(Environment::Prod), "api-prod.synapse.org");
    }
}
