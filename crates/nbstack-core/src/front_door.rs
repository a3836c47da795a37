// ABOUTME: Defines the front door revisions and the descriptors they are assembled from.
// ABOUTME: Covers custom domain, CORS policy and JWT authorizer selection per environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::error::StackError;
use crate::settings::StackSettings;

/// Path segment of the single GET route, identical in every environment.
pub const BASE_PATH: &str = "nbconvert";

/// Origins allowed to call the prod HTTP API from a browser.
pub const PROD_ALLOW_ORIGINS: [&str; 2] = ["https://www.synapse.org", "https://synapse.org"];
pub const ALLOW_METHODS: [&str; 2] = ["GET", "OPTIONS"];
pub const ALLOW_HEADERS: [&str; 2] = ["Authorization", "Content-Type"];

pub const JWT_IDENTITY_SOURCE: &str = "$request.header.Authorization";

/// The externally reachable entry point routing to the function. Revisions
/// are mutually exclusive; `HttpApi` is the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontDoorRevision {
    /// Public, unauthenticated function URL.
    FunctionUrl,
    /// REST API with a public resource policy and custom domain.
    RestApi,
    /// HTTP API with CORS, custom domain and a JWT authorizer.
    #[default]
    HttpApi,
}

impl FrontDoorRevision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FunctionUrl => "function-url",
            Self::RestApi => "rest-api",
            Self::HttpApi => "http-api",
        }
    }

    pub fn needs_custom_domain(self) -> bool {
        matches!(self, Self::RestApi | Self::HttpApi)
    }

    pub fn pins_architecture(self) -> bool {
        matches!(self, Self::FunctionUrl)
    }
}

impl FromStr for FrontDoorRevision {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function-url" => Ok(Self::FunctionUrl),
            "rest-api" => Ok(Self::RestApi),
            "http-api" => Ok(Self::HttpApi),
            other => Err(StackError::UnknownFrontDoor(other.to_string())),
        }
    }
}

impl fmt::Display for FrontDoorRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser preflight policy of the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl CorsPolicy {
    /// Prod allows the two synapse.org origins; every other environment
    /// allows any origin.
    pub fn for_environment(environment: Environment) -> Self {
        let allow_origins = if environment.is_prod() {
            PROD_ALLOW_ORIGINS.iter().map(|o| o.to_string()).collect()
        } else {
            vec!["*".to_string()]
        };
        Self {
            allow_origins,
            allow_methods: ALLOW_METHODS.iter().map(|m| m.to_string()).collect(),
            allow_headers: ALLOW_HEADERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// JWT authorizer guarding the HTTP API route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerDescriptor {
    pub name: String,
    pub issuer: String,
    pub audience: Vec<String>,
    pub identity_source: String,
}

impl AuthorizerDescriptor {
    pub fn for_environment(environment: Environment, settings: &StackSettings) -> Self {
        Self {
            name: format!("{}-nbconvert-jwt", environment),
            issuer: settings.issuer_for(environment),
            audience: settings.jwt_audience.clone(),
            identity_source: JWT_IDENTITY_SOURCE.to_string(),
        }
    }
}

/// TLS custom domain mapped onto the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDomain {
    pub domain_name: String,
    pub certificate_arn: String,
}

impl CustomDomain {
    /// Public URL of the route through the custom domain.
    pub fn route_url(&self) -> String {
        format!("https://{}/{}", self.domain_name, BASE_PATH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontDoorDescriptor {
    pub revision: FrontDoorRevision,
    pub base_path: String,
    pub custom_domain: Option<CustomDomain>,
    pub cors: Option<CorsPolicy>,
    pub authorizer: Option<AuthorizerDescriptor>,
}

impl FrontDoorDescriptor {
    /// Build the front door for `revision`. Fails when the revision needs a
    /// custom domain and no certificate is configured for `environment`.
    pub fn for_environment(
        environment: Environment,
        revision: FrontDoorRevision,
        settings: &StackSettings,
    ) -> Result<Self, StackError> {
        let custom_domain = if revision.needs_custom_domain() {
            let certificate_arn = settings.certificate_arn(environment).ok_or(
                StackError::MissingCertificate {
                    environment,
                    revision,
                    variable: StackSettings::certificate_variable(environment),
                },
            )?;
            Some(CustomDomain {
                domain_name: settings.domain_for(environment),
                certificate_arn: certificate_arn.to_string(),
            })
        } else {
            None
        };

        let (cors, authorizer) = match revision {
            FrontDoorRevision::HttpApi => (
                Some(CorsPolicy::for_environment(environment)),
                Some(AuthorizerDescriptor::for_environment(environment, settings)),
            ),
            FrontDoorRevision::FunctionUrl | FrontDoorRevision::RestApi => (None, None),
        };

        Ok(Self {
            revision,
            base_path: BASE_PATH.to_string(),
            custom_domain,
            cors,
            authorizer,
        })
    }

    /// Route key of the single GET route, e.g. `GET /nbconvert`.
    pub fn route_key(&self) -> String {
        format!("GET /{}", self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_certs() -> StackSettings {
        StackSettings {
            dev_certificate_arn: Some(
                "arn:aws:acm:us-east-1:111111111111:certificate/dev".to_string(),
            ),
            prod_certificate_arn: Some(
                "arn:aws:acm:us-east-1:222222222222:certificate/prod".to_string(),
            ),
            ..StackSettings::default()
        }
    }

    #[test]
    fn revision_names_round_trip() {
        for revision in [
            FrontDoorRevision::FunctionUrl,
            FrontDoorRevision::RestApi,
            FrontDoorRevision::HttpApi,
        ] {
            assert_eq!(revision.as_str().parse::<FrontDoorRevision>().unwrap(), revision);
        }
        assert_eq!(FrontDoorRevision::default(), FrontDoorRevision::HttpApi);
        assert_eq!(
            "websocket".parse::<FrontDoorRevision>().unwrap_err(),
            StackError::UnknownFrontDoor("websocket".to_string())
        );
    }

    #[test]
    fn prod_cors_lists_exact_origins() {
        let cors = CorsPolicy::for_environment(Environment::Prod);
        assert_eq!(
            cors.allow_origins,
            vec!["https://www.synapse.org".to_string(), "https://synapse.org".to_string()]
        );
    }

    #[test]
    fn dev_cors_allows_any_origin() {
        let cors = CorsPolicy::for_environment(Environment::Dev);
        assert_eq!(cors.allow_origins, vec!["*".to_string()]);
        assert_eq!(cors.allow_methods, vec!["GET".to_string(), "OPTIONS".to_string()]);
    }

    #[test]
    fn http_api_carries_cors_and_authorizer() {
        let front_door = FrontDoorDescriptor::for_environment(
            Environment::Prod,
            FrontDoorRevision::HttpApi,
            &settings_with_certs(),
        )
        .unwrap();

        let domain = front_door.custom_domain.as_ref().unwrap();
        assert_eq!(domain.domain_name, "api-prod.synapse.org");
        assert!(domain.certificate_arn.ends_with("certificate/prod"));
        assert_eq!(domain.route_url(), "https://api-prod.synapse.org/nbconvert");

        let authorizer = front_door.authorizer.as_ref().unwrap();
        assert_eq!(authorizer.issuer, "https://repo-prod.prod.sagebase.org/auth/v1");
        assert_eq!(authorizer.audience, vec!["0".to_string()]);
        assert_eq!(authorizer.identity_source, "$request.header.Authorization");

        assert!(front_door.cors.is_some());
        assert_eq!(front_door.route_key(), "GET /nbconvert");
    }

    #[test]
    fn rest_api_has_domain_but_no_authorizer() {
        let front_door = FrontDoorDescriptor::for_environment(
            Environment::Dev,
            FrontDoorRevision::RestApi,
            &settings_with_certs(),
        )
        .unwrap();

        assert_eq!(
            front_door.custom_domain.as_ref().unwrap().domain_name,
            "api-dev.synapse.org"
        );
        assert!(front_door.cors.is_none());
        assert!(front_door.authorizer.is_none());
    }

    #[test]
    fn function_url_needs_no_certificate() {
        let front_door = FrontDoorDescriptor::for_environment(
            Environment::Prod,
            FrontDoorRevision::FunctionUrl,
            &StackSettings::default(),
        )
        .unwrap();

        assert!(front_door.custom_domain.is_none());
        assert_eq!(front_door.base_path, "nbconvert");
    }

    #[test]
    fn missing_certificate_is_reported() {
        let settings = StackSettings {
            prod_certificate_arn: None,
            ..settings_with_certs()
        };
        let err = FrontDoorDescriptor::for_environment(
            Environment::Prod,
            FrontDoorRevision::HttpApi,
            &settings,
        )
        .unwrap_err();

        assert!(matches!(err, StackError::MissingCertificate { .. }));
        assert!(
            err.to_string().contains("NBSTACK_PROD_CERT_ARN"),
            "error should name the variable: {}",
            err
        );
    }
}
