// ABOUTME: Assembles the StackDefinition: compute resource first, then the front door wired to it.
// ABOUTME: Assembly is deterministic; the only branch is the dev/prod environment selection.

use crate::compute::ComputeDescriptor;
use crate::environment::Environment;
use crate::error::StackError;
use crate::front_door::{FrontDoorDescriptor, FrontDoorRevision};
use crate::settings::StackSettings;

/// The complete declarative graph for one environment and front door
/// revision. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDefinition {
    pub stack_name: String,
    pub environment: Environment,
    pub compute: ComputeDescriptor,
    pub front_door: FrontDoorDescriptor,
}

impl StackDefinition {
    pub fn assemble(
        environment: Environment,
        revision: FrontDoorRevision,
        settings: &StackSettings,
    ) -> Result<Self, StackError> {
        tracing::debug!(
            "assembling {} stack with {} front door",
            environment,
            revision
        );

        let compute = ComputeDescriptor::for_environment(environment, revision, settings);
        let front_door = FrontDoorDescriptor::for_environment(environment, revision, settings)?;

        if front_door.authorizer.is_some()
            && environment.is_prod()
            && settings.uses_placeholder_audience()
        {
            tracing::warn!(
                "prod JWT authorizer uses the placeholder audience '0'; set NBSTACK_JWT_AUDIENCE"
            );
        }

        let stack = Self {
            stack_name: format!("{}-nbconvert-stack", environment),
            environment,
            compute,
            front_door,
        };

        tracing::info!(
            "assembled stack {} (function {}, front door {})",
            stack.stack_name,
            stack.compute.name,
            revision
        );

        Ok(stack)
    }

    pub fn revision(&self) -> FrontDoorRevision {
        self.front_door.revision
    }

    /// Name of the deploy-time output carrying the front door URL.
    pub fn url_output_name(&self) -> &'static str {
        match self.revision() {
            FrontDoorRevision::FunctionUrl => "FunctionUrl",
            FrontDoorRevision::RestApi => "RestApiUrl",
            FrontDoorRevision::HttpApi => "HttpApiUrl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_ARN: &str = "arn:aws:acm:us-east-1:111111111111:certificate/dev";
    const PROD_ARN: &str = "arn:aws:acm:us-east-1:222222222222:certificate/prod";

    fn settings() -> StackSettings {
        StackSettings {
            dev_certificate_arn: Some(DEV_ARN.to_string()),
            prod_certificate_arn: Some(PROD_ARN.to_string()),
            ..StackSettings::default()
        }
    }

    #[test]
    fn prod_stack_selects_prod_inputs() {
        let stack =
            StackDefinition::assemble(Environment::Prod, FrontDoorRevision::HttpApi, &settings())
                .unwrap();

        let domain = stack.front_door.custom_domain.as_ref().unwrap();
        assert_eq!(domain.domain_name, "api-prod.synapse.org");
        assert_eq!(domain.certificate_arn, PROD_ARN);
        assert_eq!(
            stack.front_door.cors.as_ref().unwrap().allow_origins,
            vec!["https://www.synapse.org", "https://synapse.org"]
        );
        assert_eq!(stack.stack_name, "prod-nbconvert-stack");
        assert_eq!(stack.url_output_name(), "HttpApiUrl");
    }

    #[test]
    fn absent_environment_selects_dev_inputs() {
        let environment = Environment::resolve(None).unwrap();
        let stack = StackDefinition::assemble(environment, FrontDoorRevision::HttpApi, &settings())
            .unwrap();

        let domain = stack.front_door.custom_domain.as_ref().unwrap();
        assert_eq!(domain.domain_name, "api-dev.synapse.org");
        assert_eq!(domain.certificate_arn, DEV_ARN);
        assert_eq!(stack.front_door.cors.as_ref().unwrap().allow_origins, vec!["*"]);
    }

    #[test]
    fn assembly_is_deterministic() {
        for revision in [
            FrontDoorRevision::FunctionUrl,
            FrontDoorRevision::RestApi,
            FrontDoorRevision::HttpApi,
        ] {
            let a = StackDefinition::assemble(Environment::Dev, revision, &settings()).unwrap();
            let b = StackDefinition::assemble(Environment::Dev, revision, &settings()).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.front_door.base_path, "nbconvert");
            assert_eq!(a.compute.timeout_seconds(), 120);
        }
    }

    #[test]
    fn missing_certificate_fails_assembly() {
        let result = StackDefinition::assemble(
            Environment::Dev,
            FrontDoorRevision::RestApi,
            &StackSettings::default(),
        );
        assert!(matches!(result, Err(StackError::MissingCertificate { .. })));
    }
}
