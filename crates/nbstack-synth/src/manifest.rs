// ABOUTME: Defines the assembly manifest describing what a synthesis produced.
// ABOUTME: Records the stack, its template files, and the container image asset the deploy must build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nbstack_core::export::cloudformation::IMAGE_URI_PARAMETER;
use nbstack_core::{Environment, FrontDoorRevision, StackDefinition};

pub const MANIFEST_VERSION: &str = "1";

/// A container image the deploy pipeline builds before applying the
/// template; its URI is passed in through `parameter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub kind: String,
    pub source_directory: String,
    pub parameter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Top-level manifest written next to the templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub stack_name: String,
    pub environment: Environment,
    pub front_door: FrontDoorRevision,
    pub template_file: String,
    pub url_output: String,
    pub assets: Vec<AssetEntry>,
    pub synthesized_at: DateTime<Utc>,
}

impl Manifest {
    /// Describe a stack whose JSON template was written to `template_file`.
    pub fn for_stack(stack: &StackDefinition, template_file: String) -> Self {
        let image = AssetEntry {
            kind: "docker-image".to_string(),
            source_directory: stack.compute.image_directory.display().to_string(),
            parameter: IMAGE_URI_PARAMETER.to_string(),
            platform: stack
                .compute
                .architecture
                .map(|a| a.docker_platform().to_string()),
        };

        Self {
            version: MANIFEST_VERSION.to_string(),
            stack_name: stack.stack_name.clone(),
            environment: stack.environment,
            front_door: stack.revision(),
            template_file,
            url_output: stack.url_output_name().to_string(),
            assets: vec![image],
            synthesized_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbstack_core::StackSettings;

    #[test]
    fn manifest_records_image_asset() {
        let stack = StackDefinition::assemble(
            Environment::Dev,
            FrontDoorRevision::FunctionUrl,
            &StackSettings::default(),
        )
        .unwrap();
        let manifest = Manifest::for_stack(&stack, "dev-nbconvert-stack.template.json".to_string());

        assert_eq!(manifest.stack_name, "dev-nbconvert-stack");
        assert_eq!(manifest.url_output, "FunctionUrl");
        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.assets[0].source_directory, "./nbconvert");
        assert_eq!(manifest.assets[0].parameter, "NbconvertImageUri");
        assert_eq!(manifest.assets[0].platform.as_deref(), Some("linux/amd64"));
        assert!(manifest.synthesized_at <= Utc::now());
    }

    #[test]
    fn manifest_serializes_enums_as_identifiers() {
        let settings = StackSettings {
            prod_certificate_arn: Some(
                "arn:aws:acm:us-east-1:222222222222:certificate/prod".to_string(),
            ),
            ..StackSettings::default()
        };
        let stack =
            StackDefinition::assemble(Environment::Prod, FrontDoorRevision::HttpApi, &settings)
                .unwrap();
        let manifest = Manifest::for_stack(&stack, "t.json".to_string());

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["environment"], "prod");
        assert_eq!(json["front_door"], "http-api");
        assert!(json["assets"][0].get("platform").is_none());

        let back: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, manifest);
    }
}
