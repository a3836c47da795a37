// ABOUTME: Exports a synthesized Template as a CloudFormation YAML document.
// ABOUTME: Uses serde_yaml over the same model as the JSON exporter, so key ordering matches.

use crate::template::Template;

/// Export the template as YAML. Intrinsic functions keep their long form
/// (`Fn::GetAtt`, `Ref`), which CloudFormation accepts in YAML templates.
pub fn export_yaml(template: &Template) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(template)
}
