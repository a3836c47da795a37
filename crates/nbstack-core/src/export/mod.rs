// ABOUTME: Module root for stack exporters (CloudFormation JSON, YAML, DOT, Markdown).
// ABOUTME: Re-exports all export functions for convenient access.

pub mod cloudformation;
pub mod dot;
pub mod markdown;
pub mod yaml;

pub use cloudformation::{export_json, synthesize};
pub use dot::export_dot;
pub use markdown::export_markdown;
pub use yaml::export_yaml;
