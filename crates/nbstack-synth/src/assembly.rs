// ABOUTME: Writes a synthesized stack to an assembly directory.
// ABOUTME: Produces the JSON and YAML templates, DOT graph, Markdown summary and manifest.json.

use std::fs;
use std::path::{Path, PathBuf};

use nbstack_core::StackDefinition;
use nbstack_core::export::{export_dot, export_json, export_markdown, export_yaml, synthesize};
use thiserror::Error;

use crate::manifest::Manifest;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors that can occur while writing an assembly.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json export error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml export error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("output path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Paths of the files written for one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFiles {
    pub template_json: PathBuf,
    pub template_yaml: PathBuf,
    pub graph: PathBuf,
    pub summary: PathBuf,
    pub manifest: PathBuf,
}

/// Owns an output directory and writes stack assemblies into it.
pub struct AssemblyWriter {
    out_dir: PathBuf,
}

impl AssemblyWriter {
    /// Create a writer rooted at `out_dir`, creating the directory if it
    /// does not exist.
    pub fn new(out_dir: PathBuf) -> Result<Self, SynthError> {
        if out_dir.exists() && !out_dir.is_dir() {
            return Err(SynthError::NotADirectory(out_dir));
        }
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }

    /// Return the output directory path.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Synthesize `stack` and write every artifact. Existing files for the
    /// same stack name are overwritten.
    pub fn write(&self, stack: &StackDefinition) -> Result<AssemblyFiles, SynthError> {
        let template = synthesize(stack);
        let name = &stack.stack_name;

        let files = AssemblyFiles {
            template_json: self.out_dir.join(format!("{}.template.json", name)),
            template_yaml: self.out_dir.join(format!("{}.template.yaml", name)),
            graph: self.out_dir.join(format!("{}.dot", name)),
            summary: self.out_dir.join(format!("{}.md", name)),
            manifest: self.out_dir.join(MANIFEST_FILE),
        };

        fs::write(&files.template_json, export_json(&template)?)?;
        fs::write(&files.template_yaml, export_yaml(&template)?)?;
        fs::write(&files.graph, export_dot(&template, name))?;
        fs::write(&files.summary, export_markdown(stack, &template))?;

        let template_file = files
            .template_json
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = Manifest::for_stack(stack, template_file);
        let mut manifest_json = serde_json::to_string_pretty(&manifest)?;
        manifest_json.push('\n');
        fs::write(&files.manifest, manifest_json)?;

        tracing::info!(
            "wrote assembly for {} ({} resources) to {}",
            name,
            template.resources.len(),
            self.out_dir.display()
        );

        Ok(files)
    }

    /// Read back the manifest of a previously written assembly.
    pub fn read_manifest(&self) -> Result<Manifest, SynthError> {
        let raw = fs::read_to_string(self.out_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbstack_core::{Environment, FrontDoorRevision, StackSettings};
    use tempfile::TempDir;

    fn prod_stack() -> StackDefinition {
        let settings = StackSettings {
            prod_certificate_arn: Some(
                "arn:aws:acm:us-east-1:222222222222:certificate/prod".to_string(),
            ),
            ..StackSettings::default()
        };
        StackDefinition::assemble(Environment::Prod, FrontDoorRevision::HttpApi, &settings).unwrap()
    }

    #[test]
    fn writer_creates_output_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nbstack.out");

        let writer = AssemblyWriter::new(out.clone()).unwrap();

        assert!(out.is_dir());
        assert_eq!(writer.out_dir(), &out);
    }

    #[test]
    fn writer_rejects_file_as_output() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "not a directory").unwrap();

        let result = AssemblyWriter::new(file);
        assert!(matches!(result, Err(SynthError::NotADirectory(_))));
    }

    #[test]
    fn writer_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let writer = AssemblyWriter::new(dir.path().join("out")).unwrap();

        let files = writer.write(&prod_stack()).unwrap();

        assert!(files.template_json.ends_with("prod-nbconvert-stack.template.json"));
        for path in [
            &files.template_json,
            &files.template_yaml,
            &files.graph,
            &files.summary,
            &files.manifest,
        ] {
            assert!(path.exists(), "{} should exist", path.display());
        }

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.template_json).unwrap()).unwrap();
        assert_eq!(
            json["Resources"]["NbconvertHttpDomain"]["Properties"]["DomainName"],
            "api-prod.synapse.org"
        );

        let dot = fs::read_to_string(&files.graph).unwrap();
        assert!(dot.contains("digraph prod_nbconvert_stack"));

        let md = fs::read_to_string(&files.summary).unwrap();
        assert!(md.contains("# prod-nbconvert-stack"));
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let writer = AssemblyWriter::new(dir.path().to_path_buf()).unwrap();
        writer.write(&prod_stack()).unwrap();

        let manifest = writer.read_manifest().unwrap();

        assert_eq!(manifest.stack_name, "prod-nbconvert-stack");
        assert_eq!(manifest.template_file, "prod-nbconvert-stack.template.json");
        assert_eq!(manifest.environment, Environment::Prod);
        assert_eq!(manifest.url_output, "HttpApiUrl");
    }
}
