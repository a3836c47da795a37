// ABOUTME: Cloud assembly output for nbstack: writes templates, graph, summary and manifest to disk.
// ABOUTME: Mirrors the layout a deploy tool reads: one directory per synthesis with a manifest.json.

pub mod assembly;
pub mod manifest;

pub use assembly::{AssemblyFiles, AssemblyWriter, SynthError};
pub use manifest::{AssetEntry, Manifest};
