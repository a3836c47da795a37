// ABOUTME: Defines the ComputeDescriptor for the container-image nbconvert function.
// ABOUTME: Fixed 120 second timeout; the architecture is pinned only for the function URL front door.

use std::path::PathBuf;
use std::time::Duration;

use crate::environment::Environment;
use crate::front_door::FrontDoorRevision;
use crate::settings::StackSettings;

/// Execution timeout of the function, identical across front door revisions.
pub const FUNCTION_TIMEOUT: Duration = Duration::from_secs(120);

/// CPU architecture of the function image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
}

impl Architecture {
    /// Value used by the Lambda `Architectures` property.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
        }
    }

    /// Docker build platform matching the architecture.
    pub fn docker_platform(self) -> &'static str {
        match self {
            Self::X86_64 => "linux/amd64",
        }
    }
}

/// The serverless function built from a container image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeDescriptor {
    pub name: String,
    pub image_directory: PathBuf,
    pub architecture: Option<Architecture>,
    pub timeout: Duration,
}

impl ComputeDescriptor {
    pub fn for_environment(
        environment: Environment,
        revision: FrontDoorRevision,
        settings: &StackSettings,
    ) -> Self {
        let architecture = revision.pins_architecture().then_some(Architecture::X86_64);
        Self {
            name: format!("{}-nbconvert-lambda", environment),
            image_directory: settings.image_directory.clone(),
            architecture,
            timeout: FUNCTION_TIMEOUT,
        }
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout.as_secs()
    }
}
