// ABOUTME: Core library for nbstack, containing the stack model and its exporters.
// ABOUTME: Assembles the nbconvert function and its front door from an environment and settings.

pub mod compute;
pub mod environment;
pub mod error;
pub mod export;
pub mod front_door;
pub mod settings;
pub mod stack;
pub mod template;

pub use compute::{Architecture, ComputeDescriptor};
pub use environment::Environment;
pub use error::StackError;
pub use front_door::{
    AuthorizerDescriptor, CorsPolicy, CustomDomain, FrontDoorDescriptor, FrontDoorRevision,
};
pub use settings::{ConfigError, StackSettings};
pub use stack::StackDefinition;
pub use template::Template;
