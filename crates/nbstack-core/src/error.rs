// ABOUTME: Error type for stack assembly.
// ABOUTME: Covers unknown environment and front door names and missing certificate configuration.

use thiserror::Error;

use crate::environment::Environment;
use crate::front_door::FrontDoorRevision;

/// Errors that can occur while resolving inputs and assembling a stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("unknown environment '{0}': expected 'dev' or 'prod'")]
    UnknownEnvironment(String),

    #[error("unknown front door '{0}': expected 'function-url', 'rest-api' or 'http-api'")]
    UnknownFrontDoor(String),

    #[error(
        "the {revision} front door needs a custom domain certificate but {variable} is not set for the {environment} environment"
    )]
    MissingCertificate {
        environment: Environment,
        revision: FrontDoorRevision,
        variable: &'static str,
    },
}
