//! Error types and result handling for specimen resolution.

use thiserror::Error;

use crate::config::ConfigError;
use crate::request::Request;

/// Boxed error raised by user code (constructors, factories, setters)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Everything that can go wrong while configuring a fixture or resolving a request
#[derive(Debug, Error)]
pub enum FixtureError {
    /// No builder, relay or residue collector could satisfy the request
    #[error("unable to create a specimen for {request}{}", render_path(.path))]
    ObjectCreation {
        /// The innermost request that could not be satisfied
        request: String,
        /// Requests from the root down to the unresolved one
        path: Vec<String>,
    },

    /// The request graph loops back onto a request that is still being resolved
    #[error("recursion detected while resolving {request}{}", render_path(.path))]
    Recursion { request: String, path: Vec<String> },

    /// A constructor or factory method rejected its arguments
    #[error("{method} of {type_name} failed: {source}")]
    Invocation {
        method: String,
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// A member setter rejected the value it was given
    #[error("assigning {member} failed: {source}")]
    MemberAssignment {
        member: String,
        #[source]
        source: BoxError,
    },

    /// A member selected for population could not be resolved
    #[error("no specimen could be resolved for {member}")]
    UnresolvedMember { member: String },

    /// A value did not have the type its consumer expected
    #[error("expected a value of type {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid customization, composer or registration arguments
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Invalid fixture configuration values
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FixtureError {
    /// Create an object creation error for the innermost unresolved request
    pub fn object_creation(request: &Request, path: &[Request]) -> Self {
        Self::ObjectCreation {
            request: request.to_string(),
            path: path.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a recursion error for a request that re-entered its own resolution
    pub fn recursion(request: &Request, path: &[Request]) -> Self {
        Self::Recursion {
            request: request.to_string(),
            path: path.iter().map(ToString::to_string).collect(),
        }
    }

    /// Wrap an error raised by a constructor or factory
    pub fn invocation(
        method: impl Into<String>,
        type_name: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Invocation {
            method: method.into(),
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// Wrap an error raised by a member setter
    pub fn member_assignment(member: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::MemberAssignment {
            member: member.into(),
            source: source.into(),
        }
    }

    /// Create an unresolved member error
    pub fn unresolved_member(member: impl Into<String>) -> Self {
        Self::UnresolvedMember {
            member: member.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error reports a recursive request graph
    pub fn is_recursion(&self) -> bool {
        matches!(self, Self::Recursion { .. })
    }

    /// Whether this error reports an unresolvable request
    pub fn is_object_creation(&self) -> bool {
        matches!(self, Self::ObjectCreation { .. })
    }

    /// Whether this error was raised by user code rather than by the engine
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Invocation { .. } | Self::MemberAssignment { .. }
        )
    }
}

fn render_path(path: &[String]) -> String {
    if path.len() < 2 {
        String::new()
    } else {
        format!("; request path: {}", path.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "value rejected")
        }
    }

    impl std::error::Error for Rejected {}

    #[test]
    fn test_object_creation_display_includes_path() {
        let root = Request::of::<Vec<String>>();
        let inner = Request::of::<String>();
        let error = FixtureError::object_creation(&inner, &[root, inner.clone()]);

        let message = error.to_string();
        assert!(message.starts_with("unable to create a specimen for String"));
        assert!(message.contains("request path: Vec<String> -> String"));
        assert!(error.is_object_creation());
        assert!(!error.is_recursion());
    }

    #[test]
    fn test_single_element_path_is_not_rendered() {
        let request = Request::of::<u8>();
        let error = FixtureError::recursion(&request, std::slice::from_ref(&request));
        assert_eq!(error.to_string(), "recursion detected while resolving u8");
        assert!(error.is_recursion());
    }

    #[test]
    fn test_invocation_error_keeps_source() {
        use std::error::Error;

        let error = FixtureError::invocation("try_new", "Filter", Rejected);
        assert_eq!(error.to_string(), "try_new of Filter failed: value rejected");
        assert!(error.source().is_some());
        assert!(error.is_user_error());
    }

    #[test]
    fn test_config_error_converts() {
        let error: FixtureError = ConfigError::InvalidRecursionDepth(0).into();
        assert!(matches!(error, FixtureError::Config(_)));
    }
}
