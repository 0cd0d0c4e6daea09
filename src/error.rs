//! Error types for the depcache library.
//!
//! ## Key Components
//!
//! - [`PolicyError`]: Returned by policy operations (`query`, `contains`)
//!   when the policy has no bound graph or the node is unknown.
//! - [`GraphError`]: Returned while building a [`DependencyGraph`](crate::graph::DependencyGraph)
//!   from invalid node attributes or dangling edges.
//! - [`ConfigError`]: Returned when policy configuration parameters are
//!   invalid (e.g. a zero divisor or a non-positive exploration constant).
//!
//! ## Example Usage
//!
//! ```
//! use depcache::error::ConfigError;
//! use depcache::policy::composite::CompositeConfig;
//!
//! let bad = CompositeConfig {
//!     exploration: 0.0,
//!     ..CompositeConfig::default()
//! };
//! let err: ConfigError = bad.validate().unwrap_err();
//! assert!(err.to_string().contains("exploration"));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// PolicyError
// ---------------------------------------------------------------------------

/// Error returned by cache policy operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `query` or `contains` was called before `initialize` bound a graph.
    #[error("policy has no bound graph; call initialize() first")]
    Unbound,

    /// The queried node is not part of the bound graph.
    #[error("node {0} is not in the bound graph")]
    NodeNotFound(String),

    /// The weighted sampler rejected the sub-policy selection weights.
    #[error("invalid sub-policy selection weights: {0}")]
    InvalidWeights(String),
}

impl PolicyError {
    pub(crate) fn node_not_found(node: &impl std::fmt::Debug) -> Self {
        Self::NodeNotFound(format!("{node:?}"))
    }
}

// ---------------------------------------------------------------------------
// GraphError
// ---------------------------------------------------------------------------

/// Error returned when a workload graph violates the input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Node sizes must be finite and strictly positive.
    #[error("node {node} has invalid size {size}; sizes must be finite and > 0")]
    InvalidSize { node: String, size: f64 },

    /// An edge endpoint was never added as a node.
    #[error("edge endpoint {0} is not a node of the graph")]
    UnknownNode(String),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when policy configuration parameters are invalid.
///
/// Produced by [`CompositeConfig::validate`](crate::policy::composite::CompositeConfig::validate)
/// and [`PolicyBuilder::try_build`](crate::builder::PolicyBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- PolicyError ------------------------------------------------------

    #[test]
    fn unbound_display_mentions_initialize() {
        assert!(PolicyError::Unbound.to_string().contains("initialize"));
    }

    #[test]
    fn node_not_found_renders_debug_form() {
        let err = PolicyError::node_not_found(&"lib/main.dart");
        assert_eq!(err, PolicyError::NodeNotFound("\"lib/main.dart\"".into()));
        assert!(err.to_string().contains("lib/main.dart"));
    }

    #[test]
    fn policy_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PolicyError>();
    }

    // -- GraphError -------------------------------------------------------

    #[test]
    fn invalid_size_display_shows_node_and_size() {
        let err = GraphError::InvalidSize {
            node: "7".into(),
            size: -1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains("-1.5"));
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("weighted_divisor must be > 0");
        assert_eq!(err.to_string(), "weighted_divisor must be > 0");
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
