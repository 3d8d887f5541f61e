//! Error types for access-control primitives

use crate::access::AccessType;
use crate::resource::ResourceType;
use thiserror::Error;

/// Errors raised while building the resource tree or validating access declarations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Root of the hierarchy declares a parent other than itself
    #[error("root resource type declares parent {0}")]
    RootHasParent(ResourceType),

    /// Non-root type declares itself as parent
    #[error("resource type {0} is its own parent")]
    SelfParent(ResourceType),

    /// A type referenced by the hierarchy is not registered
    #[error("resource type {0} is referenced but not registered")]
    UnregisteredResourceType(ResourceType),

    /// A type is registered twice
    #[error("resource type {0} registered more than once")]
    DuplicateResourceType(ResourceType),

    /// Parent does not list a type that names it as parent
    #[error("resource type {child} declares parent {parent} but is not among its children")]
    ChildNotListed {
        /// Declared parent
        parent: ResourceType,
        /// Type missing from the parent's children
        child: ResourceType,
    },

    /// A listed child declares a different parent
    #[error("resource type {child} is a child of {parent} but declares parent {declared}")]
    ParentMismatch {
        /// Type listing the child
        parent: ResourceType,
        /// Listed child
        child: ResourceType,
        /// Parent the child actually declares
        declared: ResourceType,
    },

    /// Walking the parent chain never reaches the root
    #[error("parent chain of resource type {0} does not reach the root")]
    ResourceTreeCycle(ResourceType),

    /// Name does not match any resource type
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Name does not match any access type
    #[error("unknown access type: {0}")]
    UnknownAccessType(String),

    /// Identifier is empty
    #[error("empty identifier for {access_type} access on {resource_type}")]
    EmptyIdentifier {
        /// Access kind of the offending operation
        access_type: AccessType,
        /// Resource type of the offending operation
        resource_type: ResourceType,
    },

    /// Non-leaf resource paired with a specific identifier
    #[error("non-leaf resource type {resource_type} requires identifier \"*\", got {identifier:?}")]
    NonLeafWithIdentifier {
        /// Resource type with children
        resource_type: ResourceType,
        /// Non-wildcard identifier supplied
        identifier: String,
    },

    /// Declaration list is empty
    #[error("access operation list is empty")]
    EmptyAccessOps,

    /// Declaration list does not end with the commit operation
    #[error("access operation list must end with a commit operation")]
    MissingCommitOperation,

    /// Store-key prefix could not be decoded
    #[error("invalid store key prefix for {resource_type}: {reason}")]
    InvalidPrefix {
        /// Resource type whose prefix failed to decode
        resource_type: String,
        /// Decoder error
        reason: String,
    },
}

/// Result type for access-control primitives
pub type TypesResult<T> = Result<T, TypesError>;
