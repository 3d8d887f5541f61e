//! # acl-types
//!
//! Access-control primitives for the parallel transaction scheduler.
//!
//! Features:
//! - Static resource type hierarchy with ancestor/descendant queries
//! - Declared access operations and their validation
//! - Store-key prefix table used by runtime validation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod error;
pub mod prefix;
pub mod resource;

pub use access::{
    is_synchronous_access_ops, synchronous_access_ops, validate_access_op, validate_access_ops,
    AccessOperation, AccessOperationSet, AccessType, WILDCARD_IDENTIFIER,
};
pub use error::{TypesError, TypesResult};
pub use prefix::{StoreKeyPrefixTable, PARENT_NODE_KEY};
pub use resource::{ResourceTree, ResourceType};
