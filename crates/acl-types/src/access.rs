//! Access operation model
//!
//! A message declares, ahead of execution, the list of storage accesses it
//! may perform. Each entry is an [`AccessOperation`]; the list always ends
//! with the commit operation that marks the transaction as finished.

use crate::error::{TypesError, TypesResult};
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifier template matching every key of a resource type
pub const WILDCARD_IDENTIFIER: &str = "*";

/// Kind of storage access
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AccessType {
    /// May read or write
    Unknown = 0,
    /// Read only
    Read = 1,
    /// Write
    Write = 2,
    /// End-of-transaction marker
    Commit = 3,
}

impl AccessType {
    /// Canonical upper-case name
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessType::Unknown => "UNKNOWN",
            AccessType::Read => "READ",
            AccessType::Write => "WRITE",
            AccessType::Commit => "COMMIT",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(AccessType::Unknown),
            "READ" => Ok(AccessType::Read),
            "WRITE" => Ok(AccessType::Write),
            "COMMIT" => Ok(AccessType::Commit),
            other => Err(TypesError::UnknownAccessType(other.to_string())),
        }
    }
}

/// A single declared access
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessOperation {
    /// Access kind
    pub access_type: AccessType,
    /// Category of storage
    pub resource_type: ResourceType,
    /// Key template, or `"*"` for every key of the type
    pub identifier_template: String,
}

impl AccessOperation {
    /// Create a new access operation
    pub fn new(
        access_type: AccessType,
        resource_type: ResourceType,
        identifier_template: impl Into<String>,
    ) -> Self {
        Self {
            access_type,
            resource_type,
            identifier_template: identifier_template.into(),
        }
    }

    /// Read access
    pub fn read(resource_type: ResourceType, identifier_template: impl Into<String>) -> Self {
        Self::new(AccessType::Read, resource_type, identifier_template)
    }

    /// Write access
    pub fn write(resource_type: ResourceType, identifier_template: impl Into<String>) -> Self {
        Self::new(AccessType::Write, resource_type, identifier_template)
    }

    /// Unknown access (treated as both read and write)
    pub fn unknown(resource_type: ResourceType, identifier_template: impl Into<String>) -> Self {
        Self::new(AccessType::Unknown, resource_type, identifier_template)
    }

    /// The terminal commit operation `{COMMIT, ANY, "*"}`
    pub fn commit() -> Self {
        Self::new(AccessType::Commit, ResourceType::Any, WILDCARD_IDENTIFIER)
    }

    /// Check if this is the terminal commit operation
    pub fn is_commit(&self) -> bool {
        self.access_type == AccessType::Commit
            && self.resource_type == ResourceType::Any
            && self.identifier_template == WILDCARD_IDENTIFIER
    }

    /// Check if the identifier covers every key of the resource type
    pub fn is_wildcard(&self) -> bool {
        self.identifier_template == WILDCARD_IDENTIFIER
    }
}

impl fmt::Display for AccessOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.access_type, self.resource_type, self.identifier_template
        )
    }
}

/// Fully synchronous declaration: conflicts with everything
pub fn synchronous_access_ops() -> Vec<AccessOperation> {
    vec![
        AccessOperation::unknown(ResourceType::Any, WILDCARD_IDENTIFIER),
        AccessOperation::commit(),
    ]
}

/// Check if `ops` is exactly the fully synchronous declaration
pub fn is_synchronous_access_ops(ops: &[AccessOperation]) -> bool {
    ops == synchronous_access_ops().as_slice()
}

/// Validate a single access operation
pub fn validate_access_op(op: &AccessOperation) -> TypesResult<()> {
    if op.identifier_template.is_empty() {
        return Err(TypesError::EmptyIdentifier {
            access_type: op.access_type,
            resource_type: op.resource_type,
        });
    }
    if op.resource_type.has_children() && !op.is_wildcard() {
        return Err(TypesError::NonLeafWithIdentifier {
            resource_type: op.resource_type,
            identifier: op.identifier_template.clone(),
        });
    }
    Ok(())
}

/// Validate a declaration list: non-empty, every op valid, commit last
pub fn validate_access_ops(ops: &[AccessOperation]) -> TypesResult<()> {
    let last = ops.last().ok_or(TypesError::EmptyAccessOps)?;
    if !last.is_commit() {
        return Err(TypesError::MissingCommitOperation);
    }
    ops.iter().try_for_each(validate_access_op)
}

/// Deduplicated collection of access operations
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessOperationSet {
    ops: BTreeSet<AccessOperation>,
}

impl AccessOperationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an operation
    pub fn add(&mut self, op: AccessOperation) {
        self.ops.insert(op);
    }

    /// Insert every operation of `ops`
    pub fn add_multiple(&mut self, ops: impl IntoIterator<Item = AccessOperation>) {
        self.ops.extend(ops);
    }

    /// Insert every operation of `other`
    pub fn merge(&mut self, other: &AccessOperationSet) {
        self.ops.extend(other.ops.iter().cloned());
    }

    /// Check membership
    pub fn contains(&self, op: &AccessOperation) -> bool {
        self.ops.contains(op)
    }

    /// Number of distinct operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &AccessOperation> {
        self.ops.iter()
    }

    /// Sorted operations with the commit operation moved last
    pub fn to_vec(&self) -> Vec<AccessOperation> {
        let (mut ops, commits): (Vec<_>, Vec<_>) =
            self.ops.iter().cloned().partition(|op| !op.is_commit());
        ops.extend(commits);
        ops
    }
}

impl FromIterator<AccessOperation> for AccessOperationSet {
    fn from_iter<I: IntoIterator<Item = AccessOperation>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
