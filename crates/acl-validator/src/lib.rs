//! # acl-validator
//!
//! Runtime check that a message only touched what it declared.
//!
//! After a message executes, the store layer's resource-access events are
//! turned into [`Comparator`]s and matched against the message's declared
//! [`AccessOperation`](acl_types::AccessOperation)s. Accesses no declaration
//! covers are returned, logged and counted.
//!
//! ## Features
//!
//! - Prefix-aware identifier matching with parent fallback
//! - Exemption of governance-only identifiers and the params store
//! - TOML configuration of extra prefixes and exemptions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comparator;
pub mod config;
pub mod error;
pub mod event;
pub mod validator;

pub use comparator::{Comparator, CONCURRENT_SAFE_IDENTIFIERS, PARAMS_STORE_KEY};
pub use config::ValidatorConfig;
pub use error::{ValidatorError, ValidatorResult};
pub use event::{
    StoreEvent, ATTRIBUTE_ACCESS_TYPE, ATTRIBUTE_KEY, ATTRIBUTE_STORE_KEY, RESOURCE_ACCESS_EVENT,
};
pub use validator::MsgValidator;
