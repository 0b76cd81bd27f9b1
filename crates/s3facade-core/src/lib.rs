//! Logged, error-translating facade over S3-compatible object storage.
//!
//! This crate wraps a storage client behind the [`ObjectBackend`] trait and
//! exposes six operations on one remote object through [`ObjectFacade`]:
//! put, get, list, copy, grant-read-access and get-access-policy. The facade
//! adds logging, error translation, and a bounded existence poll after
//! writes. Retries, consistency, and the wire protocol stay with the
//! storage client.
//!
//! # Architecture
//!
//! ```text
//! caller (demo driver, tests)
//!        |
//!        v
//!   ObjectFacade (logging wrapper, existence poll)
//!        |
//!        v
//!   ObjectBackend (aws-sdk-s3 client | MemoryBackend)
//! ```

mod acl;
mod backend;
pub mod config;
mod error;
mod facade;
pub mod memory;
mod types;
mod wait;

pub use acl::{
    ALL_USERS_GROUP_URI, AccessPolicy, CannedAcl, Grant, Grantee, Owner, ParsePermissionError,
    Permission,
};
pub use backend::ObjectBackend;
pub use config::FacadeConfig;
pub use error::{FacadeError, FacadeResult, ServiceError, UNRESOLVABLE_GRANT_BY_EMAIL};
pub use facade::{ObjectFacade, Operation, create_bucket};
pub use memory::{BackendCall, MemoryBackend};
pub use types::{BucketRef, ObjectBody, ObjectRef, ObjectSummary, PutSource};
pub use wait::{WaitConfig, wait_until_exists};
