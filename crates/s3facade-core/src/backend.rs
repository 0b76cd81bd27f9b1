//! The storage-client seam.
//!
//! [`ObjectBackend`] lists the remote calls the facade consumes. Each method
//! maps to exactly one request against the service; none of them retry or
//! log. Implementations translate their client's failures into
//! [`ServiceError`] without interpreting them.

use async_trait::async_trait;
use bytes::Bytes;

use crate::acl::{AccessPolicy, CannedAcl};
use crate::error::ServiceError;
use crate::types::{BucketRef, ObjectBody, ObjectRef, ObjectSummary};

/// Remote object-storage operations used by the facade.
#[async_trait]
pub trait ObjectBackend: Send + Sync + std::fmt::Debug {
    /// Region the client resolved, when it has one.
    fn region(&self) -> Option<String> {
        None
    }

    /// Create `bucket`, constrained to `region` when one is given.
    async fn create_bucket(
        &self,
        bucket: &BucketRef,
        region: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Write `body` to `object`, applying `acl` at creation.
    async fn put_object(
        &self,
        object: &ObjectRef,
        body: ObjectBody,
        acl: CannedAcl,
    ) -> Result<(), ServiceError>;

    /// Check whether `object` is visible. Returns `false` when the service
    /// reports it as not found.
    async fn head_object(&self, object: &ObjectRef) -> Result<bool, ServiceError>;

    /// Read the full body of `object`.
    async fn get_object(&self, object: &ObjectRef) -> Result<Bytes, ServiceError>;

    /// List every object in `bucket` whose key starts with `prefix`, or all
    /// objects when `prefix` is `None`.
    async fn list_objects(
        &self,
        bucket: &BucketRef,
        prefix: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ServiceError>;

    /// Server-side copy of `source` onto `destination`.
    async fn copy_object(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
    ) -> Result<(), ServiceError>;

    /// Read the access policy of `object`.
    async fn get_object_acl(&self, object: &ObjectRef) -> Result<AccessPolicy, ServiceError>;

    /// Replace the access policy of `object` with `policy`.
    async fn put_object_acl(
        &self,
        object: &ObjectRef,
        policy: &AccessPolicy,
    ) -> Result<(), ServiceError>;
}
