//! In-process [`ObjectBackend`] for tests and dry runs.
//!
//! [`MemoryBackend`] keeps buckets and objects in memory and mimics the
//! service behaviour the facade depends on: canned ACL expansion on put,
//! full-replacement ACL writes, email-grantee resolution, prefix listing in
//! key order, and S3 error codes. It also counts calls per operation, lets
//! tests inject a failure into the next call of a given operation, and can
//! delay the visibility of new objects to exercise the existence poll.
//!
//! # Thread Safety
//!
//! Buckets live in a `DashMap`; each bucket guards its objects with a
//! `parking_lot::RwLock`. No lock is held across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use md5::{Digest, Md5};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::acl::{AccessPolicy, CannedAcl, Grantee, Owner};
use crate::backend::ObjectBackend;
use crate::error::{ServiceError, UNRESOLVABLE_GRANT_BY_EMAIL};
use crate::types::{BucketRef, ObjectBody, ObjectRef, ObjectSummary};

/// Canonical ID of the default owner of everything a [`MemoryBackend`] stores.
pub const DEFAULT_OWNER_ID: &str =
    "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a";

/// Display name of the default owner.
pub const DEFAULT_OWNER_NAME: &str = "webfile";

/// The backend operations a [`MemoryBackend`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    /// `create_bucket`
    CreateBucket,
    /// `put_object`
    PutObject,
    /// `head_object`
    HeadObject,
    /// `get_object`
    GetObject,
    /// `list_objects`
    ListObjects,
    /// `copy_object`
    CopyObject,
    /// `get_object_acl`
    GetObjectAcl,
    /// `put_object_acl`
    PutObjectAcl,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
    policy: AccessPolicy,
    /// Existence checks that still report the object as missing.
    hidden_checks: u32,
}

impl StoredObject {
    fn summary(&self, key: &str) -> ObjectSummary {
        ObjectSummary {
            key: key.to_owned(),
            size: self.data.len() as u64,
            last_modified: Some(self.last_modified),
            etag: Some(self.etag.clone()),
        }
    }
}

#[derive(Debug)]
struct MemoryBucket {
    region: Option<String>,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

/// In-memory object store implementing [`ObjectBackend`].
pub struct MemoryBackend {
    owner: Owner,
    buckets: DashMap<String, MemoryBucket>,
    identities: DashSet<String>,
    calls: DashMap<BackendCall, usize>,
    faults: Mutex<HashMap<BackendCall, ServiceError>>,
    visibility_lag: AtomicU32,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("owner", &self.owner)
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend owned by the default owner.
    #[must_use]
    pub fn new() -> Self {
        Self::with_owner(Owner::new(DEFAULT_OWNER_ID, DEFAULT_OWNER_NAME))
    }

    /// Create an empty backend whose buckets and objects belong to `owner`.
    #[must_use]
    pub fn with_owner(owner: Owner) -> Self {
        Self {
            owner,
            buckets: DashMap::new(),
            identities: DashSet::new(),
            calls: DashMap::new(),
            faults: Mutex::new(HashMap::new()),
            visibility_lag: AtomicU32::new(0),
        }
    }

    /// The owner applied to stored objects.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Register an email address as belonging to an existing account, so
    /// that email grants to it resolve.
    pub fn register_identity(&self, email: impl Into<String>) {
        self.identities.insert(email.into());
    }

    /// Make the next call of `call` fail with `error`.
    pub fn fail_next(&self, call: BackendCall, error: ServiceError) {
        self.faults.lock().insert(call, error);
    }

    /// Hide every object written from now on for its first `checks`
    /// existence checks.
    pub fn set_visibility_lag(&self, checks: u32) {
        self.visibility_lag.store(checks, Ordering::Relaxed);
    }

    /// Number of calls made to `call`, including failed ones.
    #[must_use]
    pub fn call_count(&self, call: BackendCall) -> usize {
        self.calls.get(&call).map_or(0, |n| *n)
    }

    /// Number of calls made to any operation.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Region constraint the bucket was created with, if the bucket exists.
    #[must_use]
    pub fn bucket_region(&self, bucket: &str) -> Option<Option<String>> {
        self.buckets.get(bucket).map(|b| b.region.clone())
    }

    /// Count the call and surface an injected failure, if any.
    fn record(&self, call: BackendCall) -> Result<(), ServiceError> {
        *self.calls.entry(call).or_insert(0) += 1;
        match self.faults.lock().remove(&call) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn store(
        &self,
        object: &ObjectRef,
        data: Bytes,
        policy: AccessPolicy,
    ) -> Result<(), ServiceError> {
        let bucket = self
            .buckets
            .get(&object.bucket)
            .ok_or_else(|| no_such_bucket(&object.bucket))?;

        let stored = StoredObject {
            etag: compute_etag(&data),
            data,
            last_modified: Utc::now(),
            policy,
            hidden_checks: self.visibility_lag.load(Ordering::Relaxed),
        };
        bucket.objects.write().insert(object.key.clone(), stored);
        Ok(())
    }

    fn with_object<T>(
        &self,
        object: &ObjectRef,
        f: impl FnOnce(&mut StoredObject) -> T,
    ) -> Result<T, ServiceError> {
        let bucket = self
            .buckets
            .get(&object.bucket)
            .ok_or_else(|| no_such_bucket(&object.bucket))?;
        let mut objects = bucket.objects.write();
        let stored = objects
            .get_mut(&object.key)
            .ok_or_else(|| no_such_key(&object.key))?;
        Ok(f(stored))
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn create_bucket(
        &self,
        bucket: &BucketRef,
        region: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.record(BackendCall::CreateBucket)?;

        match self.buckets.entry(bucket.as_str().to_owned()) {
            Entry::Occupied(_) => {
                return Err(ServiceError::new(
                    "BucketAlreadyOwnedByYou",
                    format!(
                        "Your previous request to create the named bucket succeeded and you already own it: {bucket}"
                    ),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(MemoryBucket {
                    region: region.map(ToOwned::to_owned),
                    objects: RwLock::new(BTreeMap::new()),
                });
            }
        }
        debug!(bucket = %bucket, ?region, "bucket created");
        Ok(())
    }

    async fn put_object(
        &self,
        object: &ObjectRef,
        body: ObjectBody,
        acl: CannedAcl,
    ) -> Result<(), ServiceError> {
        self.record(BackendCall::PutObject)?;

        let data = body
            .into_bytes()
            .await
            .map_err(|e| ServiceError::client(format!("failed to read request body: {e}")))?;
        self.store(object, data, acl.to_policy(&self.owner))
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<bool, ServiceError> {
        self.record(BackendCall::HeadObject)?;

        let Some(bucket) = self.buckets.get(&object.bucket) else {
            return Err(no_such_bucket(&object.bucket));
        };
        let mut objects = bucket.objects.write();
        let Some(stored) = objects.get_mut(&object.key) else {
            return Ok(false);
        };
        if stored.hidden_checks > 0 {
            stored.hidden_checks -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<Bytes, ServiceError> {
        self.record(BackendCall::GetObject)?;
        self.with_object(object, |stored| stored.data.clone())
    }

    async fn list_objects(
        &self,
        bucket: &BucketRef,
        prefix: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ServiceError> {
        self.record(BackendCall::ListObjects)?;

        let entry = self
            .buckets
            .get(bucket.as_str())
            .ok_or_else(|| no_such_bucket(bucket.as_str()))?;
        let prefix = prefix.unwrap_or_default();
        let objects = entry.objects.read();

        Ok(objects
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| stored.summary(key))
            .collect())
    }

    async fn copy_object(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
    ) -> Result<(), ServiceError> {
        self.record(BackendCall::CopyObject)?;

        let data = self.with_object(source, |stored| stored.data.clone())?;
        self.store(destination, data, CannedAcl::Private.to_policy(&self.owner))
    }

    async fn get_object_acl(&self, object: &ObjectRef) -> Result<AccessPolicy, ServiceError> {
        self.record(BackendCall::GetObjectAcl)?;
        self.with_object(object, |stored| stored.policy.clone())
    }

    async fn put_object_acl(
        &self,
        object: &ObjectRef,
        policy: &AccessPolicy,
    ) -> Result<(), ServiceError> {
        self.record(BackendCall::PutObjectAcl)?;

        for grant in &policy.grants {
            if let Grantee::Email { address } = &grant.grantee {
                if !self.identities.contains(address) {
                    return Err(ServiceError::new(
                        UNRESOLVABLE_GRANT_BY_EMAIL,
                        "The e-mail address you provided does not match any account on record.",
                    ));
                }
            }
        }

        self.with_object(object, |stored| stored.policy = policy.clone())
    }
}

fn no_such_bucket(bucket: &str) -> ServiceError {
    ServiceError::new(
        "NoSuchBucket",
        format!("The specified bucket does not exist: {bucket}"),
    )
}

fn no_such_key(key: &str) -> ServiceError {
    ServiceError::new("NoSuchKey", format!("The specified key does not exist: {key}"))
}

/// Quoted hex MD5 of `data`, as S3 reports it in the `ETag` of a single-part object.
fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}
