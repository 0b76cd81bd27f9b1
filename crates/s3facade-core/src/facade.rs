//! The object facade.
//!
//! [`ObjectFacade`] wraps one remote object and exposes put, get, list, copy,
//! grant-read-access and get-access-policy over an [`ObjectBackend`]. Every
//! operation runs through one logging wrapper, which reports the outcome with
//! the operation name and resource identity and hands the result back
//! untouched.
//! The facade never retries and never swallows an error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::acl::{AccessPolicy, CannedAcl, Grant};
use crate::backend::ObjectBackend;
use crate::error::{FacadeError, FacadeResult};
use crate::types::{BucketRef, ObjectBody, ObjectRef, ObjectSummary, PutSource};
use crate::wait::{WaitConfig, wait_until_exists};

/// A facade operation, as reported in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Bucket creation.
    CreateBucket,
    /// Object upload.
    Put,
    /// Object download.
    Get,
    /// Bucket listing.
    List,
    /// Server-side copy.
    Copy,
    /// Read grant for an email identity.
    GrantReadAccess,
    /// Access policy read.
    GetAccessPolicy,
}

impl Operation {
    /// Return the name used in log events.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateBucket => "create_bucket",
            Self::Put => "put",
            Self::Get => "get",
            Self::List => "list",
            Self::Copy => "copy",
            Self::GrantReadAccess => "grant_read_access",
            Self::GetAccessPolicy => "get_access_policy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource identity attached to the log events of one operation.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    bucket: &'a str,
    key: Option<&'a str>,
    destination: Option<&'a ObjectRef>,
}

impl<'a> Target<'a> {
    fn bucket(bucket: &'a BucketRef) -> Self {
        Self {
            bucket: bucket.as_str(),
            key: None,
            destination: None,
        }
    }

    fn object(object: &'a ObjectRef) -> Self {
        Self {
            bucket: &object.bucket,
            key: Some(&object.key),
            destination: None,
        }
    }

    fn copy(source: &'a ObjectRef, destination: &'a ObjectRef) -> Self {
        Self {
            destination: Some(destination),
            ..Self::object(source)
        }
    }
}

/// Run `fut`, log its outcome for `operation` on `target`, and return the
/// result unchanged.
async fn logged<T, F>(operation: Operation, target: Target<'_>, fut: F) -> FacadeResult<T>
where
    F: Future<Output = FacadeResult<T>>,
{
    let result = fut.await;

    let dest_bucket = target.destination.map(|d| d.bucket.as_str());
    let dest_key = target.destination.map(|d| d.key.as_str());
    match &result {
        Ok(_) => info!(
            operation = %operation,
            bucket = target.bucket,
            key = target.key,
            dest_bucket,
            dest_key,
            "{operation} succeeded",
        ),
        Err(err) => error!(
            operation = %operation,
            bucket = target.bucket,
            key = target.key,
            dest_bucket,
            dest_key,
            error = %err,
            "{operation} failed",
        ),
    }

    result
}

/// Turn an upload source into a backend body, opening the file if there is one.
async fn open_body(source: PutSource) -> FacadeResult<ObjectBody> {
    match source {
        PutSource::Bytes(data) => Ok(ObjectBody::Bytes(data)),
        PutSource::File(path) => {
            let local_error = |source| FacadeError::LocalResource {
                path: path.clone(),
                source,
            };
            let file = tokio::fs::File::open(&path).await.map_err(local_error)?;
            let metadata = file.metadata().await.map_err(local_error)?;
            // Opening a directory succeeds on Unix; reading it does not.
            if !metadata.is_file() {
                return Err(local_error(std::io::Error::from(
                    std::io::ErrorKind::IsADirectory,
                )));
            }
            Ok(ObjectBody::File {
                file,
                len: metadata.len(),
            })
        }
    }
}

/// Create `bucket`, constrained to `region` when one is given.
pub async fn create_bucket(
    backend: &dyn ObjectBackend,
    bucket: &BucketRef,
    region: Option<&str>,
) -> FacadeResult<()> {
    logged(Operation::CreateBucket, Target::bucket(bucket), async {
        backend.create_bucket(bucket, region).await?;
        Ok(())
    })
    .await
}

/// Logged, error-propagating operations on one remote object.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use s3facade_core::{BucketRef, MemoryBackend, ObjectFacade, ObjectRef, create_bucket};
///
/// # tokio_test_block(async {
/// let backend = Arc::new(MemoryBackend::new());
/// create_bucket(backend.as_ref(), &BucketRef::new("docs"), None).await?;
///
/// let facade = ObjectFacade::new(backend, ObjectRef::new("docs", "hello.txt"));
/// facade.put(b"hello".as_slice()).await?;
/// assert_eq!(facade.get().await?.as_ref(), b"hello");
/// # Ok::<(), s3facade_core::FacadeError>(())
/// # }).unwrap();
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ObjectFacade {
    backend: Arc<dyn ObjectBackend>,
    object: ObjectRef,
    wait: WaitConfig,
}

impl ObjectFacade {
    /// Wrap `object`, issuing remote calls through `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn ObjectBackend>, object: ObjectRef) -> Self {
        Self {
            backend,
            object,
            wait: WaitConfig::default(),
        }
    }

    /// Use `wait` for the existence polls that follow `put` and `copy`.
    #[must_use]
    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// The wrapped object.
    #[must_use]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Key of the wrapped object.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.object.key
    }

    /// Upload `source` as the object content, readable by everyone
    /// (`public-read`), and wait until the object is visible.
    ///
    /// A file source is opened before any remote call; if that fails the
    /// error is [`FacadeError::LocalResource`] and nothing is sent.
    pub async fn put(&self, source: impl Into<PutSource>) -> FacadeResult<()> {
        let source = source.into();
        logged(Operation::Put, Target::object(&self.object), async {
            let body = open_body(source).await?;
            debug!(key = %self.object.key, size = body.len(), "uploading object");

            self.backend
                .put_object(&self.object, body, CannedAcl::PublicRead)
                .await?;
            wait_until_exists(self.backend.as_ref(), &self.object, &self.wait).await
        })
        .await
    }

    /// Download the whole object into memory.
    pub async fn get(&self) -> FacadeResult<bytes::Bytes> {
        logged(Operation::Get, Target::object(&self.object), async {
            Ok(self.backend.get_object(&self.object).await?)
        })
        .await
    }

    /// List the objects of `bucket` whose key starts with `prefix`, or all of
    /// them when `prefix` is `None` or empty.
    pub async fn list(
        backend: &dyn ObjectBackend,
        bucket: &BucketRef,
        prefix: Option<&str>,
    ) -> FacadeResult<Vec<ObjectSummary>> {
        let prefix = prefix.filter(|p| !p.is_empty());
        logged(Operation::List, Target::bucket(bucket), async {
            let objects = backend.list_objects(bucket, prefix).await?;
            info!(
                bucket = %bucket,
                ?prefix,
                keys = ?objects.iter().map(|o| o.key.as_str()).collect::<Vec<_>>(),
                "listed objects",
            );
            Ok(objects)
        })
        .await
    }

    /// Copy this object to `destination` on the service side and wait until
    /// the copy is visible.
    ///
    /// A failure leaves the destination in whatever state the service left it.
    pub async fn copy(&self, destination: &ObjectRef) -> FacadeResult<()> {
        logged(
            Operation::Copy,
            Target::copy(&self.object, destination),
            async {
                self.backend.copy_object(&self.object, destination).await?;
                wait_until_exists(self.backend.as_ref(), destination, &self.wait).await
            },
        )
        .await
    }

    /// Grant `READ` on this object to the account registered under `email`.
    ///
    /// The current policy is read, the grant appended, and the whole policy
    /// written back, because a policy write replaces every existing grant.
    ///
    /// This read-modify-write is not atomic. Two callers granting access to
    /// the same object concurrently can both read the same policy, and the
    /// later write then drops the earlier caller's grant without any error.
    /// Callers that need every grant to survive must serialize their calls.
    pub async fn grant_read_access(&self, email: &str) -> FacadeResult<()> {
        logged(Operation::GrantReadAccess, Target::object(&self.object), async {
            let policy = self.backend.get_object_acl(&self.object).await?;
            let updated = policy.with_grant(Grant::read_by_email(email));
            self.backend.put_object_acl(&self.object, &updated).await?;

            debug!(key = %self.object.key, grantee = email, "granted read access");
            Ok(())
        })
        .await
    }

    /// Read the owner and grants of this object.
    pub async fn access_policy(&self) -> FacadeResult<AccessPolicy> {
        logged(Operation::GetAccessPolicy, Target::object(&self.object), async {
            let policy = self.backend.get_object_acl(&self.object).await?;
            debug!(
                key = %self.object.key,
                owner = policy.owner.name(),
                grants = policy.grants.len(),
                "read access policy",
            );
            Ok(policy)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::acl::{Grantee, Permission};
    use crate::error::{ServiceError, UNRESOLVABLE_GRANT_BY_EMAIL};
    use crate::memory::{BackendCall, MemoryBackend};

    const BUCKET: &str = "evaluationroom.com";
    const EMAIL: &str = "grantee@example.com";

    async fn setup(key: &str) -> (Arc<MemoryBackend>, ObjectFacade) {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .create_bucket(&BucketRef::new(BUCKET), None)
            .await
            .expect("create bucket");
        let facade = ObjectFacade::new(backend.clone(), ObjectRef::new(BUCKET, key))
            .with_wait(WaitConfig::new(Duration::ZERO, 3));
        (backend, facade)
    }

    #[tokio::test]
    async fn test_should_get_what_was_put() {
        let (_, facade) = setup("js/index.js").await;
        let payload = Bytes::from_static(b"console.log('hello');\n\x00\xff");

        facade.put(payload.clone()).await.expect("put");
        assert_eq!(facade.get().await.expect("get"), payload);
    }

    #[tokio::test]
    async fn test_should_upload_file_content() {
        let (backend, facade) = setup("js/index_exam.js").await;
        let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
        std::io::Write::write_all(&mut tmp, b"exam bundle").expect("write");

        facade.put(tmp.path()).await.expect("put file");

        assert_eq!(facade.get().await.expect("get").as_ref(), b"exam bundle");
        assert_eq!(backend.call_count(BackendCall::PutObject), 1);
        assert_eq!(backend.call_count(BackendCall::HeadObject), 1);
    }

    #[tokio::test]
    async fn test_should_fail_locally_without_remote_call_for_missing_file() {
        let (backend, facade) = setup("js/missing.js").await;
        let calls_before = backend.total_calls();
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist.js");

        let err = facade.put(missing.as_path()).await.expect_err("missing file");

        match err {
            FacadeError::LocalResource { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected LocalResource, got {other:?}"),
        }
        assert_eq!(backend.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_should_fail_locally_for_directory_path() {
        let (backend, facade) = setup("js/").await;
        let calls_before = backend.total_calls();
        let dir = tempfile::tempdir().expect("tempdir");

        let err = facade.put(dir.path()).await.expect_err("directory");

        match err {
            FacadeError::LocalResource { path, source } => {
                assert_eq!(path, dir.path());
                assert_eq!(source.kind(), std::io::ErrorKind::IsADirectory);
            }
            other => panic!("expected LocalResource, got {other:?}"),
        }
        assert_eq!(backend.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_should_apply_public_read_on_put() {
        let (backend, facade) = setup("js/index_public.js").await;
        facade.put(b"x".as_slice()).await.expect("put");

        let policy = facade.access_policy().await.expect("policy");
        assert_eq!(policy, CannedAcl::PublicRead.to_policy(backend.owner()));
    }

    #[tokio::test]
    async fn test_should_fail_put_when_object_never_becomes_visible() {
        let (backend, facade) = setup("js/slow.js").await;
        backend.set_visibility_lag(10);

        let err = facade.put(b"x".as_slice()).await.expect_err("not visible");
        assert!(matches!(err, FacadeError::NotVisible { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_should_propagate_service_error_code_unchanged() {
        let (backend, facade) = setup("js/index.js").await;

        let err = facade.get().await.expect_err("no such key");
        assert_eq!(err.service_code(), Some("NoSuchKey"));

        backend.fail_next(
            BackendCall::PutObject,
            ServiceError::new("AccessDenied", "Access Denied"),
        );
        let err = facade.put(b"x".as_slice()).await.expect_err("denied");
        assert_eq!(
            err.as_service_error(),
            Some(&ServiceError::new("AccessDenied", "Access Denied"))
        );
        assert_eq!(backend.call_count(BackendCall::PutObject), 1);
        assert_eq!(backend.call_count(BackendCall::HeadObject), 0);
    }

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_should_log_listed_keys_at_info() {
        let (backend, facade) = setup("js/index.js").await;
        facade.put(b"x".as_slice()).await.expect("put");

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        ObjectFacade::list(backend.as_ref(), &BucketRef::new(BUCKET), Some("js/"))
            .await
            .expect("list");

        let output = String::from_utf8(logs.0.lock().clone()).expect("utf8 logs");
        let line = output
            .lines()
            .find(|l| l.contains("listed objects"))
            .expect("listed objects event");
        assert!(line.contains("INFO"), "{line}");
        assert!(line.contains("js/index.js"), "{line}");
    }

    #[tokio::test]
    async fn test_should_list_only_keys_with_prefix() {
        let (backend, _) = setup("unused").await;
        for key in ["js/a.js", "img/b.png", "js/c.js"] {
            ObjectFacade::new(backend.clone(), ObjectRef::new(BUCKET, key))
                .with_wait(WaitConfig::new(Duration::ZERO, 1))
                .put(b"x".as_slice())
                .await
                .expect("put");
        }
        let bucket = BucketRef::new(BUCKET);

        let mut keys: Vec<String> = ObjectFacade::list(backend.as_ref(), &bucket, Some("js/"))
            .await
            .expect("list")
            .into_iter()
            .map(|o| o.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["js/a.js", "js/c.js"]);

        let all = ObjectFacade::list(backend.as_ref(), &bucket, None)
            .await
            .expect("list");
        assert_eq!(all.len(), 3);

        let empty_prefix = ObjectFacade::list(backend.as_ref(), &bucket, Some(""))
            .await
            .expect("list");
        assert_eq!(empty_prefix.len(), 3);
    }

    #[tokio::test]
    async fn test_should_copy_to_another_bucket() {
        let (backend, facade) = setup("js/index.js").await;
        backend
            .create_bucket(&BucketRef::new("backup"), None)
            .await
            .expect("create bucket");
        facade.put(b"bundle v1".as_slice()).await.expect("put");

        let dest = ObjectRef::new("backup", "js/index.js");
        facade.copy(&dest).await.expect("copy");

        let copied = ObjectFacade::new(backend.clone(), dest);
        assert_eq!(
            copied.get().await.expect("get copy"),
            facade.get().await.expect("get source")
        );
    }

    #[tokio::test]
    async fn test_should_not_poll_when_copy_fails() {
        let (backend, facade) = setup("js/index.js").await;
        facade.put(b"x".as_slice()).await.expect("put");
        let heads = backend.call_count(BackendCall::HeadObject);

        let err = facade
            .copy(&ObjectRef::new("no-such-bucket", "js/index.js"))
            .await
            .expect_err("missing destination bucket");
        assert_eq!(err.service_code(), Some("NoSuchBucket"));
        assert_eq!(backend.call_count(BackendCall::HeadObject), heads);
    }

    #[tokio::test]
    async fn test_should_append_exactly_one_email_read_grant() {
        let (backend, facade) = setup("js/index.js").await;
        backend.register_identity(EMAIL);
        facade.put(b"x".as_slice()).await.expect("put");
        let before = facade.access_policy().await.expect("policy");

        facade.grant_read_access(EMAIL).await.expect("grant");

        let after = facade.access_policy().await.expect("policy");
        assert_eq!(after.owner, before.owner);
        assert_eq!(after.grants.len(), before.grants.len() + 1);
        assert_eq!(after.grants[..before.grants.len()], before.grants[..]);
        assert_eq!(
            after.grants.last(),
            Some(&Grant::new(
                Grantee::Email {
                    address: EMAIL.to_owned()
                },
                Permission::Read
            ))
        );
    }

    #[tokio::test]
    async fn test_should_keep_sequential_grants() {
        let (backend, facade) = setup("js/index.js").await;
        backend.register_identity("a@example.com");
        backend.register_identity("b@example.com");
        facade.put(b"x".as_slice()).await.expect("put");

        facade.grant_read_access("a@example.com").await.expect("grant a");
        facade.grant_read_access("b@example.com").await.expect("grant b");

        let policy = facade.access_policy().await.expect("policy");
        let emails: Vec<&str> = policy
            .grants
            .iter()
            .filter_map(|g| match &g.grantee {
                Grantee::Email { address } => Some(address.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn test_should_surface_unresolvable_grantee_without_retry() {
        let (backend, facade) = setup("js/index.js").await;
        facade.put(b"x".as_slice()).await.expect("put");
        let before = facade.access_policy().await.expect("policy");

        let err = facade
            .grant_read_access("nobody@example.com")
            .await
            .expect_err("unresolvable");

        assert_eq!(err.service_code(), Some(UNRESOLVABLE_GRANT_BY_EMAIL));
        assert_eq!(backend.call_count(BackendCall::PutObjectAcl), 1);
        assert_eq!(facade.access_policy().await.expect("policy"), before);
    }

    #[test]
    fn test_should_name_operations_for_logs() {
        assert_eq!(Operation::Put.to_string(), "put");
        assert_eq!(Operation::GrantReadAccess.to_string(), "grant_read_access");
        assert_eq!(Operation::GetAccessPolicy.as_str(), "get_access_policy");
    }
}
