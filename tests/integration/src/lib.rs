//! Integration tests for the S3 object facade.
//!
//! These tests require a running S3-compatible server at `localhost:4566`
//! (or `S3_ENDPOINT_URL`). They are marked `#[ignore]` so they don't run
//! during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p s3facade-integration -- --ignored
//! ```

use std::sync::{Arc, Once};
use std::time::Duration;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use s3facade_aws::AwsBackend;
use s3facade_core::{BucketRef, ObjectBackend, ObjectFacade, ObjectRef, WaitConfig, create_bucket};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create a configured S3 client pointing at the local server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create a facade backend over [`s3_client`].
#[must_use]
pub fn backend() -> Arc<AwsBackend> {
    Arc::new(AwsBackend::from_client(s3_client()))
}

/// Existence-poll settings short enough for a local server.
#[must_use]
pub fn fast_wait() -> WaitConfig {
    WaitConfig::new(Duration::from_millis(200), 10)
}

/// A facade over `bucket`/`key` with [`fast_wait`] applied.
#[must_use]
pub fn facade(backend: &Arc<AwsBackend>, bucket: &str, key: &str) -> ObjectFacade {
    ObjectFacade::new(Arc::clone(backend) as Arc<dyn ObjectBackend>, ObjectRef::new(bucket, key)).with_wait(fast_wait())
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket through the facade and return its name. Caller is
/// responsible for cleanup.
pub async fn create_test_bucket(backend: &AwsBackend, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    create_bucket(backend, &BucketRef::new(name.as_str()), None)
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let mut continuation_token = None;
    loop {
        let Ok(resp) = client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token.take())
            .send()
            .await
        else {
            return; // Bucket may not exist.
        };

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                let _ = client.delete_object().bucket(bucket).key(key).send().await;
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
        } else {
            break;
        }
    }

    if let Err(e) = client.delete_bucket().bucket(bucket).send().await {
        tracing::debug!(bucket, error = %e, "failed to delete test bucket");
    }
}

mod test_acl;
mod test_facade;
