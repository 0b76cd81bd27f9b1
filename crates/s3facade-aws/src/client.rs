//! aws-sdk-s3 implementation of [`ObjectBackend`].

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use s3facade_core::{
    AccessPolicy, BucketRef, CannedAcl, FacadeConfig, ObjectBackend, ObjectBody, ObjectRef,
    ObjectSummary, ServiceError,
};

use crate::convert::{copy_source, from_sdk_policy, is_not_found, service_error, to_sdk_policy};

/// Credential provider name reported for static keys from [`FacadeConfig`].
const PROVIDER_NAME: &str = "s3facade";

/// [`ObjectBackend`] backed by an aws-sdk-s3 client.
///
/// The SDK owns retries, request signing, and the wire protocol; this type
/// only shapes requests and maps responses.
#[derive(Debug, Clone)]
pub struct AwsBackend {
    client: S3Client,
}

impl AwsBackend {
    /// Build a client from `config`, using the default credential chain
    /// unless static keys are configured.
    pub async fn from_config(config: &FacadeConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let loader = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                loader.credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    None,
                    None,
                    PROVIDER_NAME,
                ))
            }
            _ => loader,
        };

        let sdk_config = loader.load().await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(url) = &config.endpoint_url {
            builder = builder.endpoint_url(url);
        }

        debug!(
            region = ?sdk_config.region(),
            endpoint = ?config.endpoint_url,
            force_path_style = config.force_path_style,
            "created S3 client",
        );
        Self::from_client(S3Client::from_conf(builder.build()))
    }

    /// Wrap an already configured client.
    #[must_use]
    pub fn from_client(client: S3Client) -> Self {
        Self { client }
    }

    /// The underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &S3Client {
        &self.client
    }
}

#[async_trait]
impl ObjectBackend for AwsBackend {
    fn region(&self) -> Option<String> {
        self.client.config().region().map(ToString::to_string)
    }

    async fn create_bucket(
        &self,
        bucket: &BucketRef,
        region: Option<&str>,
    ) -> Result<(), ServiceError> {
        let configuration = region.map(|region| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });

        self.client
            .create_bucket()
            .bucket(bucket.as_str())
            .set_create_bucket_configuration(configuration)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }

    async fn put_object(
        &self,
        object: &ObjectRef,
        body: ObjectBody,
        acl: CannedAcl,
    ) -> Result<(), ServiceError> {
        let body = match body {
            ObjectBody::Bytes(data) => ByteStream::from(data),
            ObjectBody::File { file, len } => ByteStream::read_from()
                .file(file)
                .length(Length::Exact(len))
                .build()
                .await
                .map_err(|e| ServiceError::client(format!("cannot stream upload body: {e}")))?,
        };

        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .body(body)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }

    async fn head_object(&self, object: &ObjectRef) -> Result<bool, ServiceError> {
        match self
            .client
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(service_error(&err)),
        }
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<Bytes, ServiceError> {
        let output = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| service_error(&e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| ServiceError::client(format!("cannot read object body: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn list_objects(
        &self,
        bucket: &BucketRef,
        prefix: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ServiceError> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket.as_str())
                .set_prefix(prefix.map(ToOwned::to_owned))
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| service_error(&e))?;

            objects.extend(resp.contents().iter().filter_map(|obj| {
                obj.key().map(|key| ObjectSummary {
                    key: key.to_owned(),
                    size: obj
                        .size()
                        .and_then(|s| u64::try_from(s).ok())
                        .unwrap_or_default(),
                    last_modified: obj.last_modified().and_then(|t| {
                        DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())
                    }),
                    etag: obj.e_tag().map(ToOwned::to_owned),
                })
            }));

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn copy_object(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
    ) -> Result<(), ServiceError> {
        self.client
            .copy_object()
            .copy_source(copy_source(source))
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }

    async fn get_object_acl(&self, object: &ObjectRef) -> Result<AccessPolicy, ServiceError> {
        let output = self
            .client
            .get_object_acl()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| service_error(&e))?;

        from_sdk_policy(output.owner(), output.grants())
    }

    async fn put_object_acl(
        &self,
        object: &ObjectRef,
        policy: &AccessPolicy,
    ) -> Result<(), ServiceError> {
        self.client
            .put_object_acl()
            .bucket(&object.bucket)
            .key(&object.key)
            .access_control_policy(to_sdk_policy(policy)?)
            .send()
            .await
            .map_err(|e| service_error(&e))?;
        Ok(())
    }
}
