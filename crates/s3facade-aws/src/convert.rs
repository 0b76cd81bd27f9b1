//! Conversions between facade types and aws-sdk-s3 types.
//!
//! Errors cross this boundary as [`ServiceError`]: service failures keep
//! their S3 error code, client-side failures (dispatch, timeouts, response
//! decoding) carry only a message.

use std::fmt;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::types as sdk;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use s3facade_core::{AccessPolicy, Grant, Grantee, ObjectRef, Owner, Permission, ServiceError};

/// Characters left unescaped in an `x-amz-copy-source` key.
const COPY_SOURCE_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Map an SDK failure to a [`ServiceError`].
pub(crate) fn service_error<E, R>(err: &SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    match err.code() {
        Some(code) => ServiceError::new(code, err.message().unwrap_or(code)),
        None => ServiceError::client(DisplayErrorContext(err).to_string()),
    }
}

/// Whether a `HeadObject` failure means the object is not there (yet).
pub(crate) fn is_not_found<R>(err: &SdkError<HeadObjectError, R>) -> bool {
    err.as_service_error()
        .is_some_and(HeadObjectError::is_not_found)
}

/// The `x-amz-copy-source` value for `source`.
pub(crate) fn copy_source(source: &ObjectRef) -> String {
    format!(
        "{}/{}",
        source.bucket,
        utf8_percent_encode(&source.key, COPY_SOURCE_KEY)
    )
}

/// Convert a facade policy into the SDK request shape.
pub(crate) fn to_sdk_policy(policy: &AccessPolicy) -> Result<sdk::AccessControlPolicy, ServiceError> {
    let grants = policy
        .grants
        .iter()
        .map(to_sdk_grant)
        .collect::<Result<Vec<_>, _>>()?;

    let owner = sdk::Owner::builder()
        .id(&policy.owner.id)
        .set_display_name(policy.owner.display_name.clone())
        .build();

    Ok(sdk::AccessControlPolicy::builder()
        .set_grants(Some(grants))
        .owner(owner)
        .build())
}

fn to_sdk_grant(grant: &Grant) -> Result<sdk::Grant, ServiceError> {
    let builder = match &grant.grantee {
        Grantee::CanonicalUser { id, display_name } => sdk::Grantee::builder()
            .r#type(sdk::Type::CanonicalUser)
            .id(id)
            .set_display_name(display_name.clone()),
        Grantee::Group { uri } => sdk::Grantee::builder().r#type(sdk::Type::Group).uri(uri),
        Grantee::Email { address } => sdk::Grantee::builder()
            .r#type(sdk::Type::AmazonCustomerByEmail)
            .email_address(address),
    };
    let grantee = builder
        .build()
        .map_err(|e| ServiceError::client(format!("invalid grantee {}: {e}", grant.grantee)))?;

    Ok(sdk::Grant::builder()
        .grantee(grantee)
        .permission(sdk::Permission::from(grant.permission.as_str()))
        .build())
}

/// Convert a `GetObjectAcl` response into a facade policy.
pub(crate) fn from_sdk_policy(
    owner: Option<&sdk::Owner>,
    grants: &[sdk::Grant],
) -> Result<AccessPolicy, ServiceError> {
    let owner = owner.map_or_else(
        || Owner {
            id: String::new(),
            display_name: None,
        },
        |o| Owner {
            id: o.id().unwrap_or_default().to_owned(),
            display_name: o.display_name().map(ToOwned::to_owned),
        },
    );

    let grants = grants
        .iter()
        .map(from_sdk_grant)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AccessPolicy { owner, grants })
}

fn from_sdk_grant(grant: &sdk::Grant) -> Result<Grant, ServiceError> {
    let grantee = grant
        .grantee()
        .ok_or_else(|| ServiceError::client("grant without grantee in ACL response"))?;
    let permission = grant
        .permission()
        .ok_or_else(|| ServiceError::client("grant without permission in ACL response"))?;

    let grantee = match grantee.r#type() {
        sdk::Type::CanonicalUser => Grantee::CanonicalUser {
            id: grantee.id().unwrap_or_default().to_owned(),
            display_name: grantee.display_name().map(ToOwned::to_owned),
        },
        sdk::Type::Group => Grantee::Group {
            uri: grantee.uri().unwrap_or_default().to_owned(),
        },
        sdk::Type::AmazonCustomerByEmail => Grantee::Email {
            address: grantee.email_address().unwrap_or_default().to_owned(),
        },
        other => {
            return Err(ServiceError::client(format!(
                "unsupported grantee type in ACL response: {}",
                other.as_str()
            )));
        }
    };

    let permission = permission
        .as_str()
        .parse::<Permission>()
        .map_err(|e| ServiceError::client(format!("invalid ACL response: {e}")))?;

    Ok(Grant::new(grantee, permission))
}
