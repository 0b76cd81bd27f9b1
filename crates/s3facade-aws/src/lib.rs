//! aws-sdk-s3 backend for the S3 object facade.
//!
//! [`AwsBackend`] implements [`s3facade_core::ObjectBackend`] on top of an
//! `aws_sdk_s3::Client`, mapping SDK failures to
//! [`s3facade_core::ServiceError`] with the S3 error code preserved.

mod client;
mod convert;

pub use client::AwsBackend;
