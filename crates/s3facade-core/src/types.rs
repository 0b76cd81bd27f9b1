//! Object references, listing entries, and upload payloads.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bucket, used as a listing scope and as the target of bucket creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketRef(String);

impl BucketRef {
    /// Create a bucket reference from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the bucket name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference the object stored under `key` in this bucket.
    #[must_use]
    pub fn object(&self, key: impl Into<String>) -> ObjectRef {
        ObjectRef::new(self.0.clone(), key)
    }
}

impl fmt::Display for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to one remote object, identified by bucket and key.
///
/// The object itself lives in the storage service; holding a reference says
/// nothing about whether it exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl ObjectRef {
    /// Create a reference to `key` in `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// The bucket this object belongs to.
    #[must_use]
    pub fn bucket_ref(&self) -> BucketRef {
        BucketRef::new(self.bucket.clone())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp, when reported.
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag, when reported.
    pub etag: Option<String>,
}

/// What to upload: bytes already in memory, or a local file to stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutSource {
    /// Raw object content.
    Bytes(Bytes),
    /// Path of a local file whose content becomes the object body.
    File(PathBuf),
}

impl PutSource {
    /// Upload the content of the file at `path`.
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

impl From<Bytes> for PutSource {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<Vec<u8>> for PutSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

impl From<&'static [u8]> for PutSource {
    fn from(data: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(data))
    }
}

impl From<PathBuf> for PutSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for PutSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

/// An upload body handed to a backend.
///
/// The file variant owns its handle; the handle is closed when the body is
/// dropped, whichever way the upload ends.
#[derive(Debug)]
pub enum ObjectBody {
    /// In-memory content.
    Bytes(Bytes),
    /// An opened local file and its length in bytes.
    File {
        /// Handle opened for reading.
        file: tokio::fs::File,
        /// File length at open time.
        len: u64,
    },
}

impl ObjectBody {
    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Bytes(data) => data.len() as u64,
            Self::File { len, .. } => *len,
        }
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the whole body into memory.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        use tokio::io::AsyncReadExt;

        match self {
            Self::Bytes(data) => Ok(data),
            Self::File { mut file, len } => {
                let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
                file.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}
