//! Demo run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Bucket the demo uploads into.
const DEFAULT_BUCKET: &str = "evaluationroom.com";

/// Directory holding the build artifacts.
const DEFAULT_SOURCE_DIR: &str = "../../../EvaluationRoom_React/build/";

/// Build artifacts uploaded by default, relative to the source directory.
const DEFAULT_KEYS: [&str; 3] = ["js/index_exam.js", "js/index_public.js", "js/index.js"];

/// Placeholder grantee; replace with the email of an existing account.
const DEFAULT_GRANTEE_EMAIL: &str = "grantee@example.com";

/// What the demo uploads, where, and who gets read access.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct DemoConfig {
    /// Target bucket.
    #[builder(default = String::from(DEFAULT_BUCKET))]
    pub bucket: String,

    /// Local directory the keys are resolved against.
    #[builder(default = PathBuf::from(DEFAULT_SOURCE_DIR))]
    pub source_dir: PathBuf,

    /// Object keys, each also the relative path of its source file.
    #[builder(default = default_keys())]
    pub keys: Vec<String>,

    /// Email identity granted `READ` on every uploaded object.
    #[builder(default = String::from(DEFAULT_GRANTEE_EMAIL))]
    pub grantee_email: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DemoConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DEMO_BUCKET` | `evaluationroom.com` |
    /// | `DEMO_SOURCE_DIR` | `../../../EvaluationRoom_React/build/` |
    /// | `DEMO_KEYS` | `js/index_exam.js,js/index_public.js,js/index.js` |
    /// | `DEMO_GRANTEE_EMAIL` | `grantee@example.com` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DEMO_BUCKET") {
            config.bucket = v;
        }
        if let Ok(v) = std::env::var("DEMO_SOURCE_DIR") {
            config.source_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEMO_KEYS") {
            config.keys = parse_keys(&v);
        }
        if let Ok(v) = std::env::var("DEMO_GRANTEE_EMAIL") {
            config.grantee_email = v;
        }

        config
    }

    /// Local path of the file uploaded under `key`.
    #[must_use]
    pub fn source_path(&self, key: &str) -> PathBuf {
        self.source_dir.join(key)
    }
}

fn default_keys() -> Vec<String> {
    DEFAULT_KEYS.iter().map(|k| (*k).to_owned()).collect()
}

/// Split a comma-separated key list, dropping blanks.
fn parse_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
