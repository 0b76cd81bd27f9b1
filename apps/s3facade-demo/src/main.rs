//! S3 object facade demo.
//!
//! Creates the demo bucket, uploads a fixed set of build artifacts with a
//! `public-read` ACL, and grants `READ` on each of them to one email
//! identity, printing the resulting grants.
//!
//! # Usage
//!
//! ```text
//! S3_ENDPOINT_URL=http://localhost:4566 s3facade-demo
//! s3facade-demo --in-memory
//! ```
//!
//! With `--in-memory` the run goes against an in-process backend with the
//! grantee registered, so no service or credentials are needed.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_REGION` | *(SDK default chain)* | Client and bucket region override |
//! | `S3_ENDPOINT_URL` | *(unset)* | Custom S3-compatible endpoint |
//! | `S3_FORCE_PATH_STYLE` | `false` | Path-style bucket addressing |
//! | `S3_WAIT_DELAY_MS` | `5000` | Delay between existence checks |
//! | `S3_WAIT_MAX_ATTEMPTS` | `20` | Existence checks after each write |
//! | `DEMO_BUCKET` | `evaluationroom.com` | Target bucket |
//! | `DEMO_SOURCE_DIR` | `../../../EvaluationRoom_React/build/` | Artifact directory |
//! | `DEMO_KEYS` | `js/index_exam.js,js/index_public.js,js/index.js` | Artifacts to upload |
//! | `DEMO_GRANTEE_EMAIL` | `grantee@example.com` | Identity granted read access |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;
mod driver;

use std::sync::Arc;

use anyhow::{Context, Result};
use s3facade_aws::AwsBackend;
use s3facade_core::{FacadeConfig, MemoryBackend, ObjectBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the backend the demo runs against.
async fn build_backend(
    in_memory: bool,
    facade_config: &FacadeConfig,
    demo: &DemoConfig,
) -> Arc<dyn ObjectBackend> {
    if in_memory {
        let backend = MemoryBackend::new();
        backend.register_identity(demo.grantee_email.as_str());
        Arc::new(backend)
    } else {
        Arc::new(AwsBackend::from_config(facade_config).await)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let in_memory = std::env::args().any(|a| a == "--in-memory");

    let mut stdout = std::io::stdout();
    driver::banner(&mut stdout)?;

    let facade_config = FacadeConfig::from_env();
    init_tracing(&facade_config.log_level)?;

    let demo = DemoConfig::from_env();
    info!(
        region = ?facade_config.region,
        endpoint = ?facade_config.endpoint_url,
        bucket = %demo.bucket,
        source_dir = %demo.source_dir.display(),
        keys = ?demo.keys,
        in_memory,
        "starting S3 object demo",
    );

    let backend = build_backend(in_memory, &facade_config, &demo).await;
    driver::run(backend, &facade_config, &demo, &mut stdout).await
}
