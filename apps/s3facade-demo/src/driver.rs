//! The demo run: create the bucket, upload each artifact, grant read access.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use s3facade_core::config::location_constraint;
use s3facade_core::{
    BucketRef, FacadeConfig, FacadeError, ObjectBackend, ObjectFacade, PutSource, ServiceError,
    create_bucket,
};
use tracing::warn;

use crate::config::DemoConfig;

/// Width of the separator lines.
const RULE_WIDTH: usize = 88;

const UNRESOLVABLE_GRANTEE_NOTICE: &str = "\
This demo couldn't apply the ACL to the object because the email
address specified as the grantee is for a test user who does not
exist. For this request to succeed, you must replace the grantee
email with one for an existing AWS user.";

fn rule(out: &mut impl Write, ch: char) -> Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(RULE_WIDTH))?;
    Ok(())
}

/// Print the welcome banner.
pub fn banner(out: &mut impl Write) -> Result<()> {
    rule(out, '-')?;
    writeln!(out, "Welcome to the Amazon S3 object demo!")?;
    rule(out, '-')
}

/// Run the demo against `backend`, writing progress to `out`.
///
/// A bucket that cannot be created is reported and the run continues. Any
/// upload failure aborts the run. A grant to an email the service cannot
/// resolve is reported and the run moves on to the next artifact; any other
/// grant failure aborts.
pub async fn run(
    backend: Arc<dyn ObjectBackend>,
    facade_config: &FacadeConfig,
    demo: &DemoConfig,
    out: &mut impl Write,
) -> Result<()> {
    let bucket = BucketRef::new(demo.bucket.as_str());
    let region = backend.region().or_else(|| facade_config.region.clone());

    if let Err(err) = create_bucket(
        backend.as_ref(),
        &bucket,
        location_constraint(region.as_deref()),
    )
    .await
    {
        let reason = err
            .as_service_error()
            .map_or_else(|| err.to_string(), |e| e.message.clone());
        writeln!(
            out,
            "Couldn't create a bucket for the demo. Here's why: {reason}."
        )?;
    }

    for key in &demo.keys {
        let facade = ObjectFacade::new(Arc::clone(&backend), bucket.object(key.as_str()))
            .with_wait(facade_config.wait_config());

        facade
            .put(PutSource::file(demo.source_path(key)))
            .await
            .with_context(|| format!("failed to upload {key}"))?;
        writeln!(out, "Put file object with key {key} in bucket {bucket}.")?;

        match grant_and_describe(&facade, &demo.grantee_email).await {
            Ok(grants) => writeln!(out, "Put ACL grants on object {key}: {grants}")?,
            Err(err)
                if err
                    .downcast_ref::<FacadeError>()
                    .and_then(FacadeError::as_service_error)
                    .is_some_and(ServiceError::is_unresolvable_grantee) =>
            {
                warn!(key = %key, grantee = %demo.grantee_email, "grantee email does not resolve");
                rule(out, '*')?;
                writeln!(out, "{UNRESOLVABLE_GRANTEE_NOTICE}")?;
                rule(out, '*')?;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to grant read access on {key}"));
            }
        }
    }

    rule(out, '-')
}

/// Grant read access to `email` and return the resulting grants as JSON.
async fn grant_and_describe(facade: &ObjectFacade, email: &str) -> Result<String> {
    facade.grant_read_access(email).await?;
    let policy = facade.access_policy().await?;
    let grants = serde_json::to_string(&policy.grants).context("failed to encode grants")?;
    Ok(grants)
}
