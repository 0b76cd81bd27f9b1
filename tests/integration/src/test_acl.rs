//! Access policy integration tests.

#[cfg(test)]
mod tests {
    use s3facade_core::{
        ALL_USERS_GROUP_URI, Grant, Grantee, Permission, UNRESOLVABLE_GRANT_BY_EMAIL,
    };

    use crate::{backend, cleanup_bucket, create_test_bucket, facade};

    const GRANTEE: &str = "grantee@example.com";

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_apply_public_read_on_put() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "acl").await;

        let object = facade(&backend, &bucket, "index.html");
        object.put(b"<html></html>".as_slice()).await.expect("put");

        let policy = object.access_policy().await.expect("get acl");
        let public_grant = Grant::new(
            Grantee::Group {
                uri: ALL_USERS_GROUP_URI.to_owned(),
            },
            Permission::Read,
        );
        let owner_has_full_control = policy.grants.iter().any(|g| {
            g.permission == Permission::FullControl
                && matches!(&g.grantee, Grantee::CanonicalUser { id, .. } if *id == policy.owner.id)
        });
        assert!(owner_has_full_control);
        assert!(policy.grants.contains(&public_grant));

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_append_email_grant_or_reject_unknown_identity() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "grant").await;

        let object = facade(&backend, &bucket, "js/index.js");
        object.put(b"export {};".as_slice()).await.expect("put");
        let before = object.access_policy().await.expect("acl before");

        match object.grant_read_access(GRANTEE).await {
            Ok(()) => {
                let after = object.access_policy().await.expect("acl after");
                assert_eq!(after.grants.len(), before.grants.len() + 1);
                assert!(after.grants.contains(&Grant::read_by_email(GRANTEE)));
            }
            Err(err) => {
                assert_eq!(err.service_code(), Some(UNRESOLVABLE_GRANT_BY_EMAIL));
                let after = object.access_policy().await.expect("acl after");
                assert_eq!(after, before);
            }
        }

        cleanup_bucket(backend.client(), &bucket).await;
    }
}
