//! Object facade integration tests: put, get, list, copy.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use s3facade_core::{BucketRef, FacadeError, ObjectFacade, ObjectRef};

    use crate::{backend, cleanup_bucket, create_test_bucket, facade};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_bytes() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "putget").await;

        let object = facade(&backend, &bucket, "greeting.txt");
        object
            .put(b"hello, facade!".as_slice())
            .await
            .expect("put");

        let data = object.get().await.expect("get");
        assert_eq!(data.as_ref(), b"hello, facade!");

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_file_content() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "putfile").await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"console.log('exam');").expect("write");

        let object = facade(&backend, &bucket, "js/index_exam.js");
        object.put(file.path()).await.expect("put file");

        let data = object.get().await.expect("get");
        assert_eq!(data.as_ref(), b"console.log('exam');");

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_put_for_missing_file() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "missing").await;

        let dir = tempfile::tempdir().expect("tempdir");
        let object = facade(&backend, &bucket, "js/missing.js");
        let err = object
            .put(dir.path().join("missing.js"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, FacadeError::LocalResource { .. }));

        let listed = ObjectFacade::list(backend.as_ref(), &BucketRef::new(bucket.as_str()), None)
            .await
            .expect("list");
        assert!(listed.is_empty());

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_surface_no_such_key() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "nokey").await;

        let err = facade(&backend, &bucket, "absent.txt")
            .get()
            .await
            .expect_err("absent");
        assert_eq!(err.service_code(), Some("NoSuchKey"));

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_by_prefix() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "list").await;

        for key in ["js/a.js", "img/b.png", "js/c.js"] {
            facade(&backend, &bucket, key)
                .put(key.as_bytes().to_vec())
                .await
                .expect("put");
        }

        let bucket_ref = BucketRef::new(bucket.as_str());
        let js = ObjectFacade::list(backend.as_ref(), &bucket_ref, Some("js/"))
            .await
            .expect("list js");
        let keys: Vec<_> = js.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["js/a.js", "js/c.js"]);
        assert_eq!(js[0].size, 7);

        let all = ObjectFacade::list(backend.as_ref(), &bucket_ref, Some(""))
            .await
            .expect("list all");
        assert_eq!(all.len(), 3);

        cleanup_bucket(backend.client(), &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_copy_across_buckets() {
        let backend = backend();
        let src_bucket = create_test_bucket(&backend, "copysrc").await;
        let dst_bucket = create_test_bucket(&backend, "copydst").await;

        let source = facade(&backend, &src_bucket, "js/my file.js");
        source.put(b"let x = 1;".as_slice()).await.expect("put");

        let destination = ObjectRef::new(dst_bucket.as_str(), "backup/my file.js");
        source.copy(&destination).await.expect("copy");

        let copied = facade(&backend, &dst_bucket, "backup/my file.js")
            .get()
            .await
            .expect("get copy");
        assert_eq!(copied, source.get().await.expect("get source"));

        cleanup_bucket(backend.client(), &src_bucket).await;
        cleanup_bucket(backend.client(), &dst_bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_duplicate_bucket() {
        let backend = backend();
        let bucket = create_test_bucket(&backend, "dup").await;

        let err = s3facade_core::create_bucket(
            backend.as_ref(),
            &BucketRef::new(bucket.as_str()),
            None,
        )
        .await
        .expect_err("bucket exists");
        assert!(matches!(
            err.service_code(),
            Some("BucketAlreadyOwnedByYou" | "BucketAlreadyExists")
        ));

        cleanup_bucket(backend.client(), &bucket).await;
    }
}
