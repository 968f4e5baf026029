//! Storage client integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bucketdesk_core::AwsRegion;
    use bucketdesk_storage::{ObjectStore, VersioningState, VersioningStatus};
    use bytes::Bytes;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, storage_client};

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_resolve_default_region() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "region").await;

        let region = storage_client(AwsRegion::DEFAULT)
            .verify_region(&bucket)
            .await
            .expect("verify region");
        assert_eq!(region, AwsRegion::default());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_region_lookup_for_missing_bucket() {
        let result = storage_client(AwsRegion::DEFAULT)
            .verify_region("bucketdesk-does-not-exist-0000")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upload_and_list_with_folders() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "list").await;
        let storage = storage_client(AwsRegion::DEFAULT);

        storage
            .upload(&bucket, Bytes::from_static(b"png"), "images/a.png", "image/png")
            .await
            .expect("upload image");
        storage
            .upload(&bucket, Bytes::from_static(b"txt"), "notes.txt", "text/plain")
            .await
            .expect("upload text");

        let listing = storage.list_objects(&bucket, "").await.expect("list");
        assert!(listing.files.contains(&"images/a.png".to_owned()));
        assert!(listing.files.contains(&"notes.txt".to_owned()));
        assert!(listing.folders.contains("images/"));

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("images/a.png")
            .send()
            .await
            .expect("head object");
        assert_eq!(head.content_type(), Some("image/png"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_disabled_versioning_for_new_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "verdis").await;

        let state = storage_client(AwsRegion::DEFAULT)
            .versioning_status(&bucket)
            .await
            .expect("versioning status");
        assert_eq!(state, VersioningState::Disabled);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_toggle_versioning_and_list_versions() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "ver").await;
        let storage = storage_client(AwsRegion::DEFAULT);

        storage
            .set_versioning_status(&bucket, VersioningStatus::Enabled)
            .await
            .expect("enable versioning");
        assert_eq!(
            storage.versioning_status(&bucket).await.expect("status"),
            VersioningState::Enabled
        );

        for body in [&b"v1"[..], &b"v2-longer"[..]] {
            storage
                .upload(&bucket, Bytes::copy_from_slice(body), "doc.txt", "text/plain")
                .await
                .expect("upload version");
        }

        let versions = storage
            .list_versions(&bucket, "doc.txt")
            .await
            .expect("list versions");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions.iter().filter(|v| v.is_latest).count(), 1);
        assert_ne!(versions[0].version_id, versions[1].version_id);

        storage
            .set_versioning_status(&bucket, VersioningStatus::Suspended)
            .await
            .expect("suspend versioning");
        assert_eq!(
            storage.versioning_status(&bucket).await.expect("status"),
            VersioningState::Suspended
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_no_versions_for_missing_key() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nover").await;

        let versions = storage_client(AwsRegion::DEFAULT)
            .list_versions(&bucket, "never-written.txt")
            .await
            .expect("list versions");
        assert!(versions.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_issue_distinct_download_urls() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "url").await;
        let storage = storage_client(AwsRegion::DEFAULT);

        let current = storage
            .download_url(&bucket, "pdf/report.pdf", TTL)
            .await
            .expect("download url");
        let pinned = storage
            .version_download_url(&bucket, "pdf/report.pdf", "v-1", TTL)
            .await
            .expect("version url");

        assert!(current.contains("X-Amz-Expires=3600"));
        assert!(pinned.contains("versionId=v-1"));
        assert_ne!(current, pinned);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_object_from_unversioned_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "del").await;
        let storage = storage_client(AwsRegion::DEFAULT);

        storage
            .upload(&bucket, Bytes::from_static(b"x"), "others/a.txt", "text/plain")
            .await
            .expect("upload");
        storage
            .delete_object(&bucket, "others/a.txt")
            .await
            .expect("delete");

        let listing = storage.list_objects(&bucket, "").await.expect("list");
        assert!(listing.files.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }
}
