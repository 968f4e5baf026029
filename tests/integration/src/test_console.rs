//! Session gateway integration tests against a live store.

#[cfg(test)]
mod tests {
    use bucketdesk_console::{
        FlashLevel, LoginRequest, Outcome, Session, SessionGateway, UploadedFile, View,
    };
    use bucketdesk_core::AwsRegion;
    use bytes::Bytes;

    use crate::{ACCESS_KEY, SECRET_KEY, cleanup_bucket, connector, create_test_bucket, s3_client};

    fn login_request(bucket: &str, region: &str) -> LoginRequest {
        LoginRequest {
            access_key: ACCESS_KEY.to_owned(),
            secret_key: SECRET_KEY.to_owned(),
            region: region.to_owned(),
            bucket: bucket.to_owned(),
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_login_upload_and_render_listing() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "console").await;
        let gateway = SessionGateway::with_default_ttl(connector());
        let mut session = Session::default();

        gateway
            .login(&mut session, login_request(&bucket, AwsRegion::DEFAULT))
            .await;
        assert!(session.is_authenticated());

        gateway
            .upload(
                &mut session,
                Some(UploadedFile {
                    filename: "photo.PNG".to_owned(),
                    content_type: Some("image/png".to_owned()),
                    body: Bytes::from_static(b"png"),
                }),
            )
            .await;
        let flashes = session.take_flashes();
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert_eq!(flashes[0].message, "Uploaded to: images/photo.PNG");

        let Outcome::Render(View::Index(index)) = gateway.index_view(&mut session).await else {
            panic!("expected index view");
        };
        assert_eq!(index.listing.files, vec!["images/photo.PNG".to_owned()]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_login_claiming_wrong_region() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "wrongregion").await;
        let gateway = SessionGateway::with_default_ttl(connector());
        let mut session = Session::default();

        gateway
            .login(&mut session, login_request(&bucket, "ap-south-1"))
            .await;
        assert!(!session.is_authenticated());
        assert_eq!(
            session.flashes()[0].message,
            format!("Region Error: Bucket is in {}, not ap-south-1", AwsRegion::DEFAULT)
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
