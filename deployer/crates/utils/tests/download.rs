use deployer_utils::{fetch_archive, DownloadError};
use httpmock::prelude::*;
use reqwest::StatusCode;
use rstest::rstest;
use url::Url;

#[rstest]
#[tokio::test]
async fn fetch_archive_returns_full_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/releases/archive.tar.gz");
            then.status(200).body(b"archive-bytes");
        })
        .await;

    let url = Url::parse(&server.url("/releases/archive.tar.gz")).unwrap();
    let body = fetch_archive(&reqwest::Client::new(), &url).await.unwrap();

    assert_eq!(body.as_ref(), b"archive-bytes");
    mock.assert_async().await;
}

#[rstest]
#[case(404)]
#[case(500)]
#[case(403)]
#[tokio::test]
async fn fetch_archive_rejects_non_ok_status(#[case] status: u16) {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(status).body("nope");
        })
        .await;

    let url = Url::parse(&server.url("/missing")).unwrap();
    let err = fetch_archive(&reqwest::Client::new(), &url).await.unwrap_err();

    assert!(matches!(err, DownloadError::UnexpectedStatus { .. }));
    assert_eq!(err.status(), Some(StatusCode::from_u16(status).unwrap()));
}
