use std::time::{Duration, Instant};

use httpmock::prelude::*;
use link_preview::{get_preview, PreviewOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Launch day</title>
  <meta name="description" content="Everything that shipped today.">
  <meta property="og:type" content="article">
  <meta property="og:image" content="/img/cover.png">
  <meta property="og:image" content="https://cdn.example.com/second.png">
  <meta property="og:video" content="/media/teaser.swf">
  <meta property="og:video:type" content="application/x-shockwave-flash">
  <meta property="og:video" content="/media/teaser.mp4">
  <meta property="og:video:type" content="video/mp4">
  <meta property="og:video:width" content="1280">
  <meta property="og:video:height" content="720">
</head>
<body><img src="/inline.png" width="800" height="600"></body>
</html>"#;

#[tokio::test]
async fn html_page_is_extracted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/post");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(ARTICLE);
        })
        .await;

    let url = server.url("/post");
    let result = get_preview(url.as_str()).await;
    mock.assert_async().await;

    assert_eq!(result.url, url);
    assert!(!result.load_failed);
    assert_eq!(result.title.as_deref(), Some("Launch day"));
    assert_eq!(result.description.as_deref(), Some("Everything that shipped today."));
    assert_eq!(result.content_type.as_deref(), Some("text/html"));
    assert_eq!(result.media_type, "article");
    assert_eq!(
        result.images,
        vec![server.url("/img/cover.png"), "https://cdn.example.com/second.png".to_string()]
    );

    let videos = result.videos.expect("og:video present");
    let urls: Vec<&str> = videos.iter().map(|v| v.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![server.url("/media/teaser.mp4"), server.url("/media/teaser.swf")]
    );
    assert!(videos
        .iter()
        .all(|v| v.width.as_deref() == Some("1280") && v.height.as_deref() == Some("720")));
    assert_eq!(result.audios, None);
}

#[tokio::test]
async fn image_response_becomes_photo_record() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/photo.jpg");
            then.status(200)
                .header("content-type", "image/jpeg")
                .body(vec![0xffu8; 256 * 1024]);
        })
        .await;

    let url = server.url("/photo.jpg");
    let result = get_preview(url.clone()).await;

    assert!(!result.load_failed);
    assert_eq!(result.url, url);
    assert_eq!(result.media_type, "photo");
    assert_eq!(result.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(result.images, vec![url]);
    assert_eq!(result.title.as_deref(), Some(""));
    assert_eq!(result.description.as_deref(), Some(""));
    assert_eq!(result.videos, None);
}

#[tokio::test]
async fn media_transfer_is_cut_off_at_the_headers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Announces a 100 MB image, sends a handful of bytes, then never sends the rest.
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\n\
                    Content-Type: image/jpeg\r\n\
                    Content-Length: 100000000\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&[0xff, 0xd8, 0xff, 0xe0]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let url = format!("http://{}/p.jpg", addr);
    let started = Instant::now();
    let result = get_preview(url.as_str()).await;
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_secs(2),
        "expected the body to be abandoned, took {:?}",
        elapsed
    );
    assert!(!result.load_failed);
    assert_eq!(result.media_type, "photo");
    assert_eq!(result.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(result.images, vec![url]);
}

#[tokio::test]
async fn other_media_keeps_only_content_type() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/report.pdf");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4");
        })
        .await;

    let result = get_preview(server.url("/report.pdf")).await;

    assert!(!result.load_failed);
    assert_eq!(result.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(result.media_type, "website");
    assert!(result.images.is_empty());
}

#[tokio::test]
async fn media_header_wins_over_error_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing.png");
            then.status(404).header("content-type", "image/png").body("gone");
        })
        .await;

    let result = get_preview(server.url("/missing.png")).await;

    assert!(!result.load_failed);
    assert_eq!(result.media_type, "photo");
}

#[tokio::test]
async fn non_200_html_is_a_failed_load() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone");
            then.status(404)
                .header("content-type", "text/html")
                .body("<html><head><title>Not found</title></head></html>");
        })
        .await;

    let url = server.url("/gone");
    let result = get_preview(url.as_str()).await;

    assert!(result.load_failed);
    assert_eq!(result.url, url);
    assert_eq!(result.title, None);
    assert_eq!(result.description, None);
    assert_eq!(result.content_type, None);
    assert!(result.images.is_empty());
    assert_eq!(result.videos, None);
}

#[tokio::test]
async fn empty_body_is_a_failed_load() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/empty");
            then.status(200).header("content-type", "text/html").body("");
        })
        .await;

    let result = get_preview(server.url("/empty")).await;
    assert!(result.load_failed);
}

#[tokio::test]
async fn unreachable_host_is_a_failed_load() {
    let result = get_preview("http://127.0.0.1:1/").await;
    assert!(result.load_failed);
    assert_eq!(result.url, "http://127.0.0.1:1/");
}

#[tokio::test]
async fn request_options_reach_the_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/private")
                .header("user-agent", "PreviewBot/2.0")
                .header("x-preview-token", "secret");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html><head><title>Members</title></head></html>");
        })
        .await;

    let options = PreviewOptions::new(server.url("/private"))
        .user_agent("PreviewBot/2.0")
        .header("x-preview-token", "secret");
    let result = get_preview(options).await;
    mock.assert_async().await;

    assert!(!result.load_failed);
    assert_eq!(result.title.as_deref(), Some("Members"));
}

#[tokio::test]
async fn default_user_agent_is_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ua")
                .header("user-agent", "link-preview-api/1.0");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html><body><img src=\"pic.png\"></body></html>");
        })
        .await;

    let result = get_preview(server.url("/ua")).await;
    mock.assert_async().await;

    assert_eq!(result.images, vec![server.url("/pic.png")]);
}
