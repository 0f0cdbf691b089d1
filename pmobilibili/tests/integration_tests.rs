//! Integration tests for pmobilibili

use pmobilibili::{BilibiliClient, Error, MediaLocator, StreamId};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> BilibiliClient {
    BilibiliClient::builder()
        .api_base(server.uri())
        .build()
        .await
        .unwrap()
}

fn mock_view_json() -> serde_json::Value {
    json!({
        "code": 0,
        "message": "0",
        "ttl": 1,
        "data": {
            "bvid": "BV1multi",
            "title": "Three parts",
            "pic": "https://i0.hdslb.com/bfs/archive/cover.jpg",
            "cid": 1001,
            "pages": [
                {"cid": 1001, "page": 1, "part": "intro", "duration": 60},
                {"cid": 1002, "page": 2, "part": "middle", "duration": 120},
                {"cid": 1003, "page": 3, "part": "outro", "duration": 30}
            ]
        }
    })
}

fn mock_playurl_json(url: &str) -> serde_json::Value {
    json!({
        "code": 0,
        "message": "0",
        "data": {
            "quality": 80,
            "dash": {
                "duration": 60,
                "video": [{"id": 80, "baseUrl": "https://x/v.m4s"}],
                "audio": [
                    {"id": 30280, "baseUrl": url, "base_url": url, "bandwidth": 319173, "codecs": "mp4a.40.2"},
                    {"id": 30216, "baseUrl": "https://x/low.m4s", "base_url": "https://x/low.m4s"}
                ]
            }
        }
    })
}

#[tokio::test]
async fn test_single_part_pipeline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(query_param("bvid", "BV1xx"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": 0, "data": {"cid": "42"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .and(query_param("bvid", "BV1xx"))
        .and(query_param("cid", "42"))
        .and(query_param("fnval", "16"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "data": {"dash": {"audio": [{"baseUrl": "https://x/a.m4a"}]}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let audio = client
        .resolve_locator(&MediaLocator::new("BV1xx", None))
        .await
        .unwrap();

    assert_eq!(audio, "https://x/a.m4a");
}

#[tokio::test]
async fn test_sub_part_selects_matching_stream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_view_json()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .and(query_param("cid", "1002"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_playurl_json("https://x/part2.m4s")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;

    let stream_id = client.resolve_stream_id("BV1multi", Some(2)).await.unwrap();
    assert_eq!(stream_id, StreamId::new("1002"));

    let audio = client
        .resolve_locator(&MediaLocator::new("BV1multi", Some(2)))
        .await
        .unwrap();
    assert_eq!(audio, "https://x/part2.m4s");
}

#[tokio::test]
async fn test_part_out_of_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_view_json()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_playurl_json("https://x/a")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client
        .resolve_locator(&MediaLocator::new("BV1multi", Some(9)))
        .await;

    assert!(matches!(
        result,
        Err(Error::PartOutOfRange {
            requested: 9,
            available: 3
        })
    ));
}

#[tokio::test]
async fn test_metadata_failure_status_skips_playback_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": -404, "message": "啥都木有", "ttl": 1})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_playurl_json("https://x/a")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client
        .resolve_locator(&MediaLocator::new("BV1gone", None))
        .await;

    match result {
        Err(Error::ApiError { code, message }) => {
            assert_eq!(code, -404);
            assert_eq!(message, "啥都木有");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_playback_failure_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": -400, "message": "请求错误"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client
        .resolve_audio_source("BV1xx", &StreamId::new("42"), 16)
        .await;

    assert!(matches!(result, Err(Error::ApiError { code: -400, .. })));
}

#[tokio::test]
async fn test_manifest_without_audio() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/player/wbi/playurl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"dash": {"video": [], "audio": null}}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client
        .resolve_audio_source("BV1xx", &StreamId::new("42"), 16)
        .await;

    assert!(matches!(result, Err(Error::NoAudioTrack { .. })));
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client.resolve_stream_id("BV1xx", None).await;

    assert!(matches!(result, Err(Error::HttpStatus(412))));
}

#[tokio::test]
async fn test_malformed_body_is_a_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let result = client.resolve_stream_id("BV1xx", None).await;

    assert!(matches!(result, Err(Error::Json(_))));
    assert!(!result.unwrap_err().is_api_failure());
}

#[tokio::test]
async fn test_requests_carry_referer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/web-interface/view"))
        .and(header("referer", "https://www.bilibili.com/video/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_view_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BilibiliClient::builder()
        .api_base(mock_server.uri())
        .referer("https://www.bilibili.com/video/")
        .build()
        .await
        .unwrap();

    let info = client.video_info("BV1multi").await.unwrap();
    assert_eq!(info.title.as_deref(), Some("Three parts"));
    assert_eq!(info.pages.len(), 3);
}
