//! `MypageSource` against an in-process HTTP mock (no real network).

use gcs_schemas::RecordId;
use gcs_source::{MypageSource, RecordSource, SourceError};
use httpmock::prelude::*;
use serde_json::json;

fn source(server: &MockServer, cookie: Option<&str>) -> MypageSource {
    MypageSource::new_with_base_url(cookie.map(str::to_string), server.base_url())
}

#[test]
fn list_summaries_preserves_source_order_and_sends_cookie() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path("/music_list.php")
            .header("cookie", "PHPSESSID=s3cr3t");
        then.status(200).json_body(json!({
            "status": 0,
            "music_list": [
                { "music_id": 3, "music_title": "Newest", "last_play_time": "2017-01-02 00:00:00" },
                { "music_id": 1, "music_title": "Older",  "last_play_time": "2017-01-01 09:00:00" }
            ]
        }));
    });

    let got = source(&server, Some("PHPSESSID=s3cr3t"))
        .list_summaries()
        .unwrap();
    m.assert();

    assert_eq!(got.len(), 2);
    assert_eq!(got[0].id, RecordId::new("3"));
    assert_eq!(got[0].title, "Newest");
    assert_eq!(got[1].last_activity_time, "2017-01-01 09:00:00");
}

#[test]
fn fetch_detail_queries_by_music_id() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path("/music_detail.php")
            .query_param("music_id", "301");
        then.status(200).json_body(json!({
            "status": 0,
            "music_detail": {
                "music_id": 301,
                "music_title": "Got a pain cover?",
                "ex_flag": 0,
                "simple_result_data": null,
                "normal_result_data": null,
                "hard_result_data": {
                    "play_count": 100, "score": 600, "max_chain": 25,
                    "perfect": 0, "full_chain": 0, "no_miss": 1
                },
                "extra_result_data": null
            }
        }));
    });

    let snap = source(&server, None)
        .fetch_detail(&RecordId::new("301"))
        .unwrap();
    m.assert();

    assert_eq!(snap.title, "Got a pain cover?");
    assert_eq!(snap.tiers.hard.play_count, 100);
    assert!(snap.tiers.hard.no_miss);
}

#[test]
fn missing_detail_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/music_detail.php");
        then.status(200)
            .json_body(json!({ "status": 0, "music_detail": null }));
    });

    let err = source(&server, None)
        .fetch_detail(&RecordId::new("77"))
        .unwrap_err();
    assert_eq!(err, SourceError::NotFound(RecordId::new("77")));
}

#[test]
fn http_404_on_detail_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/music_detail.php");
        then.status(404);
    });

    let err = source(&server, None)
        .fetch_detail(&RecordId::new("78"))
        .unwrap_err();
    assert_eq!(err, SourceError::NotFound(RecordId::new("78")));
}

#[test]
fn server_error_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/music_list.php");
        then.status(503);
    });

    let err = source(&server, None).list_summaries().unwrap_err();
    assert!(matches!(err, SourceError::Unavailable(_)), "got {err:?}");
}

#[test]
fn non_zero_status_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/music_list.php");
        then.status(200).json_body(json!({ "status": 1 }));
    });

    let err = source(&server, None).list_summaries().unwrap_err();
    assert!(matches!(err, SourceError::Unavailable(_)), "got {err:?}");
}

#[test]
fn garbage_body_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/music_list.php");
        then.status(200).body("<html>maintenance</html>");
    });

    let err = source(&server, None).list_summaries().unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)), "got {err:?}");
}
