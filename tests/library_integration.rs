//! End-to-end library manager scenarios against a mock download API.

use std::sync::Arc;
use std::time::Duration;

use offtube::config::{ApiConfig, AppConfig};
use offtube::library::{LibraryError, LibraryEvent};
use offtube::player::PlaybackState;
use offtube::resolver::{RapidApiResolver, ResolveError};
use offtube::store::MetadataStore;
use offtube::{Video, VideoLibrary};
use tempfile::TempDir;
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        media_dir: dir.path().join("media"),
        resolve_attempts: 1,
        resolve_backoff_secs: 0,
        ..AppConfig::default()
    }
}

fn resolver_for(server: &MockServer) -> Arc<RapidApiResolver> {
    Arc::new(RapidApiResolver::new(&ApiConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        host: "api.test".to_string(),
        request_timeout: Duration::from_secs(5),
    }))
}

async fn open_library(dir: &TempDir, server: &MockServer) -> VideoLibrary {
    VideoLibrary::open(&test_config(dir), resolver_for(server))
        .await
        .unwrap()
}

/// Mounts the resolve endpoint with three quality variants plus the media
/// and thumbnail files they point at.
async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/videodownload.php"))
        .and(query_param("url", "https://youtu.be/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "req-1": {
                "resourceId": "abc123",
                "title": "Test clip",
                "duration": 95,
                "thumbnails": [{"url": format!("{}/thumbs/abc123.jpg", server.uri())}],
                "urls": [
                    {"url": "/media/abc123-480.mp4", "quality": "480", "extension": "mp4"},
                    {"url": "/media/abc123-720.mp4", "quality": "720", "extension": "mp4"},
                    {"url": "/media/abc123-1080.mp4", "quality": "1080", "extension": "mp4"}
                ]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/media/abc123-720.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"seven twenty bytes".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/thumbs/abc123.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_from_url_happy_path() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let dir = TempDir::new().unwrap();
    let library = open_library(&dir, &server).await;
    let mut events = library.subscribe();

    let video = library.add_from_url("https://youtu.be/abc123").await.unwrap();

    // Selector picked the exact 720 target.
    assert!(video.remote_url.ends_with("/media/abc123-720.mp4"));
    assert_eq!(video.id, "abc123");
    assert_eq!(video.title, "Test clip");
    assert_eq!(video.duration, Some(95));
    assert!(video.is_playable_offline());

    // Inserted at the head of the list.
    let snapshot = library.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, "abc123");

    // The media and thumbnail files landed at their deterministic paths.
    let media_path = dir.path().join("media").join("abc123.mp4");
    assert_eq!(std::fs::read(&media_path).unwrap(), b"seven twenty bytes");
    assert!(dir.path().join("media").join("abc123.jpg").exists());

    // Exactly one VideosUpdated event fired.
    assert_eq!(events.try_recv().unwrap(), LibraryEvent::VideosUpdated);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_add_picks_max_below_target_when_no_exact_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videodownload.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "req-1": {
                "resourceId": "low123",
                "title": "Low quality only",
                "urls": [
                    {"url": "/media/low-240.mp4", "quality": "240"},
                    {"url": "/media/low-360.mp4", "quality": "360"}
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/low-360.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"three sixty".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let library = open_library(&dir, &server).await;

    let video = library.add_from_url("https://youtu.be/low123").await.unwrap();
    assert!(video.remote_url.ends_with("/media/low-360.mp4"));
}

#[tokio::test]
async fn test_resolver_network_failure_leaves_library_unchanged() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    // Nothing listens on port 1: every resolve is a transport failure.
    let resolver = Arc::new(RapidApiResolver::new(&ApiConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key: "test-key".to_string(),
        host: "api.test".to_string(),
        request_timeout: Duration::from_secs(2),
    }));
    let library = VideoLibrary::open(&config, resolver).await.unwrap();
    let mut events = library.subscribe();

    let result = library.add_from_url("https://youtu.be/abc123").await;
    assert!(matches!(
        result,
        Err(LibraryError::Resolve(ResolveError::Network { .. }))
    ));
    assert!(library.is_empty().await);

    match events.try_recv().unwrap() {
        LibraryEvent::DownloadFailed { message } => {
            assert!(message.contains("network error"), "got: {message}");
        }
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_thumbnail_failure_is_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videodownload.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "req-1": {
                "resourceId": "nothumb",
                "title": "No preview",
                "thumbnails": [{"url": format!("{}/thumbs/missing.jpg", server.uri())}],
                "urls": [{"url": "/media/nothumb-720.mp4", "quality": "720"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/nothumb-720.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video".to_vec()))
        .mount(&server)
        .await;
    // The thumbnail endpoint 404s.
    Mock::given(method("GET"))
        .and(path("/thumbs/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let library = open_library(&dir, &server).await;

    let video = library.add_from_url("https://youtu.be/nothumb").await.unwrap();
    assert_eq!(video.thumbnail_url, None);
    assert!(video.is_playable_offline());
    assert!(!dir.path().join("media").join("nothumb.jpg").exists());
}

#[tokio::test]
async fn test_remove_deletes_files_and_persists_empty_list() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let dir = TempDir::new().unwrap();
    let library = open_library(&dir, &server).await;
    library.add_from_url("https://youtu.be/abc123").await.unwrap();

    let media_path = dir.path().join("media").join("abc123.mp4");
    assert!(media_path.exists());

    let removed = library.remove(0).await.unwrap();
    assert_eq!(removed.id, "abc123");
    assert!(library.is_empty().await);
    assert!(!media_path.exists());
    assert!(!dir.path().join("media").join("abc123.jpg").exists());

    // metadata.json reflects the empty array.
    let raw = std::fs::read_to_string(dir.path().join("media").join("metadata.json")).unwrap();
    let parsed: Vec<Video> = serde_json::from_str(&raw).unwrap();
    assert!(parsed.is_empty());
}

#[tokio::test]
async fn test_play_current_downloads_on_demand() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/jit.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"just in time".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(&config.media_dir).unwrap();

    // Seed a persisted entry that was never downloaded locally.
    let seeded = Video {
        id: "jit".to_string(),
        title: "Just in time".to_string(),
        remote_url: format!("{}/media/jit.mp4", server.uri()),
        thumbnail_url: None,
        duration: None,
        local_url: None,
    };
    MetadataStore::new(&config.media_dir)
        .save(&[seeded])
        .await
        .unwrap();

    let library = VideoLibrary::open(&config, resolver_for(&server)).await.unwrap();
    let video = library.play_current().await.unwrap();

    let media_path = config.media_dir.join("jit.mp4");
    assert_eq!(video.local_url.as_deref(), Some(media_path.as_path()));
    assert_eq!(std::fs::read(&media_path).unwrap(), b"just in time");
    assert_eq!(library.player().state(), PlaybackState::Playing);

    // local_url was persisted before playback was signaled ready.
    let reloaded = MetadataStore::new(&config.media_dir).load().await;
    assert_eq!(reloaded[0].local_url.as_deref(), Some(media_path.as_path()));
}

#[tokio::test]
async fn test_library_persists_across_reopen() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let dir = TempDir::new().unwrap();
    {
        let library = open_library(&dir, &server).await;
        library.add_from_url("https://youtu.be/abc123").await.unwrap();
    }

    let reopened = open_library(&dir, &server).await;
    let snapshot = reopened.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, "abc123");
    assert!(snapshot[0].is_playable_offline());
}

#[tokio::test]
async fn test_redownload_replaces_existing_file() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let dir = TempDir::new().unwrap();
    let library = open_library(&dir, &server).await;
    library.add_from_url("https://youtu.be/abc123").await.unwrap();
    library.add_from_url("https://youtu.be/abc123").await.unwrap();

    // Same id twice: still exactly one media file on disk, but two list
    // entries both pointing at it (the list itself is not deduplicated).
    let media_files: Vec<_> = std::fs::read_dir(dir.path().join("media"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".mp4"))
        .collect();
    assert_eq!(media_files.len(), 1);
    assert_eq!(library.len().await, 2);
}
