//! Common test utilities for playlist-dl integration tests

use playlist_dl::{Config, DownloadConfig, PlaylistDownloader, ServiceConfig};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Playlist body as the service returns it, including a deleted (`null`) entry
pub fn mix_playlist() -> serde_json::Value {
    json!({
        "title": "Mix",
        "videos": [
            {"id": "a", "title": "First", "thumbnail": "https://i.example/a.jpg", "duration": 60},
            null,
            {"id": "b", "title": "Second", "thumbnail": null, "duration": 90.7}
        ]
    })
}

/// Mount `POST /api/playlist` answering `body` for requests about `playlist_url`
pub async fn mount_playlist(server: &MockServer, playlist_url: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/playlist"))
        .and(body_json(json!({ "url": playlist_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount `GET /api/download` for one item and format
pub async fn mount_download(
    server: &MockServer,
    id: &str,
    format: &str,
    response: ResponseTemplate,
) {
    Mock::given(method("GET"))
        .and(path("/api/download"))
        .and(query_param("video_id", id))
        .and(query_param("format", format))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Create a downloader pointed at `server`, saving into a fresh temp directory
pub async fn create_downloader(server: &MockServer) -> (PlaylistDownloader, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        service: ServiceConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        download: DownloadConfig {
            download_dir: temp_dir.path().join("downloads"),
            ..Default::default()
        },
    };
    let downloader = PlaylistDownloader::new(config).await.unwrap();
    (downloader, temp_dir)
}
