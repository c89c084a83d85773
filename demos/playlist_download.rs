//! Playlist download example
//!
//! This example demonstrates the core functionality of playlist-dl:
//! - Pointing the session at a playlist service
//! - Loading a playlist and listing its items
//! - Selecting items and choosing an output format
//! - Monitoring a sequential download batch through events
//!
//! Usage: `cargo run --example playlist_download -- <playlist-url> [mp3|mp4]`

use playlist_dl::config::{Config, DownloadConfig, ServiceConfig};
use playlist_dl::utils::{format_clock, format_total_duration};
use playlist_dl::{BatchOutcome, Event, OutputFormat, PlaylistDownloader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(playlist_url) = args.next() else {
        eprintln!("usage: playlist_download <playlist-url> [mp3|mp4]");
        return Ok(());
    };
    let format = args
        .next()
        .and_then(|code| OutputFormat::from_code(&code))
        .unwrap_or_default();

    let config = Config {
        service: ServiceConfig {
            base_url: "http://localhost:8000".to_string(),
            ..Default::default()
        },
        download: DownloadConfig {
            download_dir: "downloads".into(),
            ..Default::default()
        },
    };

    let mut downloader = PlaylistDownloader::new(config).await?;

    // Subscribe to events
    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::PlaylistLoaded { title, item_count } => {
                    println!("✓ Loaded \"{}\" ({} videos)", title, item_count);
                }
                Event::PlaylistLoadFailed { error } => {
                    println!("✗ {}", error);
                }
                Event::BatchStarted { total, format } => {
                    println!("⬇ Downloading {} item(s) as {}", total, format);
                }
                Event::ItemProgress { id, percent } => {
                    println!("  {}: {}%", id, percent);
                }
                Event::ItemSaved { filename, path, .. } => {
                    println!("✓ Saved {} to {:?}", filename, path);
                }
                Event::ItemFailed { id, error } => {
                    println!("✗ {}: {}", id, error);
                }
                Event::BatchFinished { attempted } => {
                    println!("Done, {} item(s) attempted", attempted);
                }
                _ => {}
            }
        }
    });

    let playlist = downloader.load_playlist(&playlist_url).await?;
    for item in &playlist.items {
        let duration = item
            .duration_seconds
            .map(format_clock)
            .unwrap_or_else(|| "--:--".to_string());
        println!("  [{}] {} ({})", item.id, item.display_title(), duration);
    }

    downloader.select_all();
    downloader.set_format(format);
    println!(
        "Selected {} video(s), total {}",
        downloader.selected_count(),
        format_total_duration(downloader.total_selected_duration())
    );

    if let BatchOutcome::Skipped(reason) = downloader.download_selected().await {
        println!("Nothing downloaded: {:?}", reason);
    }

    // Give the event printer a moment to drain
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    Ok(())
}
