//! Example: Resolve the audio-only stream of a video page
//!
//! Run with: cargo run -p pmobilibili --example resolve_audio -- https://www.bilibili.com/video/BV1GJ411x7h7

use pmobilibili::{BilibiliClient, MediaLocator};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let page_url = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.bilibili.com/video/BV1GJ411x7h7".to_string());

    let locator = MediaLocator::from_url(&page_url)?;
    println!("Media: {} (part {:?})", locator.media_id, locator.sub_part);

    let client = BilibiliClient::new().await?;

    let info = client.video_info(&locator.media_id).await?;
    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    for part in &info.pages {
        println!(
            "  - p{} {} ({}s)",
            part.page.unwrap_or_default(),
            part.part.as_deref().unwrap_or(""),
            part.duration.unwrap_or_default()
        );
    }

    let stream_id = info.stream_id_for(locator.sub_part)?;
    println!("Stream id: {}", stream_id);

    let audio = client
        .resolve_audio_source(&locator.media_id, &stream_id, client.fnval())
        .await?;
    println!("Audio: {}", audio);

    Ok(())
}
