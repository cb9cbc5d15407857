use ffcompress::{Bitrate, Ffmpeg};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    // Attempt to discover ffmpeg
    let ffmpeg = match Ffmpeg::new().await {
        Ok(ffmpeg) => ffmpeg,
        Err(e) => {
            eprintln!("Error finding ffmpeg: {}", e);
            eprintln!(
                "Please ensure ffmpeg is installed and in your system PATH, or set FFMPEG_BINARY."
            );
            return;
        }
    };

    println!("Found {}", ffmpeg.version());

    // In a real application, these would point to actual video files.
    let input_path = PathBuf::from("input.mp4");
    let output_path = PathBuf::from("output_50-percent.mp4");

    let video: Bitrate = "5650k".parse().expect("valid bitrate");
    let audio: Bitrate = "96k".parse().expect("valid bitrate");

    match ffmpeg.compress(&input_path, &output_path, video, audio).await {
        Ok(path) => println!("Compressed copy written to {}", path.display()),
        Err(e) => eprintln!("Compression failed: {}", e),
    }
}
