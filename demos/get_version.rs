use ffcompress::Ffmpeg;

#[tokio::main]
async fn main() {
    let ffmpeg = Ffmpeg::new().await.expect("Failed to find ffmpeg");
    println!("ffmpeg version is: {}", ffmpeg.version());
}
