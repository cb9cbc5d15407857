use ffcompress::{Bitrate, Error, Ffmpeg, Ffprobe};
use std::fs;
use std::path::PathBuf;

/// These integration tests need a real `ffmpeg` (and `ffprobe`) in PATH or
/// named by `FFMPEG_BINARY` / `FFPROBE_BINARY`, plus a short H.264/AAC clip
/// at `tests/sample_video/sample.mp4`.
///
/// To run them, use: `cargo test -- --ignored`
fn sample() -> Option<PathBuf> {
    let input = PathBuf::from("tests/sample_video/sample.mp4");
    if input.exists() {
        Some(input)
    } else {
        println!(
            "Skipping integration test: Sample video not found at 'tests/sample_video/sample.mp4'."
        );
        None
    }
}

#[tokio::test]
#[ignore]
async fn test_status_with_nonexistent_input_file() {
    let ffmpeg = match Ffmpeg::new().await {
        Ok(ffmpeg) => ffmpeg,
        Err(_) => {
            println!("Skipping integration test: ffmpeg not found.");
            return;
        }
    };

    let output_path = std::env::temp_dir().join("ffcompress_test_missing_input.mp4");
    let _ = fs::remove_file(&output_path);

    let job = ffmpeg.job("this_file_definitely_does_not_exist.mp4", &output_path);

    // status() spawns ffmpeg regardless and reports its raw exit status
    let status = job.status().await.expect("Spawning ffmpeg should not fail.");
    assert!(!status.success(), "ffmpeg should have failed due to a non-existent input file.");
    assert!(!output_path.exists());

    // run() refuses before spawning
    let err = job.run().await.unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
}

#[tokio::test]
#[ignore]
async fn test_compress_hits_target_bitrate() {
    let (Ok(ffmpeg), Ok(ffprobe)) = (Ffmpeg::new().await, Ffprobe::new()) else {
        println!("Skipping integration test: ffmpeg/ffprobe not found.");
        return;
    };
    let Some(input) = sample() else { return };

    let output_path = std::env::temp_dir().join("ffcompress_test_target.mp4");
    let target: Bitrate = "1000k".parse().unwrap();

    ffmpeg
        .compress(&input, &output_path, target, "64k".parse().unwrap())
        .await
        .expect("compress should succeed");

    let report = ffprobe.probe(&output_path).await.unwrap();
    let actual = report.video_bitrate().expect("output should have a video bitrate");
    let ratio = actual.kbps() as f64 / target.kbps() as f64;
    assert!((0.5..1.5).contains(&ratio), "got {actual}, wanted about {target}");

    let _ = fs::remove_file(&output_path);
}
