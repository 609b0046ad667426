//! Check for the external decoding tools.

use poise_common::config::AppConfig;
use poise_media::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Poise System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffprobe", config.analysis.ffprobe_bin.as_str()),
        ("ffmpeg", config.analysis.ffmpeg_bin.as_str()),
    ];

    let mut all_ok = true;
    for (role, binary) in tools {
        if command_exists(binary) {
            println!("[OK] {role}: {binary}");
        } else {
            all_ok = false;
            println!("[MISSING] {role}: {binary} not found on PATH");
        }
    }

    println!();
    println!(
        "Cadence: landmarks every {} frames, emotion every {} frames",
        config.analysis.landmark_stride, config.analysis.emotion_stride
    );

    println!();
    if all_ok {
        println!("All required tools are available. Poise is ready.");
    } else {
        println!("Install ffmpeg (which ships ffprobe) or set the binaries in the config file.");
    }

    Ok(())
}
