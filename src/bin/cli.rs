use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use webcam_recorder::platform::synthetic::synthetic_chunk;
use webcam_recorder::platform::{DirectorySaver, SyntheticDevices};
use webcam_recorder::{
    AspectRatio, DimensionSpec, RecordingSummary, WebcamConfig, WebcamController,
};

fn main() -> Result<()> {
    webcam_recorder::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: webcam-cli <record|dimensions|config> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "record" => cmd_record(&args),
        "dimensions" => cmd_dimensions(&args),
        "config" => cmd_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn cmd_record(args: &[String]) -> Result<()> {
    // record [--chunks <n>] [--chunk-size <bytes>] [--name <file>] [--dir <path>]
    //        [--config <path>] [--audio] [--json]
    let config = match flag_value(args, "--config") {
        Some(path) => WebcamConfig::load_from_file(path)?,
        None => WebcamConfig::load_or_default(),
    };
    config.validate().map_err(|e| anyhow!(e))?;

    let chunks: usize = flag_value(args, "--chunks").unwrap_or("5").parse()?;
    let chunk_size: usize = flag_value(args, "--chunk-size").unwrap_or("4096").parse()?;
    let name = flag_value(args, "--name")
        .unwrap_or(config.storage.default_file_name.as_str())
        .to_string();
    let dir = flag_value(args, "--dir")
        .unwrap_or(config.storage.download_directory.as_str())
        .to_string();
    let json = args.iter().any(|a| a == "--json");

    let mut options = config.capture_options();
    if args.iter().any(|a| a == "--audio") {
        options.request_audio = true;
    }

    let devices = SyntheticDevices::new().with_mime_type(config.recording.mime_type.clone());
    let feed = devices.feed();

    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(async move {
        let controller = WebcamController::builder(Arc::new(devices))
            .options(options)
            .file_saver(Arc::new(DirectorySaver::new(&dir)))
            .indicator_period(config.indicator_period())
            .build();

        controller.acquire().await?;
        println!("Preview: {}", controller.resolved_dimensions());

        controller.start()?;
        for i in 0..chunks {
            tokio::time::sleep(Duration::from_millis(100)).await;
            feed.push(synthetic_chunk(chunk_size, i as u8));
            if let Some(frame) = controller.indicator_frame() {
                let dot = if frame.dot_visible { "*" } else { " " };
                println!("{} {} ({} chunks)", frame.label, dot, controller.chunk_count());
            }
        }
        controller.stop();

        let video = controller.download(&name)?;
        let summary = RecordingSummary::from(&video);

        if json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!(
                "Saved {} bytes ({} chunks, {}) to {}",
                summary.size_bytes, summary.chunk_count, summary.mime_type, dir
            );
        }
        controller.release();
        Ok::<(), anyhow::Error>(())
    })
}

fn cmd_dimensions(args: &[String]) -> Result<()> {
    // dimensions [--width <px>] [--height <px>] [--ratio <16:9|name|decimal>] [--json]
    let mut spec = DimensionSpec::new();
    if let Some(width) = flag_value(args, "--width") {
        spec = spec.with_width(width.parse()?);
    }
    if let Some(height) = flag_value(args, "--height") {
        spec = spec.with_height(height.parse()?);
    }
    if let Some(ratio) = flag_value(args, "--ratio") {
        let parsed =
            AspectRatio::parse(ratio).ok_or_else(|| anyhow!("invalid aspect ratio: {}", ratio))?;
        spec = spec.with_aspect_ratio(parsed);
    }

    let resolved = spec.resolve();
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string(&resolved)?);
    } else {
        println!("{}", resolved);
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> Result<()> {
    // config [--path <file>] [--init]
    let path = flag_value(args, "--path")
        .map(Into::into)
        .unwrap_or_else(WebcamConfig::default_path);

    if args.iter().any(|a| a == "--init") {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        WebcamConfig::default().save_to_file(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = WebcamConfig::load_from_file(&path)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
