// Downloads whisper.cpp models for a (size, compute type) pair, or Silero VAD models,
// into the directory `subtitler` loads them from.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use subtitler::models::{
    VAD_MODEL_NAMES, VAD_MODELS_BASE_URL, model_file_name, model_url, vad_file_name,
};
use subtitler::{ComputeType, ModelSize};

#[derive(Parser, Debug)]
#[command(name = "model-downloader")]
#[command(about = "Download Whisper and VAD models for subtitler", long_about = None)]
struct Args {
    /// List supported models and exit.
    #[arg(long)]
    list: bool,

    /// Whisper model size to download.
    #[arg(long, value_enum, required_unless_present_any = ["list", "vad"])]
    size: Option<ModelSize>,

    /// Precision of the whisper model.
    #[arg(long = "compute-type", value_enum, default_value_t = ComputeType::Int8)]
    compute_type: ComputeType,

    /// Silero VAD model to download instead (e.g. silero-v6.2.0).
    #[arg(long, conflicts_with = "size")]
    vad: Option<String>,

    /// Target directory to store models (created if missing).
    #[arg(long, env = "SUBTITLER_MODELS_DIR", default_value = "./models")]
    dir: PathBuf,
}

/// A resolved download: what to fetch and what to call it on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Download {
    filename: String,
    url: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print!("{}", model_list_string());
        return Ok(());
    }

    let download = resolve(&args)?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create target dir: {}", args.dir.display()))?;

    let dest_path = args.dir.join(&download.filename);
    if dest_path.exists() {
        println!("already exists: {}", dest_path.display());
        return Ok(());
    }

    println!("downloading {}", download.filename);
    println!("    {}", download.url);

    let client = Client::builder()
        .user_agent("subtitler-model-downloader")
        .build()
        .context("failed to build HTTP client")?;

    download_to_path(&client, &download.url, &dest_path)?;

    println!("saved: {}", dest_path.display());
    Ok(())
}

fn resolve(args: &Args) -> Result<Download> {
    if let Some(name) = args.vad.as_deref() {
        if !VAD_MODEL_NAMES.contains(&name) {
            bail!("unknown VAD model '{name}'. Run with --list to see supported models.");
        }
        let filename = vad_file_name(name);
        return Ok(Download {
            url: format!("{VAD_MODELS_BASE_URL}/{filename}"),
            filename,
        });
    }

    let Some(size) = args.size else {
        bail!("either --size or --vad is required");
    };
    let Some(url) = model_url(size, args.compute_type) else {
        bail!(
            "no published {} weights for '{size}'; convert the model locally and place it at {}, or pick another --compute-type",
            args.compute_type,
            args.dir.join(model_file_name(size, args.compute_type)).display()
        );
    };

    Ok(Download {
        filename: model_file_name(size, args.compute_type),
        url,
    })
}

fn model_list_string() -> String {
    let mut out = String::new();

    out.push_str("Whisper models (--size, --compute-type):\n");
    for size in ModelSize::ALL {
        for compute_type in ComputeType::ALL {
            if model_url(size, compute_type).is_none() {
                continue;
            }
            out.push_str(&format!(
                "  - {size} {compute_type} -> {}\n",
                model_file_name(size, compute_type)
            ));
        }
    }

    out.push('\n');
    out.push_str("VAD models (--vad):\n");
    for name in VAD_MODEL_NAMES {
        out.push_str("  - ");
        out.push_str(name);
        out.push('\n');
    }

    out
}

/// Download a URL into `dest_path` safely:
/// - download to `dest_path.part`
/// - fsync + rename to final path
fn download_to_path(client: &Client, url: &str, dest_path: &Path) -> Result<()> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {url}"))?;

    let total = resp.content_length();
    download_to_path_with_reader(resp, total, dest_path)
}

fn download_to_path_with_reader<R: Read>(
    mut reader: R,
    total_bytes: Option<u64>,
    dest_path: &Path,
) -> Result<()> {
    let pb = match total_bytes {
        Some(total) if total > 0 => ProgressBar::new(total),
        _ => ProgressBar::new_spinner(),
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} {bar:40.cyan/blue} {eta}",
        )
        .context("invalid progress template")?
        .progress_chars("#>-"),
    );

    let tmp_path = part_path(dest_path);

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }

        file.sync_all()?;
        fs::rename(&tmp_path, dest_path)
            .with_context(|| format!("failed to move into place: {}", dest_path.display()))?;
        Ok(())
    })();

    pb.finish_and_clear();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

fn part_path(dest_path: &Path) -> PathBuf {
    let mut s = dest_path.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}
