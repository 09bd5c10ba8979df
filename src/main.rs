use anyhow::Result;
use clap::Parser;
use snapsend::models::{Config, ImageSource, UploadRequest};
use snapsend::notify::{LogNotifier, Notifier};
use snapsend::staging::{detect_image_mime, ImageStager};
use snapsend::upload::UploadService;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MISSING_INPUT: &str = "Please enter text, URL, and select/take a picture";

#[derive(Debug, Parser)]
#[command(name = "snapsend")]
#[command(about = "Upload a text message and an image as a multipart POST")]
struct CliArgs {
    /// Destination URL. Falls back to UPLOAD_URL.
    #[arg(long)]
    url: Option<String>,

    /// Text sent in the `text` field.
    #[arg(long, short)]
    message: Option<String>,

    /// Filename reported for the image part.
    #[arg(long)]
    display_name: Option<String>,

    /// Send the detected image type instead of `image/*`.
    #[arg(long)]
    sniff_type: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Image file to upload, or `-` to read it from stdin.
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,
}

fn resolve_inputs(args: &CliArgs, config: &Config) -> Option<(String, String, PathBuf)> {
    let url = args
        .url
        .clone()
        .or_else(|| config.default_url.clone())
        .filter(|url| !url.is_empty())?;
    let message = args.message.clone().filter(|message| !message.is_empty())?;
    let image = args.image.clone()?;
    Some((url, message, image))
}

async fn stage(stager: &ImageStager, image: &Path, display_name: Option<&str>) -> Result<ImageSource> {
    if image == Path::new("-") {
        let mut bytes = Vec::new();
        tokio::io::stdin().read_to_end(&mut bytes).await?;
        Ok(stager.stage_bytes(&bytes, display_name).await?)
    } else {
        Ok(stager.stage_file(image, display_name).await?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapsend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;

    let Some((url, message, image)) = resolve_inputs(&args, &config) else {
        error!("{}", MISSING_INPUT);
        std::process::exit(1);
    };

    let stager = ImageStager::new(&config.cache_dir)?;
    let mut source = stage(&stager, &image, args.display_name.as_deref()).await?;
    if args.sniff_type {
        if let Some(mime) = detect_image_mime(&source.read_bytes().await?) {
            info!("Detected image type {}", mime);
            source = source.with_content_type(mime);
        }
    }

    let request = match UploadRequest::new(&url, message, source) {
        Ok(request) => request,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let service = UploadService::from_config(&config)?;
    let outcome = service.submit_channel(request)?.await?;

    LogNotifier.notify(&outcome);
    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("snapsend").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_resolve_inputs_complete() {
        let args = args(&["--url", "http://10.0.2.2:3000/", "-m", "hello", "pic.jpg"]);
        let (url, message, image) = resolve_inputs(&args, &Config::default()).unwrap();

        assert_eq!(url, "http://10.0.2.2:3000/");
        assert_eq!(message, "hello");
        assert_eq!(image, PathBuf::from("pic.jpg"));
    }

    #[test]
    fn test_resolve_inputs_uses_configured_url() {
        let config = Config {
            default_url: Some("http://upload.local/".to_string()),
            ..Config::default()
        };
        let (url, _, _) = resolve_inputs(&args(&["-m", "hi", "-"]), &config).unwrap();
        assert_eq!(url, "http://upload.local/");
    }

    #[test]
    fn test_resolve_inputs_requires_everything() {
        let config = Config::default();
        assert!(resolve_inputs(&args(&["-m", "hi", "pic.jpg"]), &config).is_none());
        assert!(resolve_inputs(&args(&["--url", "http://x/", "pic.jpg"]), &config).is_none());
        assert!(resolve_inputs(&args(&["--url", "http://x/", "-m", "", "pic.jpg"]), &config).is_none());
        assert!(resolve_inputs(&args(&["--url", "http://x/", "-m", "hi"]), &config).is_none());
    }
}
