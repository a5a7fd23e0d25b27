mod config;
mod detector;
mod display;
mod handler;
mod selection;

use clap::Parser;
use futures_util::StreamExt;
use tokio::io::AsyncBufReadExt;

#[derive(clap::Parser)]
#[command(about = "Upload images to a plate detection service and show what it finds")]
struct Opts {
    /// Images to run detection on, one after the other.
    images: Vec<std::path::PathBuf>,

    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[arg(short, long, env = "PLATEDETECT_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(short, long, value_enum)]
    format: Option<display::Format>,

    /// Read one image path per line from stdin; an empty line is a
    /// detection with nothing selected.
    #[arg(short, long)]
    interactive: bool,
}

/// Treats every input line as a click: an empty line is a click with nothing
/// selected, anything else a path. Clicks are not waited on before the next
/// line is read, so they can overlap.
async fn run_interactive(
    handler: std::sync::Arc<handler::Handler>,
    input: impl tokio::io::AsyncBufRead + Unpin,
) -> Result<bool, anyhow::Error> {
    let mut lines = input.lines();
    let mut pending = futures_util::stream::FuturesUnordered::new();
    let mut ok = true;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = if let Some(line) = line? {
                    line.trim().to_owned()
                } else {
                    break;
                };
                let handler = handler.clone();
                pending.push(tokio::spawn(async move {
                    let path = if line.is_empty() {
                        None
                    } else {
                        Some(std::path::PathBuf::from(line))
                    };
                    handler.trigger_path(path.as_deref()).await
                }));
            }
            Some(outcome) = pending.next(), if !pending.is_empty() => {
                ok &= outcome? == handler::Outcome::Done;
            }
        }
    }

    while let Some(outcome) = pending.next().await {
        ok &= outcome? == handler::Outcome::Done;
    }
    Ok(ok)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_module("platedetect", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let opts = Opts::parse();

    let mut config = config::Config::load(opts.config.as_deref())?;
    config.apply_overrides(opts.endpoint, opts.format);
    log::info!("using {:?}", config);

    let client = detector::Client::new(config.endpoint.clone(), config.request_timeout())?;
    let terminal = std::sync::Arc::new(display::Terminal::new());
    let handler = std::sync::Arc::new(handler::Handler::new(
        Box::new(client),
        terminal.clone(),
        config.format,
        config.overlap,
    ));

    let ok = if opts.interactive {
        run_interactive(handler, tokio::io::BufReader::new(tokio::io::stdin())).await?
    } else if opts.images.is_empty() {
        handler.trigger_path(None).await == handler::Outcome::Done
    } else {
        let mut ok = true;
        for image in opts.images.iter() {
            ok &= handler.trigger_path(Some(image)).await == handler::Outcome::Done;
        }
        ok
    };

    log::info!("last status: {:?}", terminal.snapshot().status);

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_flag() {
        let opts = Opts::try_parse_from(["platedetect", "--endpoint", "http://cli:2/detect", "car.jpg"]).unwrap();
        assert_eq!(opts.endpoint.as_deref(), Some("http://cli:2/detect"));
        assert_eq!(opts.images, vec![std::path::PathBuf::from("car.jpg")]);

        let mut config: config::Config = "endpoint = \"http://file:1/detect\"".parse().unwrap();
        config.apply_overrides(opts.endpoint, opts.format);
        assert_eq!(config.endpoint, "http://cli:2/detect");
    }

    #[test]
    fn test_endpoint_env() {
        std::env::set_var("PLATEDETECT_ENDPOINT", "http://env:3/detect");
        let opts = Opts::try_parse_from(["platedetect", "-f", "plates"]);
        std::env::remove_var("PLATEDETECT_ENDPOINT");

        let opts = opts.unwrap();
        assert_eq!(opts.endpoint.as_deref(), Some("http://env:3/detect"));
        assert_eq!(opts.format, Some(display::Format::Plates));
    }

    /// Counts calls and the most detections seen waiting at once.
    struct Overlapping {
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        active: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        max_active: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl detector::Detector for Overlapping {
        async fn detect(&self, _file: &selection::SelectedFile) -> Result<detector::Response, anyhow::Error> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let now = self.active.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            self.active.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            Ok(detector::Response::new(serde_json::json!({"count": 1})))
        }
    }

    #[tokio::test]
    async fn test_interactive_lines_are_clicks() {
        let dir = std::env::temp_dir();
        let first = dir.join(format!("platedetect-interactive-a-{}.jpg", std::process::id()));
        let second = dir.join(format!("platedetect-interactive-b-{}.jpg", std::process::id()));
        tokio::fs::write(&first, b"a").await.unwrap();
        tokio::fs::write(&second, b"b").await.unwrap();

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let max_active = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let slots = std::sync::Arc::new(display::Slots::default());
        let handler = std::sync::Arc::new(handler::Handler::new(
            Box::new(Overlapping {
                calls: calls.clone(),
                active: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
                max_active: max_active.clone(),
            }),
            slots.clone(),
            display::Format::Json,
            handler::OverlapPolicy::Race,
        ));

        let input = format!("{}\n\n{}\n", first.display(), second.display());
        let ok = run_interactive(handler, std::io::Cursor::new(input.into_bytes())).await.unwrap();

        // The empty line is a click without a selection.
        assert!(!ok);
        assert_eq!(slots.snapshot().alerts, vec![handler::SELECT_IMAGE.to_owned()]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(max_active.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(slots.snapshot().status, handler::DONE);

        tokio::fs::remove_file(&first).await.unwrap();
        tokio::fs::remove_file(&second).await.unwrap();
    }

    #[tokio::test]
    async fn test_interactive_all_done() {
        let path = std::env::temp_dir().join(format!("platedetect-interactive-ok-{}.jpg", std::process::id()));
        tokio::fs::write(&path, b"a").await.unwrap();

        let slots = std::sync::Arc::new(display::Slots::default());
        let handler = std::sync::Arc::new(handler::Handler::new(
            Box::new(Overlapping {
                calls: Default::default(),
                active: Default::default(),
                max_active: Default::default(),
            }),
            slots.clone(),
            display::Format::Json,
            handler::OverlapPolicy::Race,
        ));

        let input = format!("{}\n", path.display());
        assert!(run_interactive(handler, std::io::Cursor::new(input.into_bytes())).await.unwrap());
        assert!(slots.snapshot().alerts.is_empty());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
