//! wavescope-inspect - headless session diagnostics
//!
//! Loads an envelope (JSON or `.dat`) and an optional annotation payload,
//! builds a session without a display and logs what the viewports and
//! overlays would show.
//!
//! ```text
//! wavescope-inspect <envelope.(json|dat)> [annotations.json] [--width N] [--config PATH]
//! ```
//!
//! Set RUST_LOG=debug for per-resample traces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use wavescope_core::config::{default_config_path, load_config, ViewerConfig};
use wavescope_core::payload::AnnotationPayload;
use wavescope_core::{Envelope, Session, SessionOptions, Viewport, ViewportKind};

const DEFAULT_WIDTH: u32 = 1000;

struct Args {
    envelope: PathBuf,
    annotations: Option<PathBuf>,
    width: u32,
    config: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut width = DEFAULT_WIDTH;
    let mut config = default_config_path();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--width" => {
                let value = args.next().context("--width needs a value")?;
                width = value
                    .parse()
                    .with_context(|| format!("invalid --width {:?}", value))?;
            }
            "--config" => {
                config = PathBuf::from(args.next().context("--config needs a path")?);
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    let Some(envelope) = positional.next() else {
        bail!("usage: wavescope-inspect <envelope.(json|dat)> [annotations.json] [--width N] [--config PATH]");
    };
    Ok(Args {
        envelope,
        annotations: positional.next(),
        width,
        config,
    })
}

fn load_envelope(path: &Path) -> Result<Envelope> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read envelope {:?}", path))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let envelope = if is_json {
        let text = String::from_utf8(bytes).context("Envelope JSON is not UTF-8")?;
        Envelope::from_json(&text)
    } else {
        Envelope::from_dat(&bytes)
    };
    envelope.with_context(|| format!("Failed to decode envelope {:?}", path))
}

fn load_annotations(path: &Path) -> Result<AnnotationPayload> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read annotations {:?}", path))?;
    AnnotationPayload::from_json(&text).with_context(|| format!("Failed to parse annotations {:?}", path))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;
    let config: ViewerConfig = load_config(&args.config);

    let envelope = load_envelope(&args.envelope)?;
    log::info!(
        "envelope: {} entries, {} samples/entry, {} Hz, {:.2}s",
        envelope.len(),
        envelope.base_scale(),
        envelope.sample_rate(),
        envelope.duration()
    );

    let options = SessionOptions::with_width(args.width, &config);
    let session = Session::new(Arc::new(envelope), config, options).context("Failed to create session")?;

    {
        let overview = session.overview();
        log::info!(
            "overview: scale {:.0} samples/px, {} columns",
            overview.current_view().scale(),
            overview.current_view().len()
        );
        let zoom = session.zoomview();
        let frame = zoom.frame();
        log::info!(
            "zoomview: level {} (scale {:.0}), frame {:.2}s..{:.2}s, {} axis ticks",
            zoom.zoom_level(),
            zoom.scale(),
            frame.start_time(),
            frame.end_time(),
            zoom.surface().ticks().len()
        );
    }

    if let Some(path) = &args.annotations {
        let payload = load_annotations(path)?;
        if !payload.skipped.is_empty() {
            log::warn!("annotations: skipped features {:?}", payload.skipped);
        }
        session.load_payload(&payload);

        let layer = session.annotations();
        log::info!(
            "zoomview overlays: {} segments, {} tags in {} clusters, {} keywords visible",
            layer.segments().store().visible_count(ViewportKind::ZoomView),
            layer.tags().store().visible_count(ViewportKind::ZoomView),
            layer.tags().cluster_count(),
            layer.keywords().store().visible_count(ViewportKind::ZoomView)
        );
        if !layer.speakers().speakers().is_empty() {
            log::info!("speakers: {:?}", layer.speakers().speakers());
        }
    }

    Ok(())
}
