use std::{
    collections::BTreeSet,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "trailfx", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a session and dump the animator command log as JSON.
    Replay(ReplayArgs),
    /// Render a single instant of a session as a PNG.
    Frame(FrameArgs),
    /// Render a whole session as numbered PNG frames.
    Frames(FramesArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input session JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path for the command log (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input session JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time to sample, in milliseconds from mount.
    #[arg(long)]
    at: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Display height of trail images, in pixels.
    #[arg(long, default_value_t = 192.0)]
    image_height: f64,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input session JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Display height of trail images, in pixels.
    #[arg(long, default_value_t = 192.0)]
    image_height: f64,
}

#[derive(serde::Serialize)]
struct ReplayLog<'a> {
    report: &'a trailfx::ReplayReport,
    commands: &'a [trailfx::AnimatorCommand],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_session(path: &Path) -> anyhow::Result<trailfx::Session> {
    trailfx::Session::from_path(path).with_context(|| format!("load session '{}'", path.display()))
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let session = read_session(&args.in_path)?;
    let (recorder, report) = session.replay(trailfx::RecordingAnimator::new())?;

    let log = ReplayLog {
        report: &report,
        commands: &recorder.commands,
    };
    match &args.out {
        Some(out) => {
            ensure_parent_dir(out)?;
            let f = std::fs::File::create(out)
                .with_context(|| format!("create '{}'", out.display()))?;
            serde_json::to_writer_pretty(f, &log).context("write replay log")?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &log).context("write replay log")?;
            writeln!(stdout)?;
        }
    }
    eprintln!(
        "{} triggers, {} dropped, ended at {} ms",
        report.triggers.len(),
        report.dropped,
        report.end.0
    );
    Ok(())
}

struct Prepared {
    session: trailfx::Session,
    timeline: trailfx::SceneTimeline,
    store: trailfx::ImageStore,
}

fn prepare(in_path: &Path) -> anyhow::Result<Prepared> {
    let session = read_session(in_path)?;
    let (timeline, _report) = session.replay(trailfx::SceneTimeline::new())?;

    // Everything the session ever shows, initial sequence and later updates alike.
    let refs: Vec<trailfx::ImageRef> = session
        .images
        .iter()
        .chain(session.updates.iter().flat_map(|u| u.images.iter()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let root = in_path.parent().unwrap_or_else(|| Path::new("."));
    let store = trailfx::ImageStore::preload(&refs, root, |p| {
        tracing::info!(loaded = p.loaded, total = p.total, "loading images: {}%", p.percent);
    });

    Ok(Prepared {
        session,
        timeline,
        store,
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let prepared = prepare(&args.in_path)?;
    let settings = trailfx::RenderSettings {
        image_height: args.image_height,
        ..trailfx::RenderSettings::default()
    };
    let scene = prepared.timeline.sample(trailfx::TimeMs(args.at));
    let frame = trailfx::render_scene(prepared.session.canvas, &scene, &prepared.store, &settings)?;
    write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be > 0");
    }
    let prepared = prepare(&args.in_path)?;
    let settings = trailfx::RenderSettings {
        image_height: args.image_height,
        ..trailfx::RenderSettings::default()
    };
    let fps = u64::from(args.fps);
    let end_ms = prepared.session.end_time().0;
    // Frame i is sampled at i * 1000 / fps, so keep one frame of headroom.
    let Some(scaled) = end_ms.checked_mul(fps).and_then(|v| v.checked_add(1000)) else {
        anyhow::bail!("session end {end_ms} ms at {fps} fps is too long to export");
    };
    let count = scaled / 1000;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    (0..count).into_par_iter().try_for_each(|i| {
        let at = trailfx::TimeMs(i * 1000 / fps);
        let scene = prepared.timeline.sample(at);
        let frame =
            trailfx::render_scene(prepared.session.canvas, &scene, &prepared.store, &settings)?;
        write_png(&args.out_dir.join(format!("frame_{i:05}.png")), &frame)
    })?;

    eprintln!("wrote {count} frames to {}", args.out_dir.display());
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

// Frames are composited over an opaque background, so premultiplied and
// straight alpha coincide and the buffer can be written as-is.
fn write_png(path: &Path, frame: &trailfx::FrameRGBA) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
