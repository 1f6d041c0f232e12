use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bezelkit::{
    BezelAssets, BezelId, CatalogIndex, ComposeSession, Orientation, ScreenshotSource,
    SessionOpts, SourceKind, VideoHandle, find_best_match,
};

#[derive(Parser, Debug)]
#[command(name = "bezelkit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the device / color / orientation tree of a catalog.
    List(ListArgs),
    /// Print the bezel that best fits a screenshot size.
    Match(MatchArgs),
    /// Write the screen mask of one bezel as a PNG.
    Mask(MaskArgs),
    /// Place a screenshot, GIF or video inside a bezel.
    Compose(ComposeArgs),
}

#[derive(Args, Debug)]
struct CatalogArg {
    /// Bezel metadata JSON; asset paths resolve against its directory.
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Args, Debug)]
struct BezelArgs {
    /// Device name.
    #[arg(long)]
    device: Option<String>,
    /// Color name (defaults to the device's first color).
    #[arg(long)]
    color: Option<String>,
    /// `portrait` or `landscape` (defaults to the first available).
    #[arg(long, value_parser = parse_orientation)]
    orientation: Option<Orientation>,
}

#[derive(Parser, Debug)]
struct ListArgs {
    #[command(flatten)]
    catalog: CatalogArg,
}

#[derive(Parser, Debug)]
struct MatchArgs {
    #[command(flatten)]
    catalog: CatalogArg,
    /// Screenshot width in pixels.
    #[arg(long)]
    width: u32,
    /// Screenshot height in pixels.
    #[arg(long)]
    height: u32,
    /// Current selection, used to break ties.
    #[command(flatten)]
    bezel: BezelArgs,
}

#[derive(Parser, Debug)]
struct MaskArgs {
    #[command(flatten)]
    catalog: CatalogArg,
    #[command(flatten)]
    bezel: BezelArgs,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    catalog: CatalogArg,
    /// Screenshot, GIF or video file.
    #[arg(long)]
    shot: PathBuf,
    /// Bezel override; auto-matched from the screenshot size when omitted.
    #[command(flatten)]
    bezel: BezelArgs,
    /// Output path (defaults to `screenshot-<device>-<color>-<orientation>.<ext>`).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Treat the input as a video without content sniffing.
    #[arg(long, default_value_t = false)]
    video: bool,
    /// `ffmpeg` executable used for video input.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,
    /// Overwrite output if it already exists (`--overwrite false` refuses).
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Match(args) => cmd_match(args),
        Command::Mask(args) => cmd_mask(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_orientation(s: &str) -> Result<Orientation, String> {
    match s.to_ascii_lowercase().as_str() {
        "portrait" => Ok(Orientation::Portrait),
        "landscape" => Ok(Orientation::Landscape),
        _ => Err(format!("expected 'portrait' or 'landscape', got '{s}'")),
    }
}

fn load_catalog(arg: &CatalogArg) -> anyhow::Result<(CatalogIndex, PathBuf)> {
    let catalog = CatalogIndex::from_path(&arg.catalog)?;
    let root = arg
        .catalog
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    tracing::debug!(entries = catalog.len(), root = %root.display(), "catalog loaded");
    Ok((catalog, root))
}

/// Fill in missing parts of a partial bezel choice from `fallback` and catalog order.
fn resolve_bezel(
    catalog: &CatalogIndex,
    args: &BezelArgs,
    fallback: Option<&BezelId>,
) -> anyhow::Result<Option<BezelId>> {
    if args.device.is_none() && args.color.is_none() && args.orientation.is_none() {
        return Ok(None);
    }
    let device = args
        .device
        .clone()
        .or_else(|| fallback.map(|id| id.device.clone()))
        .context("--device is required when choosing a bezel")?;
    let color = match &args.color {
        Some(c) => c.clone(),
        None => catalog
            .colors(&device)
            .next()
            .with_context(|| format!("device '{device}' is not in the catalog"))?
            .to_string(),
    };
    let orientation = match args.orientation {
        Some(o) => o,
        None => catalog
            .orientations(&device, &color)
            .next()
            .with_context(|| format!("no '{device}' bezel in color '{color}'"))?,
    };
    Ok(Some(BezelId::new(device, color, orientation)))
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let (catalog, _) = load_catalog(&args.catalog)?;
    for device in catalog.devices() {
        println!("{device}");
        for color in catalog.colors(device) {
            let orientations: Vec<&str> = catalog
                .orientations(device, color)
                .map(Orientation::as_str)
                .collect();
            println!("  {color}: {}", orientations.join(", "));
        }
    }
    Ok(())
}

fn cmd_match(args: MatchArgs) -> anyhow::Result<()> {
    let (catalog, _) = load_catalog(&args.catalog)?;
    let current = resolve_bezel(&catalog, &args.bezel, None)?;
    match find_best_match(&catalog, args.width, args.height, current.as_ref()) {
        Some(id) => println!("{id}"),
        None => println!("no match"),
    }
    Ok(())
}

fn cmd_mask(args: MaskArgs) -> anyhow::Result<()> {
    let (catalog, root) = load_catalog(&args.catalog)?;
    let id = resolve_bezel(&catalog, &args.bezel, catalog.default_selection().as_ref())?
        .or_else(|| catalog.default_selection())
        .context("catalog has no bezels")?;
    let entry = catalog
        .lookup(&id)
        .with_context(|| format!("no bezel '{id}' in the catalog"))?;

    let mut assets = BezelAssets::new(root);
    let prepared = assets.prepare(entry)?;
    let rgba = prepared.mask.to_straight_rgba8();

    bezelkit::session::output::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        entry.canvas.width,
        entry.canvas.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let (catalog, root) = load_catalog(&args.catalog)?;
    let mut opts = SessionOpts::with_assets_root(root);
    opts.video.ffmpeg_program = args.ffmpeg;
    opts.video.overwrite = args.overwrite;
    let mut session = ComposeSession::new(catalog, opts);

    let update = if args.video {
        session.set_source(ScreenshotSource::Video(VideoHandle::probe(&args.shot)?))
    } else {
        session.load_source(&args.shot)?
    };
    eprintln!(
        "loaded {:?} {}x{} ({})",
        update.kind,
        update.width,
        update.height,
        Orientation::of_dimensions(update.width, update.height)
    );

    if let Some(id) = resolve_bezel(session.catalog(), &args.bezel, session.selection())? {
        session.select(id)?;
    }
    if let (Some(entry), Some(source)) = (session.selected_entry(), session.source())
        && entry.orientation != source.orientation()
    {
        eprintln!(
            "note: screenshot is {} but the bezel is {}; it will be center-cropped to fill",
            source.orientation(),
            entry.orientation
        );
    }

    if update.kind == SourceKind::Video {
        enable_video(&mut session);
    }

    let report = session.compose()?;
    let out = args.out.unwrap_or_else(|| PathBuf::from(&report.file_name));
    let output = session
        .output()
        .context("compose finished without an output")?;
    bezelkit::session::output::write_output_file(
        &out,
        &output.bytes,
        session.opts().video.overwrite,
    )?;

    eprintln!(
        "wrote {} ({}, {} frame(s), bezel {})",
        out.display(),
        report.mime_type,
        report.frame_count,
        report.bezel
    );
    Ok(())
}

#[cfg(feature = "media-ffmpeg")]
fn enable_video(session: &mut ComposeSession) {
    session.use_ffmpeg();
}

#[cfg(not(feature = "media-ffmpeg"))]
fn enable_video(_session: &mut ComposeSession) {
    tracing::warn!("built without media-ffmpeg; video compositing is unavailable");
}
