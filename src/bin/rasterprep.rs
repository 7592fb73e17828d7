use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rasterprep::{
    ByteBudget, DisplayMapping, NamedAsset, OutputFormat, PipelineConfig, SeedStrategy, Transform,
};

#[derive(Parser, Debug)]
#[command(name = "rasterprep", version)]
struct Cli {
    /// Pipeline config JSON; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop to the nearest supported aspect ratio and write a JPEG.
    Normalize(NormalizeArgs),
    /// Remove the background and crop tightly; writes a PNG.
    Sticker(StickerArgs),
    /// Letterbox and encode under a byte budget.
    Transcode(TranscodeArgs),
    /// Draw an overlay onto a background at a display-space transform; writes a PNG.
    Composite(CompositeArgs),
    /// Build a sticker pack archive from `name=path` pairs.
    Pack(PackArgs),
}

#[derive(Parser, Debug)]
struct NormalizeArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Longest side of the output.
    #[arg(long)]
    max_dim: Option<u32>,
}

#[derive(Parser, Debug)]
struct StickerArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Background colour distance from white.
    #[arg(long)]
    threshold: Option<u8>,

    /// Seed the fill from the four corners only.
    #[arg(long)]
    corners: bool,

    /// Minimum alpha counted as content when cropping.
    #[arg(long)]
    alpha_threshold: Option<u8>,

    /// Padding per side as a fraction of the longest content side.
    #[arg(long)]
    padding: Option<f64>,
}

#[derive(Parser, Debug)]
struct TranscodeArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Byte ceiling.
    #[arg(long)]
    budget: Option<usize>,

    /// `webp`, `jpeg` or `png`.
    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Overlay image.
    #[arg(long)]
    overlay: PathBuf,

    /// JSON with `transform` and optional `mapping`.
    #[arg(long)]
    transform: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PackArgs {
    /// Output ZIP path.
    #[arg(long)]
    out: PathBuf,

    /// Assets as `name=path`.
    #[arg(required = true)]
    assets: Vec<String>,
}

#[derive(serde::Deserialize, Debug)]
struct PlacementFile {
    transform: Transform,
    #[serde(default)]
    mapping: DisplayMapping,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.cmd {
        Command::Normalize(args) => cmd_normalize(cfg, args),
        Command::Sticker(args) => cmd_sticker(cfg, args),
        Command::Transcode(args) => cmd_transcode(cfg, args),
        Command::Composite(args) => cmd_composite(cfg, args),
        Command::Pack(args) => cmd_pack(cfg, args),
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn decode_path(path: &Path) -> anyhow::Result<rasterprep::RasterBuffer> {
    let bytes = read_input(path)?;
    rasterprep::decode_image(&bytes).with_context(|| format!("decode '{}'", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_normalize(mut cfg: PipelineConfig, args: NormalizeArgs) -> anyhow::Result<()> {
    if let Some(max_dim) = args.max_dim {
        cfg.normalize.max_dimension = max_dim;
    }
    let bytes = read_input(&args.in_path)?;
    let prepared = rasterprep::prepare_for_model(&bytes, &cfg.normalize)
        .with_context(|| format!("normalize '{}'", args.in_path.display()))?;
    write_output(&args.out, &prepared.bytes)?;
    println!(
        "{} {}x{}",
        prepared.aspect_ratio, prepared.width, prepared.height
    );
    Ok(())
}

fn cmd_sticker(mut cfg: PipelineConfig, args: StickerArgs) -> anyhow::Result<()> {
    if let Some(t) = args.threshold {
        cfg.isolate.threshold = t;
    }
    if args.corners {
        cfg.isolate.seeds = SeedStrategy::Corners;
    }
    if let Some(t) = args.alpha_threshold {
        cfg.crop.alpha_threshold = t;
    }
    if let Some(p) = args.padding {
        cfg.crop.padding_ratio = p;
    }
    cfg.validate()?;

    let buffer = decode_path(&args.in_path)?;
    let sticker = rasterprep::prepare_sticker(buffer, &cfg)?;
    let png = rasterprep::encode_png(&sticker)?;
    write_output(&args.out, &png)?;
    println!("{}x{}", sticker.width(), sticker.height());
    Ok(())
}

fn cmd_transcode(mut cfg: PipelineConfig, args: TranscodeArgs) -> anyhow::Result<()> {
    let opts = &mut cfg.transcode;
    if let Some(w) = args.width {
        opts.target_width = w;
    }
    if let Some(h) = args.height {
        opts.target_height = h;
    }
    if let Some(b) = args.budget {
        opts.budget = ByteBudget(b);
    }
    if let Some(f) = args.format {
        opts.format = f;
    }

    let buffer = decode_path(&args.in_path)?;
    let encoded = rasterprep::encode_under_budget(&buffer, opts)?;
    write_output(&args.out, &encoded.bytes)?;
    if !encoded.budget_met {
        eprintln!(
            "warning: {} bytes exceeds budget of {} bytes at floor quality",
            encoded.len(),
            opts.budget.bytes()
        );
    }
    println!("quality {:.2} size {}", encoded.quality(), encoded.len());
    Ok(())
}

fn cmd_composite(cfg: PipelineConfig, args: CompositeArgs) -> anyhow::Result<()> {
    let placement_json = std::fs::read_to_string(&args.transform)
        .with_context(|| format!("read '{}'", args.transform.display()))?;
    let placement: PlacementFile =
        serde_json::from_str(&placement_json).with_context(|| "parse transform JSON")?;

    let background = decode_path(&args.background)?;
    let overlay = decode_path(&args.overlay)?;
    let out = rasterprep::composite(
        background,
        &overlay,
        &placement.transform,
        &placement.mapping,
        &cfg.composite,
    )?;
    let png = rasterprep::encode_png(&out)?;
    write_output(&args.out, &png)
}

fn cmd_pack(cfg: PipelineConfig, args: PackArgs) -> anyhow::Result<()> {
    let mut assets = Vec::with_capacity(args.assets.len());
    for pair in &args.assets {
        let (name, path) = pair
            .split_once('=')
            .with_context(|| format!("asset '{pair}' is not of the form name=path"))?;
        assets.push(NamedAsset::new(name, decode_path(Path::new(path))?));
    }

    let packed = rasterprep::pack(&assets, &cfg.pack)?;
    write_output(&args.out, &packed.bytes)?;
    for entry in &packed.entries {
        println!("{} {}", entry.path, entry.len);
    }
    for failure in &packed.failures {
        eprintln!("skipped {} ({}): {}", failure.index, failure.name, failure.reason);
    }
    Ok(())
}
