use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use qr_stylist::{
    AnimationConfig, AnimationDirection, AnimationType, ErrorCorrectionLevel, ExportOptions,
    QrCodeGenerator, RenderConfig, Shape,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qr-stylist", version, about = "Render styled QR codes")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a styled PNG.
    Png(RenderArgs),
    /// Serialize an unstyled SVG.
    Svg(RenderArgs),
    /// Print the effective render profile as JSON.
    Profile(StyleArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Text or URL to encode.
    text: String,

    /// Output file.
    #[arg(short, long)]
    out: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// JSON render profile. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Quiet zone in modules.
    #[arg(long)]
    margin: Option<u32>,

    #[arg(long, value_enum, ignore_case = true)]
    level: Option<ErrorCorrectionLevel>,

    #[arg(long, value_enum)]
    shape: Option<Shape>,

    /// Dark module color (#rrggbb).
    #[arg(long)]
    dark: Option<String>,

    /// Light module color (#rrggbb).
    #[arg(long)]
    light: Option<String>,

    /// Visual complexity, 1-10.
    #[arg(long)]
    complexity: Option<u8>,

    /// Logo file, data URI or inline SVG.
    #[arg(long)]
    logo: Option<String>,

    /// Animation frame to render at the given timestamp (ms).
    #[arg(long, requires = "animation")]
    at: Option<f64>,

    #[arg(long, value_enum)]
    animation: Option<AnimationType>,

    /// Reveal order of an animated frame.
    #[arg(long, value_enum, requires = "animation")]
    direction: Option<AnimationDirection>,

    /// Keep colors exactly as given.
    #[arg(long)]
    no_smart_colors: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Png(args) => cmd_png(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Profile(style) => {
            let config = build_config(&style)?;
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
    }
}

fn cmd_png(args: RenderArgs) -> anyhow::Result<()> {
    let config = build_config(&args.style)?;
    let generator = match args.style.at {
        Some(at) => QrCodeGenerator::new().with_clock(qr_stylist::FixedClock(at)),
        None => QrCodeGenerator::new(),
    };
    ensure_parent(&args.out)?;
    generator
        .export_png(&args.text, &config, &ExportOptions::to_file(&args.out))
        .with_context(|| format!("render '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_svg(args: RenderArgs) -> anyhow::Result<()> {
    let config = build_config(&args.style)?;
    ensure_parent(&args.out)?;
    QrCodeGenerator::new()
        .export_svg(&args.text, &config, &ExportOptions::to_file(&args.out))
        .with_context(|| format!("serialize '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn build_config(style: &StyleArgs) -> anyhow::Result<RenderConfig> {
    let mut config = match &style.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("open profile '{}'", path.display()))?;
            RenderConfig::from_json(&json).with_context(|| "parse profile JSON")?
        }
        None => RenderConfig::new(),
    };

    if let Some(size) = style.size {
        config.size = size;
    }
    if let Some(margin) = style.margin {
        config.margin = margin;
    }
    if let Some(level) = style.level {
        config.error_correction_level = level;
    }
    if let Some(shape) = style.shape {
        config.shape = shape;
    }
    if let Some(dark) = &style.dark {
        config.color.dark = dark.clone();
    }
    if let Some(light) = &style.light {
        config.color.light = light.clone();
    }
    if let Some(complexity) = style.complexity {
        config.complexity = complexity;
    }
    if let Some(logo) = &style.logo {
        config = config.with_logo(logo.clone(), None);
    }
    if let Some(kind) = style.animation {
        let mut animation = AnimationConfig::new(kind);
        if let Some(direction) = style.direction {
            animation.direction = direction;
        }
        config.animation = Some(animation);
    }
    if style.no_smart_colors {
        config.smart_gradient = false;
    }

    config.validate()?;
    Ok(config)
}

fn ensure_parent(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
