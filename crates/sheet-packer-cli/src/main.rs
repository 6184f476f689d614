use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use sheet_packer_core::folder::list_images;
use sheet_packer_core::pipeline::probe_sources;
use sheet_packer_core::{
    AtlasConfig, FolderOptions, FsImageSource, PackerConfig, Progress, extract_frames,
    pack_folder_with, progress_for,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sheet-packer",
    about = "Pack a folder of sprites and grid sheets into one texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress bar while compositing (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a folder into <name>.png and <name>.json
    Pack(PackArgs),
    /// List the frames derived from a folder (sheets sliced) without packing
    Frames(FramesArgs),
}

#[derive(Parser, Debug, Clone)]
struct InputArgs {
    /// Input directory (not searched recursively)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Include patterns (glob, matched against file names). If set, only matching files are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob, matched against file names)
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output directory (created if missing)
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides matching options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Max width
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_height: u32,
    /// Grow the canvas from the smallest size that fits instead of using the maxima
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    smart: bool,
    /// Canvas dimensions are powers of two
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    pot: bool,
    /// Force square canvas
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    square: bool,
    /// Pixels between frames
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    spacing: u32,

    // Export
    /// Indent the JSON manifest
    #[arg(long, default_value_t = false, help_heading = "Export")]
    prettify: bool,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report stats but do not write the atlas
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct FramesArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Print frames as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet, cli.quiet),
        Commands::Frames(args) => run_frames(args),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool, quiet: bool) -> anyhow::Result<()> {
    let mut cfg = atlas_config_from_args(cli);
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_atlas_config(cfg);
    }
    if quiet {
        cfg.log = false;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.validate()?;

    let bar = if show_progress {
        Some(BarProgress::new()?)
    } else {
        None
    };
    let progress: &dyn Progress = match &bar {
        Some(b) => b as &dyn Progress,
        None => progress_for(cfg.log),
    };
    let inc_set = build_globset(&cli.input.include)?;
    let exc_set = build_globset(&cli.input.exclude)?;
    let keep = |p: &Path| !should_skip(p, inc_set.as_ref(), exc_set.as_ref());
    let opts = FolderOptions {
        filter: Some(&keep),
        dry_run: cli.dry_run,
    };
    let out = pack_folder_with(&cli.input.input, &cli.out_dir, &cfg, progress, &opts)
        .with_context(|| format!("pack {} into {}", cli.input.input.display(), cli.out_dir.display()))?;
    if let Some(b) = &bar {
        b.finish();
    }

    let stats = out.canvas.stats();
    info!(
        frames = stats.num_frames,
        sheet_frames = stats.num_sheet_frames,
        used_area = stats.used_frame_area,
        canvas_area = stats.canvas_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );
    if let Some(stats_path) = &cli.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
    }
    Ok(())
}

fn run_frames(cli: &FramesArgs) -> anyhow::Result<()> {
    let paths = gather_paths(&cli.input)?;
    let sources = probe_sources(&paths, &FsImageSource)?;
    let frames = extract_frames(&sources)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
        return Ok(());
    }
    for f in &frames {
        match &f.sheet {
            Some(s) => println!(
                "{}\t{}x{}\t{} [{},{}] of {}x{}",
                f.name, f.width, f.height, s.animation, s.column, s.row, s.columns, s.rows
            ),
            None => println!("{}\t{}x{}", f.name, f.width, f.height),
        }
    }
    info!(count = frames.len(), "frames listed");
    Ok(())
}

fn atlas_config_from_args(cli: &PackArgs) -> AtlasConfig {
    AtlasConfig {
        file_name: cli.name.clone(),
        prettify: cli.prettify,
        log: true,
        pack: PackerConfig::builder()
            .with_max_dimensions(cli.max_width, cli.max_height)
            .smart(cli.smart)
            .pot(cli.pot)
            .square(cli.square)
            .spacing(cli.spacing)
            .build(),
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {}", pat))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(input: &InputArgs) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(&input.include)?;
    let exc_set = build_globset(&input.exclude)?;
    let mut list = list_images(&input.input)?;
    list.retain(|p| !should_skip(p, inc_set.as_ref(), exc_set.as_ref()));
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let name = p
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name: &str = &name;
    if let Some(ex) = exclude {
        if ex.is_match(name) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(name) {
            return true;
        }
    }
    false
}

/// Progress sink drawing compositing batches on an `indicatif` bar.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} [{bar:30}] {pos:>3}% [{elapsed_precise}] {wide_msg}",
        )?);
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Progress for BarProgress {
    fn message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
        info!("{}", msg);
    }

    fn batch_done(&self, _done: usize, _total: usize, percent: u32) {
        self.bar.set_position(percent as u64);
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    file_name: Option<String>,
    prettify: Option<bool>,
    log: Option<bool>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    smart: Option<bool>,
    pot: Option<bool>,
    square: Option<bool>,
    spacing: Option<u32>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> AtlasConfig {
        if let Some(v) = self.file_name {
            cfg.file_name = v;
        }
        if let Some(v) = self.prettify {
            cfg.prettify = v;
        }
        if let Some(v) = self.log {
            cfg.log = v;
        }
        if let Some(v) = self.max_width {
            cfg.pack.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.pack.max_height = v;
        }
        if let Some(v) = self.smart {
            cfg.pack.smart = v;
        }
        if let Some(v) = self.pot {
            cfg.pack.pot = v;
        }
        if let Some(v) = self.square {
            cfg.pack.square = v;
        }
        if let Some(v) = self.spacing {
            cfg.pack.spacing = v;
        }
        cfg
    }
}
