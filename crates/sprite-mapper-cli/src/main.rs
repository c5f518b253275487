use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use sprite_mapper_core::{
    Atlas, AtlasMapper, ImageRequest, InputImage, MapperConfig, SearchStats, map_batch,
    pack_images_with,
};
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-mapper",
    about = "Map images into one smallest-area texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
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
    /// Map images into an atlas and write the PNG plus metadata
    Pack(PackArgs),
    /// Layout-only export (no PNG): reads image dimensions and writes metadata
    Layout(PackArgs),
    /// Maps seeded random rectangles and prints time, efficiency and search counters
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (present keys override the search options below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Search
    #[command(flatten)]
    search: SearchArgs,

    // Image Processing
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    outlines: bool,

    // Export
    /// Metadata format: json-array | json (alias) | json-hash
    #[arg(long, default_value = "json-array", value_parser = ["json-array", "json", "json-hash"], help_heading = "Export")]
    metadata: String,
    /// Export packing and search stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct SearchArgs {
    /// Widest canvas the search may start from
    #[arg(long, default_value_t = 4096, help_heading = "Search")]
    max_width: u32,
    /// Stop once an atlas reaches this efficiency (0 < e <= 1)
    #[arg(long, default_value_t = 1.0, help_heading = "Search")]
    cutoff: f64,
    /// Stop after this many candidate atlases
    #[arg(long, help_heading = "Search")]
    max_candidates: Option<usize>,
}

impl SearchArgs {
    fn to_config(&self) -> MapperConfig {
        MapperConfig::builder()
            .max_canvas_width(self.max_width)
            .cutoff_efficiency(self.cutoff)
            .max_candidate_atlases(self.max_candidates)
            .build()
    }
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Number of rectangles per job
    #[arg(long, default_value_t = 100)]
    count: usize,
    /// Smallest generated side
    #[arg(long, default_value_t = 8)]
    min_size: u32,
    /// Largest generated side
    #[arg(long, default_value_t = 64)]
    max_size: u32,
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Independent jobs; more than one maps them as a batch (parallel with feature `parallel`)
    #[arg(long, default_value_t = 1)]
    jobs: usize,
    #[command(flatten)]
    search: SearchArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => run_layout(args),
        Commands::Bench(b) => run_bench(b),
    }
}

/// Resolves the mapper config from flags, then the YAML file if given.
fn resolve_config(args: &PackArgs) -> anyhow::Result<MapperConfig> {
    let mut cfg = args.search.to_config();
    if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_mapper_config(cfg);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Prints the merged config when asked; returns true if the command should stop.
fn print_config_if_requested(args: &PackArgs, cfg: &MapperConfig) -> anyhow::Result<bool> {
    if !args.print_config {
        return Ok(false);
    }
    match args.print_config_format.as_str() {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(true)
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = resolve_config(args)?;
    if print_config_if_requested(args, &cfg)? {
        return Ok(());
    }

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    let inputs = load_images_with_progress(&paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");
    if inputs.is_empty() {
        anyhow::bail!("no images found under {}", args.input.display());
    }

    let out = pack_images_with(inputs, cfg, args.outlines)?;
    log_stats(&out.atlas, &out.search);

    if !args.dry_run {
        fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
        let png_path = args.out_dir.join(format!("{}.png", args.name));
        out.rgba
            .save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, "wrote atlas image");
    }
    write_metadata(args, &out.atlas)?;
    export_stats(args, &out.atlas, &out.search)
}

fn run_layout(args: &PackArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(args)?;
    if print_config_if_requested(args, &cfg)? {
        return Ok(());
    }

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    let mut requests = Vec::with_capacity(paths.len());
    for p in &paths {
        match image::image_dimensions(p) {
            Ok((w, h)) => requests.push(ImageRequest::new(path_key(p), w, h)),
            Err(e) => error!(?p, error = %e, "skip image"),
        }
    }
    info!(count = requests.len(), "read image dimensions");
    if requests.is_empty() {
        anyhow::bail!("no images found under {}", args.input.display());
    }

    let outcome = AtlasMapper::new(cfg).map_with_stats(&requests)?;
    log_stats(&outcome.atlas, &outcome.stats);
    write_metadata(args, &outcome.atlas)?;
    export_stats(args, &outcome.atlas, &outcome.stats)
}

fn log_stats(atlas: &Atlas, search: &SearchStats) {
    let stats = atlas.stats();
    info!(
        width = stats.width,
        height = stats.height,
        used_area = stats.used_area,
        canvas_area = stats.canvas_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        trials = search.trials,
        candidates = search.candidates_generated,
        "stats"
    );
}

fn write_metadata(args: &PackArgs, atlas: &Atlas) -> anyhow::Result<()> {
    let json_value = match args.metadata.as_str() {
        // "json" is an alias of "json-array"
        "json-array" | "json" => sprite_mapper_core::to_json_array(atlas),
        "json-hash" => sprite_mapper_core::to_json_hash(atlas),
        other => anyhow::bail!("unknown metadata format: {}", other),
    };
    if args.dry_run {
        return Ok(());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    let json_path = args.out_dir.join(format!("{}.json", args.name));
    let json = serde_json::to_string_pretty(&json_value)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, images = atlas.images.len(), "atlas written");
    Ok(())
}

fn export_stats(args: &PackArgs, atlas: &Atlas, search: &SearchStats) -> anyhow::Result<()> {
    let Some(stats_path) = &args.export_stats else {
        return Ok(());
    };
    let stats = atlas.stats();
    if args.dry_run {
        println!(
            "{} trials={} candidates={}",
            stats.summary(),
            search.trials,
            search.candidates_generated
        );
        return Ok(());
    }
    let value = serde_json::json!({
        "atlas": stats,
        "search": search,
    });
    fs::write(stats_path, serde_json::to_string_pretty(&value)?)
        .with_context(|| format!("write {}", stats_path.display()))?;
    info!(?stats_path, "stats exported");
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    if b.min_size == 0 || b.min_size > b.max_size {
        anyhow::bail!("invalid size range {}..={}", b.min_size, b.max_size);
    }
    let cfg = b.search.to_config();
    cfg.validate()?;

    let mut rng = StdRng::seed_from_u64(b.seed);
    let jobs: Vec<Vec<ImageRequest<usize>>> = (0..b.jobs.max(1))
        .map(|_| {
            (0..b.count)
                .map(|i| {
                    let w = rng.gen_range(b.min_size..=b.max_size);
                    let h = rng.gen_range(b.min_size..=b.max_size);
                    ImageRequest::new(i, w, h)
                })
                .collect()
        })
        .collect();

    if jobs.len() == 1 {
        let start = Instant::now();
        let outcome = AtlasMapper::new(cfg).map_with_stats(&jobs[0])?;
        let dur = start.elapsed();
        println!(
            "size={}x{} efficiency={:.2}% trials={} candidates={} time={}",
            outcome.atlas.width,
            outcome.atlas.height,
            outcome.atlas.efficiency() * 100.0,
            outcome.stats.trials,
            outcome.stats.candidates_generated,
            bench_fmt_dur(dur)
        );
        return Ok(());
    }

    let start = Instant::now();
    let results = map_batch(&jobs, &cfg);
    let dur = start.elapsed();
    let mut efficiency_sum = 0.0;
    for (i, result) in results.into_iter().enumerate() {
        let atlas = result.with_context(|| format!("job {i}"))?;
        efficiency_sum += atlas.efficiency();
    }
    println!(
        "jobs={} mean_efficiency={:.2}% time={}",
        jobs.len(),
        efficiency_sum / jobs.len() as f64 * 100.0,
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_glob_set(include)?;
    let exc_set = build_glob_set(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = path_key(p);
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn path_key(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => list.push(InputImage {
                key: path_key(p),
                image: img,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
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

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    cutoff_efficiency: Option<f64>,
    max_candidate_atlases: Option<usize>,
    max_canvas_width: Option<u32>,
}

impl YamlConfig {
    fn into_mapper_config(self, mut cfg: MapperConfig) -> MapperConfig {
        if let Some(v) = self.cutoff_efficiency {
            cfg.cutoff_efficiency = v;
        }
        if let Some(v) = self.max_candidate_atlases {
            cfg.max_candidate_atlases = Some(v);
        }
        if let Some(v) = self.max_canvas_width {
            cfg.max_canvas_width = v;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_keys_override_flags() {
        let flags = MapperConfig::builder().max_canvas_width(512).build();
        let y: YamlConfig = serde_yaml::from_str("cutoff_efficiency: 0.8\n").unwrap();
        let cfg = y.into_mapper_config(flags);
        assert_eq!(cfg.cutoff_efficiency, 0.8);
        assert_eq!(cfg.max_canvas_width, 512);
        assert_eq!(cfg.max_candidate_atlases, None);
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image(Path::new("a/b/Hero.PNG")));
        assert!(is_image(Path::new("x.jpeg")));
        assert!(!is_image(Path::new("notes.txt")));
    }

    #[test]
    fn exclude_wins_over_include() {
        let inc = build_glob_set(&["**/*.png".into()]).unwrap();
        let exc = build_glob_set(&["**/skip/**".into()]).unwrap();
        assert!(should_skip(Path::new("a/skip/x.png"), inc.as_ref(), exc.as_ref()));
        assert!(!should_skip(Path::new("a/keep/x.png"), inc.as_ref(), exc.as_ref()));
        assert!(should_skip(Path::new("a/keep/x.jpg"), inc.as_ref(), exc.as_ref()));
    }
}
