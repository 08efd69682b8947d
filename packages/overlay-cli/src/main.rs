use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use overlay_core_wasm::analysis::{analyze_file, tolerance_report, DEFAULT_TOLERANCES};
use overlay_core_wasm::bundle::{
    bundle_overlay, missing_inputs, write_bundle, BundleConfig, BundleOptions, FileSource,
};
use overlay_core_wasm::loader::load_feature_collection;

#[derive(Parser)]
#[command(name = "overlay-bundler", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preprocess every layer of every overlay and write <overlay>.geojson and <overlay>.svg
    Bundle {
        /// Overlay configuration file (JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "./output")]
        output: PathBuf,

        /// License text embedded in the bundle metadata
        #[arg(long, value_name = "FILE", default_value = "LICENSE")]
        license: PathBuf,

        /// Attribution text embedded in the bundle metadata
        #[arg(long, value_name = "FILE", default_value = "ATTRIBUTION.md")]
        attribution: PathBuf,

        /// Process features on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// Print feature counts, geometry types and sizes of GeoJSON files
    Analyze {
        /// Files, or directories whose *.geojson files are analyzed
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Compare point counts and sizes across Douglas-Peucker tolerances
    Tolerances {
        #[arg(value_name = "GEOJSON")]
        geojson: PathBuf,

        /// Tolerance in degrees; repeat for several
        #[arg(short = 't', long = "tolerance", value_name = "TOL")]
        tolerances: Vec<f64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overlay_bundler=info,overlay_core_wasm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Bundle {
            config,
            output,
            license,
            attribution,
            sequential,
        } => run_bundle(&config, &output, &license, &attribution, !sequential),
        Command::Analyze { paths } => run_analyze(&paths),
        Command::Tolerances {
            geojson,
            tolerances,
        } => run_tolerances(&geojson, &tolerances),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run_bundle(
    config_path: &Path,
    output: &Path,
    license: &Path,
    attribution: &Path,
    parallel: bool,
) -> Result<()> {
    let config = BundleConfig::load(config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;
    let base_dir = match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let missing = missing_inputs(&config, &base_dir);
    if !missing.is_empty() {
        let list: Vec<String> = missing
            .iter()
            .map(|path| format!("  {}", path.display()))
            .collect();
        bail!("Missing input files:\n{}", list.join("\n"));
    }

    let options = BundleOptions {
        generated: chrono::Utc::now().to_rfc3339(),
        license: read_optional(license)?,
        attribution: read_optional(attribution)?,
        parallel,
    };
    info!("Output directory: {}", output.display());

    let source = FileSource::new(&base_dir);
    let mut total_features = 0;
    for overlay in &config.overlays {
        let bundle = bundle_overlay(overlay, &source, &options)
            .with_context(|| format!("Failed to bundle overlay '{}'", overlay.name))?;

        for layer in &bundle.layers {
            info!(
                "  {}: {} features, {} -> {} points",
                layer.layer_id,
                layer.summary.kept_features,
                layer.summary.points_before,
                layer.summary.points_after
            );
        }
        info!(
            "  {}: {} bytes, {} bytes deflated",
            overlay.name,
            bundle.byte_size()?,
            bundle.deflate_size()?
        );

        write_bundle(&bundle, output)
            .with_context(|| format!("Failed to write overlay '{}'", overlay.name))?;
        total_features += bundle.feature_count();
    }

    info!(
        "Completed processing {} overlays with {} total features",
        config.overlays.len(),
        total_features
    );
    Ok(())
}

// License and attribution files are optional; absent means empty text
fn read_optional(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("{} not found, leaving it empty", path.display());
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn run_analyze(paths: &[PathBuf]) -> Result<()> {
    let files = geojson_files(paths)?;
    println!("Analyzing {} GeoJSON files:\n", files.len());

    for path in files {
        let stats = analyze_file(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("{}", name);
        println!("  Features: {}", stats.feature_count);
        println!(
            "  Geometry types: {}",
            serde_json::to_string(&stats.geometry_types)?
        );
        println!(
            "  Size: {:.1} KB (uncompressed), {:.1} KB (gzipped)",
            stats.raw_size as f64 / 1024.0,
            stats.gzip_size as f64 / 1024.0
        );
        println!();
    }
    Ok(())
}

// Directories expand to their *.geojson files, sorted by name
fn geojson_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("Failed to list {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "geojson"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn run_tolerances(path: &Path, tolerances: &[f64]) -> Result<()> {
    let collection = load_feature_collection(path)?;
    let tolerances = if tolerances.is_empty() {
        DEFAULT_TOLERANCES.to_vec()
    } else {
        tolerances.to_vec()
    };

    println!("File: {}", path.display());
    println!("Features: {}", collection.features.len());
    println!("Points: {}", collection.point_count());
    println!();
    println!(
        "{:<12} {:<10} {:<10} {:<12} {:<12} {:<12}",
        "Tolerance", "Distance", "Points", "Reduction", "Size (KB)", "Compressed"
    );

    for row in tolerance_report(&collection, &tolerances)? {
        println!(
            "{:<12} {:<10} {:<10} {:<12} {:<12.1} {:<12.1}",
            row.tolerance,
            format!("{:.1}m", row.approx_meters),
            row.points,
            format!("{:.1}%", row.reduction_percent),
            row.json_size as f64 / 1024.0,
            row.deflate_size as f64 / 1024.0
        );
    }
    Ok(())
}
