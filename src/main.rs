use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use metatile_converter::{
    job::load_manifest, ConvertConfig, Converter, Job, JobReport, Result,
};

#[derive(Parser)]
#[command(name = "metatile-converter")]
#[command(about = "Render tilesets and assemble maps from packed metatile data")]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print job reports as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake a 4-bit tile sheet into RGBA using per-tile palettes
    RenderTileset {
        tiles_png: PathBuf,
        palettes_dir: PathBuf,
        metatiles_bin: PathBuf,
        output_png: PathBuf,
        /// Tile indices start at 512
        #[arg(long)]
        secondary: bool,
        /// Also render every metatile to this image
        #[arg(long)]
        metatile_sheet: Option<PathBuf>,
    },
    /// Assemble map.bin into tile layers and cell metadata
    ConvertMap {
        map_bin: PathBuf,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        /// Directory with metatiles.bin and metatile_attributes.bin
        #[arg(long)]
        primary: PathBuf,
        #[arg(long)]
        secondary: Option<PathBuf>,
        #[arg(long)]
        border: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Replace the embedded palette of an indexed image
    ReplacePalette {
        input_png: PathBuf,
        palette: PathBuf,
        output_png: PathBuf,
    },
    /// Run every job of a JSON manifest in parallel
    Batch { manifest: PathBuf },
}

impl Commands {
    fn into_jobs(self) -> Result<Vec<Job>> {
        let job = match self {
            Commands::RenderTileset {
                tiles_png,
                palettes_dir,
                metatiles_bin,
                output_png,
                secondary,
                metatile_sheet,
            } => Job::Tileset {
                tiles_png,
                palettes_dir,
                metatiles_bin,
                output_png,
                secondary,
                metatile_sheet,
            },
            Commands::ConvertMap {
                map_bin,
                width,
                height,
                primary,
                secondary,
                border,
                output,
            } => Job::Map {
                map_bin,
                width,
                height,
                border_bin: border,
                primary_dir: primary,
                secondary_dir: secondary,
                output_json: output,
            },
            Commands::ReplacePalette {
                input_png,
                palette,
                output_png,
            } => Job::ReplacePalette {
                input_png,
                palette,
                output_png,
            },
            Commands::Batch { manifest } => return load_manifest(&manifest),
        };
        Ok(vec![job])
    }
}

fn print_report(report: &JobReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Failed to serialise report: {}", e),
        }
        return;
    }
    for output in &report.outputs {
        println!("{}: wrote {}", report.job, output.display());
    }
    for warning in &report.warnings {
        println!("{}: warning: {}", report.job, warning);
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    let jobs = cli.command.into_jobs()?;
    let converter = Converter::new(config);

    let mut all_ok = true;
    for result in converter.run_all(&jobs) {
        match result {
            Ok(report) => print_report(&report, cli.json),
            Err(e) => {
                log::error!("{}", e);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
