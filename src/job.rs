//! # Conversion Jobs
//!
//! The only part of the crate that touches the filesystem. Each job reads its inputs, runs the
//! in-memory pipeline and stages every output as a temporary sibling file. Outputs are renamed
//! into place together once the whole job has succeeded; if one rename fails, the outputs already
//! moved are rolled back, so a failed job never leaves a partial output behind.
//!
//! Batches run on scoped worker threads. Jobs share nothing but the [`PaletteCache`].

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{self, decode_indexed, encode_rgba, replace_palette, ColourMode},
    config::ConvertConfig,
    diagnostics::{Diagnostics, Warning},
    error::{Error, Result},
    map::{BorderPattern, MapAssembler, MapGrid},
    metatile::{
        records::{decode_metatiles, trailing_bytes},
        Metatile, MetatileRecord, MetatileTable, TileSource, SECONDARY_OFFSET,
    },
    palette::{parse_jasc, PaletteCache, PaletteStore},
    render::{render_metatile_sheet, render_tileset, TileGraphics},
};

pub const METATILES_FILE: &str = "metatiles.bin";
pub const ATTRIBUTES_FILE: &str = "metatile_attributes.bin";
pub const PALETTE_EXTENSION: &str = "pal";

static TEMP_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Bake a tile sheet into true colour using per-tile palettes.
    Tileset {
        tiles_png: PathBuf,
        palettes_dir: PathBuf,
        metatiles_bin: PathBuf,
        output_png: PathBuf,
        /// Tiles of a secondary tileset start at absolute index 512.
        #[serde(default)]
        secondary: bool,
        #[serde(default)]
        metatile_sheet: Option<PathBuf>,
    },
    /// Assemble a map's tile layers and cell metadata into a JSON document.
    Map {
        map_bin: PathBuf,
        width: usize,
        height: usize,
        #[serde(default)]
        border_bin: Option<PathBuf>,
        primary_dir: PathBuf,
        #[serde(default)]
        secondary_dir: Option<PathBuf>,
        output_json: PathBuf,
    },
    /// Swap the embedded palette of an indexed image.
    ReplacePalette {
        input_png: PathBuf,
        palette: PathBuf,
        output_png: PathBuf,
    },
}

impl Job {
    pub fn describe(&self) -> String {
        match self {
            Job::Tileset { tiles_png, .. } => format!("tileset {}", tiles_png.display()),
            Job::Map { map_bin, .. } => format!("map {}", map_bin.display()),
            Job::ReplacePalette { input_png, .. } => {
                format!("palette replacement {}", input_png.display())
            }
        }
    }
}

/// Parse a batch manifest: a JSON array of jobs.
pub fn load_manifest(path: &Path) -> Result<Vec<Job>> {
    let text = fs::read_to_string(path).map_err(|e| Error::in_file(path, e.into()))?;
    serde_json::from_str(&text).map_err(|e| Error::in_file(path, e.into()))
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct JobReport {
    pub job: String,
    pub outputs: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

pub struct Converter {
    config: ConvertConfig,
    palettes: PaletteCache,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Converter {
            config,
            palettes: PaletteCache::new(),
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn run(&self, job: &Job) -> Result<JobReport> {
        let mut report = JobReport {
            job: job.describe(),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let mut outputs = OutputSet::new();
        log::info!("Starting {}", report.job);

        match job {
            Job::Tileset {
                tiles_png,
                palettes_dir,
                metatiles_bin,
                output_png,
                secondary,
                metatile_sheet,
            } => {
                let tile_offset = if *secondary { SECONDARY_OFFSET } else { 0 };
                self.run_tileset(
                    tiles_png,
                    palettes_dir,
                    metatiles_bin,
                    tile_offset,
                    output_png,
                    metatile_sheet.as_deref(),
                    &mut outputs,
                    &mut diagnostics,
                )?;
            }
            Job::Map {
                map_bin,
                width,
                height,
                border_bin,
                primary_dir,
                secondary_dir,
                output_json,
            } => {
                self.run_map(
                    map_bin,
                    (*width, *height),
                    border_bin.as_deref(),
                    primary_dir,
                    secondary_dir.as_deref(),
                    output_json,
                    &mut outputs,
                    &mut diagnostics,
                )?;
            }
            Job::ReplacePalette {
                input_png,
                palette,
                output_png,
            } => {
                let data = read_file(input_png)?;
                let text = fs::read_to_string(palette).map_err(|e| Error::in_file(palette, e.into()))?;
                let table = parse_jasc(&text).map_err(|e| Error::in_file(palette, e))?;
                let replaced = replace_palette(&data, &table, &mut diagnostics)
                    .map_err(|e| Error::in_file(input_png, e))?;
                outputs.stage(output_png, &replaced)?;
            }
        }

        report.outputs = outputs.commit()?;
        report.warnings = diagnostics.into_warnings();
        log::info!(
            "Finished {} ({} outputs, {} warnings)",
            report.job,
            report.outputs.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Run `jobs` across the configured number of workers. Results are in job order.
    pub fn run_all(&self, jobs: &[Job]) -> Vec<Result<JobReport>> {
        if jobs.is_empty() {
            return Vec::new();
        }
        let workers = self.config.worker_count(jobs.len());
        log::info!("Running {} jobs on {} workers", jobs.len(), workers);

        let next = &AtomicUsize::new(0);
        let mut results: Vec<(usize, Result<JobReport>)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(job) = jobs.get(index) else {
                                break;
                            };
                            done.push((index, self.run(job)));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(done) => done,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn run_tileset(
        &self,
        tiles_png: &Path,
        palettes_dir: &Path,
        metatiles_bin: &Path,
        tile_offset: u16,
        output_png: &Path,
        metatile_sheet: Option<&Path>,
        outputs: &mut OutputSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let data = read_file(tiles_png)?;
        let header = codec::read_header(&data).map_err(|e| Error::in_file(tiles_png, e))?;
        let mode = header
            .colour_mode()
            .map_err(|e| Error::in_file(tiles_png, e))?;

        if let ColourMode::TrueColour { .. } = mode {
            diagnostics.warn(Warning::TrueColourSource);
            return outputs.stage(output_png, &data);
        }

        let raster = decode_indexed(&data).map_err(|e| Error::in_file(tiles_png, e))?;
        let palettes = self.palettes.get_or_load(palettes_dir, load_palette_dir)?;
        let records = read_records(metatiles_bin, diagnostics)?;

        let img = render_tileset(&raster, &records, &palettes, tile_offset, diagnostics);
        outputs.stage(output_png, &self.encode_output(&img, diagnostics)?)?;

        if let Some(sheet_path) = metatile_sheet {
            let metatiles: Vec<Metatile> = records
                .into_iter()
                .map(|record| Metatile {
                    record,
                    ..Metatile::EMPTY
                })
                .collect();
            let table = if tile_offset == 0 {
                MetatileTable::new(metatiles, None)
            } else {
                MetatileTable::new(Vec::new(), Some(metatiles))
            };
            let graphics = [TileGraphics {
                raster: &raster,
                first_tile: tile_offset,
            }];
            let sheet = render_metatile_sheet(&table, &graphics, &palettes, diagnostics);
            outputs.stage(sheet_path, &self.encode_output(&sheet, diagnostics)?)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_map(
        &self,
        map_bin: &Path,
        (width, height): (usize, usize),
        border_bin: Option<&Path>,
        primary_dir: &Path,
        secondary_dir: Option<&Path>,
        output_json: &Path,
        outputs: &mut OutputSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let grid = MapGrid::from_bytes(&read_file(map_bin)?, width, height)
            .map_err(|e| Error::in_file(map_bin, e))?;

        let border = match border_bin {
            Some(path) => Some(
                BorderPattern::from_bytes(&read_file(path)?).map_err(|e| Error::in_file(path, e))?,
            ),
            None => None,
        };

        let primary = read_tile_source(primary_dir)?;
        let secondary = secondary_dir.map(read_tile_source).transpose()?;
        let table = MetatileTable::load(
            &primary.as_source(),
            secondary.as_ref().map(TileSourceFiles::as_source).as_ref(),
            self.config.attribute_layout,
            diagnostics,
        );
        log::debug!("Metatile table holds {} entries", table.len());

        let assembled = MapAssembler::new(&table)
            .with_border(border)
            .with_default_border(self.config.default_border_metatile)
            .assemble(&grid, diagnostics);

        let json = serde_json::to_vec_pretty(&assembled)?;
        outputs.stage(output_json, &json)
    }

    /// Encode `img` as RGBA, optionally through oxipng. An optimiser failure keeps the plain
    /// encoding and records a warning.
    fn encode_output(&self, img: &RgbaImage, diagnostics: &mut Diagnostics) -> Result<Vec<u8>> {
        let mut data = encode_rgba(img, self.config.compression_level)?;

        if self.config.optimise_png {
            let mut options = oxipng::Options::from_preset(2);
            options.interlace = None;
            match oxipng::optimize_from_memory(&data, &options) {
                Ok(optimised) => data = optimised,
                Err(e) => diagnostics.warn(Warning::OptimisationFailed {
                    reason: e.to_string(),
                }),
            }
        }

        log::debug!("Encoded {}x{} image ({} bytes)", img.width(), img.height(), data.len());
        Ok(data)
    }
}

struct TileSourceFiles {
    metatiles: Vec<u8>,
    attributes: Option<Vec<u8>>,
}

impl TileSourceFiles {
    fn as_source(&self) -> TileSource<'_> {
        TileSource {
            metatiles: &self.metatiles,
            attributes: self.attributes.as_deref(),
        }
    }
}

fn read_tile_source(dir: &Path) -> Result<TileSourceFiles> {
    let metatiles = read_file(&dir.join(METATILES_FILE))?;
    let attributes_path = dir.join(ATTRIBUTES_FILE);
    let attributes = if attributes_path.exists() {
        Some(read_file(&attributes_path)?)
    } else {
        None
    };
    Ok(TileSourceFiles {
        metatiles,
        attributes,
    })
}

fn read_records(path: &Path, diagnostics: &mut Diagnostics) -> Result<Vec<MetatileRecord>> {
    let data = read_file(path)?;
    let trailing = trailing_bytes(&data);
    if trailing != 0 {
        diagnostics.warn(Warning::TrailingBytes {
            table: METATILES_FILE,
            count: trailing,
        });
    }
    Ok(decode_metatiles(&data))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::in_file(path, e.into()))
}

/// Load every `.pal` file in `dir`, in file name order.
pub fn load_palette_dir(dir: &Path) -> Result<PaletteStore> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::in_file(dir, e.into()))? {
        let path = entry.map_err(|e| Error::in_file(dir, e.into()))?.path();
        let is_palette = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(PALETTE_EXTENSION));
        if is_palette && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path).map_err(|e| Error::in_file(path, e.into()))?;
        sources.push((path.to_string_lossy().into_owned(), text));
    }

    let store = PaletteStore::from_sources(
        sources
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str())),
    )
    .map_err(|e| Error::in_file(dir, e))?;
    log::debug!("Loaded {} palettes from {}", store.len(), dir.display());
    Ok(store)
}

fn sibling_path(path: &Path, tag: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(
        ".{}.{}.{}",
        std::process::id(),
        TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        tag
    ));
    PathBuf::from(name)
}

#[derive(Debug)]
struct StagedOutput {
    temp: PathBuf,
    target: PathBuf,
}

/// Outputs of one job, written to temporary siblings and published together by
/// [`OutputSet::commit`]. Temporary files still staged when the set is dropped are removed.
/// Temporary names are unique within the process so concurrent jobs never share one.
#[derive(Debug, Default)]
pub struct OutputSet {
    staged: Vec<StagedOutput>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::in_file(parent, e.into()))?;
        }

        let temp = sibling_path(path, "tmp");
        if let Err(e) = fs::write(&temp, data) {
            let _ = fs::remove_file(&temp);
            return Err(Error::in_file(path, e.into()));
        }
        self.staged.push(StagedOutput {
            temp,
            target: path.to_path_buf(),
        });
        Ok(())
    }

    /// Rename every staged file over its target. Existing targets are moved aside first and put
    /// back if any later rename fails.
    pub fn commit(mut self) -> Result<Vec<PathBuf>> {
        let staged = std::mem::take(&mut self.staged);
        let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
        let mut published: Vec<PathBuf> = Vec::new();

        for (i, output) in staged.iter().enumerate() {
            if let Err(e) = publish_one(output, &mut backups) {
                for target in &published {
                    let _ = fs::remove_file(target);
                }
                for (backup, target) in backups.iter().rev() {
                    let _ = fs::rename(backup, target);
                }
                for rest in &staged[i..] {
                    let _ = fs::remove_file(&rest.temp);
                }
                return Err(e);
            }
            published.push(output.target.clone());
        }

        for (backup, _) in &backups {
            let _ = fs::remove_file(backup);
        }
        Ok(published)
    }
}

impl Drop for OutputSet {
    fn drop(&mut self) {
        for output in &self.staged {
            let _ = fs::remove_file(&output.temp);
        }
    }
}

fn publish_one(output: &StagedOutput, backups: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
    let target = &output.target;
    let existing_file = fs::symlink_metadata(target).map_or(false, |meta| meta.is_file());
    if existing_file {
        let backup = sibling_path(target, "bak");
        fs::rename(target, &backup).map_err(|e| Error::in_file(target, e.into()))?;
        backups.push((backup, target.clone()));
    }
    fs::rename(&output.temp, target).map_err(|e| Error::in_file(target, e.into()))
}
