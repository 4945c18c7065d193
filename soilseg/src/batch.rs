//! Sequential processing of a list of images with PNG and CSV output.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analysis::{Analysis, Analyzer};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::histogram::{render_histogram_plot, FeatureVector};
use crate::io::{load_image, save_png};

pub const SUMMARY_HEADER: [&str; 18] = [
    "blurRadius",
    "hsvLowH",
    "hsvLowS",
    "hsvLowV",
    "hsvHighH",
    "hsvHighS",
    "hsvHighV",
    "erodeSize",
    "dilateSize",
    "minArea",
    "maxArea",
    "regionCount",
    "channel1",
    "channel2",
    "channel3",
    "channel4",
    "channel5",
    "channel6",
];

/// Stage names used as output file suffixes, in pipeline order.
pub const STAGE_NAMES: [&str; 7] = [
    "blur",
    "threshold",
    "erode",
    "dilate",
    "contours",
    "hist_raw",
    "hist_hsv",
];

/// Reads one image path per line.
///
/// Blank lines and `#` comments are skipped. Relative entries resolve
/// against the directory holding the list.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let entries = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let entry = Path::new(line);
            if entry.is_absolute() {
                entry.to_path_buf()
            } else {
                base.join(entry)
            }
        })
        .collect();

    Ok(entries)
}

/// Expands a batch input into image paths.
///
/// A directory yields its JPEG and PNG files in path order; anything else is
/// read as a file list.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        return common::file_utils::image_files(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    read_file_list(path)
}

/// Output identifier for an input path.
///
/// `.jpg` inputs keep the legacy naming: the two characters right before the
/// extension (`samples/soil_07.jpg` becomes `07`). Anything else uses the
/// file stem.
pub fn image_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    if let Some(stem) = name.strip_suffix(".jpg") {
        let chars: Vec<char> = stem.chars().collect();
        if chars.len() >= 2 {
            return chars[chars.len() - 2..].iter().collect();
        }
    }

    match path.file_stem() {
        Some(stem) if !stem.is_empty() => stem.to_string_lossy().into_owned(),
        _ => "image".to_string(),
    }
}

/// One line of the summary CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub config: PipelineConfig,
    pub region_count: usize,
    pub features: FeatureVector,
}

impl SummaryRow {
    pub fn from_analysis(config: &PipelineConfig, analysis: &Analysis) -> Self {
        Self {
            config: *config,
            region_count: analysis.region_count(),
            features: *analysis.features(),
        }
    }

    pub fn fields(&self) -> Vec<String> {
        let c = &self.config;
        let integers = [
            c.blur_radius,
            c.lower.h,
            c.lower.s,
            c.lower.v,
            c.upper.h,
            c.upper.s,
            c.upper.v,
            c.erode_size,
            c.dilate_size,
            c.area_min,
            c.area_max,
        ];

        integers
            .iter()
            .map(i32::to_string)
            .chain(std::iter::once(self.region_count.to_string()))
            .chain(self.features.values().iter().map(f32::to_string))
            .collect()
    }
}

/// Appends summary rows as comma separated lines.
pub struct SummaryWriter<W: Write> {
    out: W,
    rows: usize,
}

impl SummaryWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        SummaryWriter::new(BufWriter::new(file)).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<W: Write> SummaryWriter<W> {
    /// Wraps `out` and writes the header line.
    pub fn new(mut out: W) -> std::io::Result<Self> {
        writeln!(out, "{}", SUMMARY_HEADER.join(","))?;
        Ok(Self { out, rows: 0 })
    }

    pub fn append(&mut self, row: &SummaryRow) -> std::io::Result<()> {
        writeln!(self.out, "{}", row.fields().join(","))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Writes every stage of an analysis as `<id>_<stage>.png` into `dir`.
pub fn write_stage_images(dir: &Path, id: &str, analysis: &Analysis) -> Result<Vec<PathBuf>> {
    let path_for = |stage: &str| dir.join(format!("{}_{}.png", id, stage));
    let stages = &analysis.pass.stages;

    let [blur, threshold, erode, dilate, contours, hist_raw, hist_hsv] = STAGE_NAMES.map(path_for);

    save_png(&stages.blurred, &blur)?;
    save_png(&stages.thresholded, &threshold)?;
    save_png(&stages.eroded, &erode)?;
    save_png(&stages.dilated, &dilate)?;
    save_png(&analysis.pass.tracking.overlay, &contours)?;
    save_png(&render_histogram_plot(&analysis.histograms.raw), &hist_raw)?;
    save_png(&render_histogram_plot(&analysis.histograms.hsv), &hist_hsv)?;

    Ok(vec![
        blur, threshold, erode, dilate, contours, hist_raw, hist_hsv,
    ])
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
    pub write_stages: bool,
    pub analyzer: Analyzer,
}

impl BatchOptions {
    /// Stage images and `summary.csv` both go to `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            summary_path: output_dir.join("summary.csv"),
            output_dir,
            write_stages: true,
            analyzer: Analyzer::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub path: PathBuf,
    pub id: String,
    pub region_count: usize,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedImage>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failures.len()
    }
}

/// Analyzes `images` in order with the same config.
///
/// Failing to create the output directory or the summary file aborts the
/// batch. A failure on a single image is logged and recorded in the report,
/// and processing continues with the next one.
pub fn run_batch(
    images: &[PathBuf],
    config: &PipelineConfig,
    options: &BatchOptions,
) -> Result<BatchReport> {
    config.validate()?;
    std::fs::create_dir_all(&options.output_dir).map_err(|source| Error::Io {
        path: options.output_dir.clone(),
        source,
    })?;

    let mut summary = SummaryWriter::create(&options.summary_path)?;
    let mut report = BatchReport::default();
    let mut seen_ids = HashSet::new();

    for path in images {
        let id = image_id(path);
        if !seen_ids.insert(id.clone()) {
            tracing::warn!(path = %path.display(), id, "Duplicate output id, overwriting");
        }

        match process_image(path, &id, config, options) {
            Ok(row) => {
                let write = summary.append(&row).map_err(|source| Error::Io {
                    path: options.summary_path.clone(),
                    source,
                });
                if let Err(error) = write {
                    tracing::warn!(path = %path.display(), "{}", error);
                    report.failures.push(BatchFailure {
                        path: path.clone(),
                        error,
                    });
                    continue;
                }

                tracing::info!(
                    path = %path.display(),
                    id,
                    regions = row.region_count,
                    "Processed image"
                );
                report.processed.push(ProcessedImage {
                    path: path.clone(),
                    id,
                    region_count: row.region_count,
                });
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), "Skipping image: {}", error);
                report.failures.push(BatchFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    summary.finish().map_err(|source| Error::Io {
        path: options.summary_path.clone(),
        source,
    })?;

    tracing::info!(
        processed = report.processed.len(),
        failed = report.failures.len(),
        "Batch finished"
    );
    Ok(report)
}

fn process_image(
    path: &Path,
    id: &str,
    config: &PipelineConfig,
    options: &BatchOptions,
) -> Result<SummaryRow> {
    let image = load_image(path)?;
    let analysis = options.analyzer.analyze(&image, config)?;

    if options.write_stages {
        write_stage_images(&options.output_dir, id, &analysis)?;
    }

    Ok(SummaryRow::from_analysis(config, &analysis))
}
