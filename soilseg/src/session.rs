//! Re-run loop for tuning parameters against a single image.
//!
//! A controller publishes configs into a [`SharedConfig`] from any thread.
//! Each pass snapshots the latest config, runs the segmentation half of the
//! analysis, then waits for the next tick. The wait is the only place a
//! [`StopToken`] is observed, so a pass is never interrupted halfway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use parking_lot::RwLock;

use crate::analysis::{Analyzer, HistogramSummary, PassOutput};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};

pub const DEFAULT_TICK: Duration = Duration::from_millis(20);

/// A config value tagged with the publish counter it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub config: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<ConfigSnapshot>>,
}

impl SharedConfig {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConfigSnapshot { version: 0, config })),
        }
    }

    /// Replaces the config and returns the new version.
    pub fn publish(&self, config: PipelineConfig) -> u64 {
        let mut guard = self.inner.write();
        guard.version += 1;
        guard.config = config;
        guard.version
    }

    /// Applies `edit` to the current config under the write lock.
    pub fn update(&self, edit: impl FnOnce(&mut PipelineConfig)) -> u64 {
        let mut guard = self.inner.write();
        edit(&mut guard.config);
        guard.version += 1;
        guard.version
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        *self.inner.read()
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleeps for one tick and reports whether a stop was requested.
    pub fn wait_tick(&self, tick: Duration) -> bool {
        if !tick.is_zero() {
            std::thread::sleep(tick);
        }
        self.is_stopped()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub pass: usize,
    pub version: u64,
    pub region_count: usize,
    pub count_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub passes: usize,
    pub skipped: usize,
    pub last_count: Option<usize>,
}

#[derive(Debug)]
pub struct CalibrationSession {
    image: RgbImage,
    analyzer: Analyzer,
    config: SharedConfig,
    stop: StopToken,
    tick: Duration,
    max_passes: Option<usize>,
}

impl CalibrationSession {
    pub fn new(image: RgbImage, config: SharedConfig, stop: StopToken) -> Self {
        Self {
            image,
            analyzer: Analyzer::default(),
            config,
            stop,
            tick: DEFAULT_TICK,
            max_passes: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Histograms do not depend on the config, so they are computed once.
    pub fn histograms(&self) -> HistogramSummary {
        self.analyzer.summarize(&self.image)
    }

    /// Runs passes until stopped or `max_passes` is reached.
    ///
    /// A snapshot that fails validation skips that pass with a warning;
    /// the loop keeps waiting for a corrected config.
    pub fn run<F>(&self, mut on_pass: F) -> Result<SessionSummary>
    where
        F: FnMut(&PassReport, &PassOutput) -> Result<()>,
    {
        let mut summary = SessionSummary::default();
        let mut pass = 0usize;

        loop {
            let snapshot = self.config.snapshot();

            match self.analyzer.run_pass(&self.image, &snapshot.config) {
                Ok(output) => {
                    let region_count = output.region_count();
                    let count_changed = summary.last_count != Some(region_count);
                    if count_changed {
                        tracing::info!(
                            regions = region_count,
                            version = snapshot.version,
                            "Region count changed"
                        );
                    }
                    summary.last_count = Some(region_count);
                    summary.passes += 1;

                    let report = PassReport {
                        pass,
                        version: snapshot.version,
                        region_count,
                        count_changed,
                    };
                    on_pass(&report, &output)?;
                }
                Err(err @ Error::InvalidConfig { .. }) => {
                    tracing::warn!(version = snapshot.version, "Skipping pass: {}", err);
                    summary.skipped += 1;
                }
                Err(err) => return Err(err),
            }

            pass += 1;
            if self.max_passes.is_some_and(|max| pass >= max) {
                break;
            }
            if self.stop.wait_tick(self.tick) {
                tracing::debug!(passes = pass, "Session stopped");
                break;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::config::ChannelBounds;

    fn two_blobs() -> RgbImage {
        RgbImage::from_fn(60, 40, |x, y| {
            let in_a = (5..20).contains(&x) && (5..20).contains(&y);
            let in_b = (35..55).contains(&x) && (10..30).contains(&y);
            if in_a || in_b {
                Rgb([250, 250, 250])
            } else {
                Rgb([10, 10, 10])
            }
        })
    }

    fn white_config() -> PipelineConfig {
        PipelineConfig {
            blur_radius: 0,
            ..PipelineConfig::default()
        }
        .with_bounds(ChannelBounds::new(0, 0, 200), ChannelBounds::new(180, 40, 255))
        .with_area_range(1, 1000)
    }

    #[test]
    fn publish_bumps_version() {
        let shared = SharedConfig::default();
        assert_eq!(shared.version(), 0);

        let version = shared.publish(white_config());
        assert_eq!(version, 1);
        assert_eq!(shared.snapshot().config, white_config());

        let version = shared.update(|config| config.area_max = 7);
        assert_eq!(version, 2);
        assert_eq!(shared.snapshot().config.area_max, 7);
    }

    #[test]
    fn snapshot_is_detached_from_later_publishes() {
        let shared = SharedConfig::new(white_config());
        let before = shared.snapshot();
        shared.publish(PipelineConfig::default());
        assert_eq!(before.config, white_config());
        assert_eq!(before.version, 0);
    }

    #[test]
    fn stop_token_is_shared_between_clones() {
        let token = StopToken::new();
        let clone = token.clone();
        assert!(!token.wait_tick(Duration::ZERO));
        clone.stop();
        assert!(token.is_stopped());
        assert!(token.wait_tick(Duration::ZERO));
    }

    #[test]
    fn stop_requested_before_run_still_completes_one_pass() {
        let stop = StopToken::new();
        stop.stop();
        let session =
            CalibrationSession::new(two_blobs(), SharedConfig::new(white_config()), stop)
                .with_tick(Duration::ZERO);

        let mut counts = Vec::new();
        let summary = session
            .run(|report, _| {
                counts.push(report.region_count);
                Ok(())
            })
            .unwrap();

        assert_eq!(counts, vec![2]);
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.last_count, Some(2));
    }

    #[test]
    fn each_pass_reads_the_latest_config() {
        let shared = SharedConfig::new(white_config());
        let controller = shared.clone();
        let session = CalibrationSession::new(two_blobs(), shared, StopToken::new())
            .with_tick(Duration::ZERO)
            .with_max_passes(3);

        let mut reports = Vec::new();
        session
            .run(|report, _| {
                reports.push(*report);
                // Narrow the area range so only the smaller blob survives drawing;
                // the headline count does not change.
                controller.update(|config| config.area_max = 250);
                Ok(())
            })
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].version, 0);
        assert_eq!(reports[1].version, 1);
        assert!(reports[0].count_changed);
        assert!(!reports[1].count_changed);
        assert!(reports.iter().all(|r| r.region_count == 2));
    }

    #[test]
    fn invalid_snapshot_skips_the_pass() {
        let shared = SharedConfig::new(PipelineConfig {
            erode_size: 0,
            ..white_config()
        });
        let session = CalibrationSession::new(two_blobs(), shared, StopToken::new())
            .with_tick(Duration::ZERO)
            .with_max_passes(2);

        let summary = session.run(|_, _| Ok(())).unwrap();
        assert_eq!(summary.passes, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.last_count, None);
    }

    #[test]
    fn callback_error_ends_the_session() {
        let session = CalibrationSession::new(
            two_blobs(),
            SharedConfig::new(white_config()),
            StopToken::new(),
        )
        .with_tick(Duration::ZERO);

        let result = session.run(|_, _| {
            Err(Error::Io {
                path: "overlay.png".into(),
                source: std::io::Error::other("disk full"),
            })
        });
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
