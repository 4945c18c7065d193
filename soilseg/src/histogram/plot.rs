use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use super::{ColorHistogram, BIN_COUNT, DISPLAY_MAX};

pub const PLOT_WIDTH: u32 = 512;
pub const PLOT_HEIGHT: u32 = DISPLAY_MAX as u32;

/// Channel 0 is drawn blue, channel 2 red, matching the B, G, R raw order.
const CHANNEL_COLORS: [Rgb<u8>; 3] = [Rgb([0, 0, 255]), Rgb([0, 255, 0]), Rgb([255, 0, 0])];

/// Draws the display-normalized channels as polylines on a black canvas.
pub fn render_histogram_plot(histogram: &ColorHistogram) -> RgbImage {
    let mut canvas = RgbImage::new(PLOT_WIDTH, PLOT_HEIGHT);
    let bin_width = (PLOT_WIDTH as f32 / BIN_COUNT as f32).round();
    let baseline = (PLOT_HEIGHT - 1) as f32;
    let y = |value: f32| (baseline - value.round()).max(0.0);

    for (values, color) in histogram.display().iter().zip(CHANNEL_COLORS) {
        for i in 1..BIN_COUNT {
            let start = (bin_width * (i - 1) as f32, y(values[i - 1]));
            let end = (bin_width * i as f32, y(values[i]));
            draw_line_segment_mut(&mut canvas, start, end, color);
        }
    }

    canvas
}
