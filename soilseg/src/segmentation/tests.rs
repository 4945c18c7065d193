use image::{GrayImage, Luma, Rgb, RgbImage};

use super::*;
use crate::color::ColorSpace;
use crate::config::{ChannelBounds, PipelineConfig};
use crate::error::Error;

fn mask_from_rect(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

fn white_rect_image() -> RgbImage {
    RgbImage::from_fn(60, 40, |x, y| {
        if (20..40).contains(&x) && (10..30).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn white_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_bounds(ChannelBounds::new(0, 0, 200), ChannelBounds::new(180, 30, 255))
        .with_area_range(1, 10_000)
}

// ============================================================================
// Blur
// ============================================================================

#[test]
fn small_kernels_are_normalized_binomials() {
    assert_eq!(gaussian_kernel(1), vec![1.0]);
    assert_eq!(gaussian_kernel(3), vec![0.25, 0.5, 0.25]);
    for size in [5, 7] {
        let sum: f32 = gaussian_kernel(size).iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}

#[test]
fn large_kernel_uses_auto_sigma() {
    assert!((auto_sigma(9) - 1.7).abs() < 1e-6);

    let kernel = gaussian_kernel(9);
    assert_eq!(kernel.len(), 9);
    let sum: f32 = kernel.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    for i in 0..4 {
        assert!((kernel[i] - kernel[8 - i]).abs() < 1e-7, "kernel must be symmetric");
        assert!(kernel[i] < kernel[i + 1], "kernel must rise towards the center");
    }
}

#[test]
fn blur_radius_zero_is_identity() {
    let image = RgbImage::from_fn(9, 7, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 5]));
    assert_eq!(gaussian_blur(&image, 0), image);
}

#[test]
fn blur_keeps_uniform_image_uniform() {
    let image = RgbImage::from_pixel(17, 11, Rgb([90, 140, 210]));
    for radius in [1, 2, 3, 6] {
        assert_eq!(gaussian_blur(&image, radius), image, "radius {}", radius);
    }
}

#[test]
fn blur_spreads_point_symmetrically() {
    let mut image = RgbImage::new(9, 9);
    image.put_pixel(4, 4, Rgb([255, 255, 255]));

    let blurred = gaussian_blur(&image, 1);
    // 255 * 0.5 * 0.5
    assert_eq!(blurred.get_pixel(4, 4).0[0], 64);
    assert_eq!(blurred.get_pixel(3, 4), blurred.get_pixel(5, 4));
    assert_eq!(blurred.get_pixel(4, 3), blurred.get_pixel(4, 5));
    assert_eq!(blurred.get_pixel(0, 0).0[0], 0);
}

#[test]
fn blur_handles_single_row_images() {
    let image = RgbImage::from_fn(5, 1, |x, _| Rgb([(x * 50) as u8, 0, 0]));
    let blurred = gaussian_blur(&image, 2);
    assert_eq!(blurred.dimensions(), (5, 1));
}

// ============================================================================
// Threshold
// ============================================================================

#[test]
fn in_range_is_inclusive_on_both_ends() {
    let image = RgbImage::from_fn(3, 1, |x, _| match x {
        0 => Rgb([10, 20, 30]),
        1 => Rgb([40, 50, 60]),
        _ => Rgb([41, 50, 60]),
    });
    let mask = in_range(
        &image,
        ChannelBounds::new(10, 20, 30),
        ChannelBounds::new(40, 50, 60),
    );

    assert_eq!(mask.get_pixel(0, 0).0[0], MASK_ON);
    assert_eq!(mask.get_pixel(1, 0).0[0], MASK_ON);
    assert_eq!(mask.get_pixel(2, 0).0[0], 0);
}

#[test]
fn inverted_bounds_select_nothing() {
    let image = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 128]));
    let mask = in_range(
        &image,
        ChannelBounds::new(200, 200, 200),
        ChannelBounds::new(10, 10, 10),
    );
    assert_eq!(count_set(&mask), 0);
}

// ============================================================================
// Structuring elements and morphology
// ============================================================================

#[test]
fn ellipse_shapes() {
    let one = StructuringElement::ellipse(1).unwrap();
    assert!(one.contains(0, 0));

    // Size 3 is a plus sign.
    let three = StructuringElement::ellipse(3).unwrap();
    let cells: Vec<(usize, usize)> = (0..3)
        .flat_map(|row| (0..3).map(move |col| (col, row)))
        .filter(|&(col, row)| three.contains(col, row))
        .collect();
    assert_eq!(cells, vec![(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)]);

    // Size 5: single tips, three full rows.
    let five = StructuringElement::ellipse(5).unwrap();
    let count = (0..5)
        .flat_map(|row| (0..5).map(move |col| (col, row)))
        .filter(|&(col, row)| five.contains(col, row))
        .count();
    assert_eq!(count, 17);
    assert!(five.contains(2, 0));
    assert!(!five.contains(1, 0));
    assert!(five.contains(0, 2));
}

#[test]
fn zero_sized_element_is_rejected() {
    assert!(matches!(
        StructuringElement::ellipse(0),
        Err(Error::InvalidConfig { .. })
    ));
    assert!(StructuringElement::ellipse(-3).is_err());
}

#[test]
fn erode_removes_isolated_pixels_and_shrinks_blocks() {
    let mut mask = mask_from_rect(12, 12, 2, 2, 5, 5);
    mask.put_pixel(10, 10, Luma([MASK_ON]));

    let eroded = erode(&mask, &StructuringElement::ellipse(3).unwrap());
    assert_eq!(eroded.get_pixel(10, 10).0[0], 0);
    assert_eq!(count_set(&eroded), 9);
    assert_eq!(eroded.get_pixel(4, 4).0[0], MASK_ON);
    assert_eq!(eroded.get_pixel(2, 4).0[0], 0);
}

#[test]
fn dilate_grows_single_pixel_by_element() {
    let mut mask = GrayImage::new(7, 7);
    mask.put_pixel(3, 3, Luma([MASK_ON]));

    let dilated = dilate(&mask, &StructuringElement::ellipse(3).unwrap());
    assert_eq!(count_set(&dilated), 5);
    assert_eq!(dilated.get_pixel(3, 2).0[0], MASK_ON);
    assert_eq!(dilated.get_pixel(2, 2).0[0], 0);
}

#[test]
fn image_border_does_not_erode() {
    let mask = GrayImage::from_pixel(6, 4, Luma([MASK_ON]));
    let eroded = erode(&mask, &StructuringElement::ellipse(5).unwrap());
    assert_eq!(eroded, mask);
}

#[test]
fn size_one_morphology_is_identity() {
    let mask = mask_from_rect(10, 10, 1, 3, 4, 2);
    let element = StructuringElement::ellipse(1).unwrap();
    assert_eq!(erode(&mask, &element), mask);
    assert_eq!(dilate(&mask, &element), mask);
}

// ============================================================================
// Full chain
// ============================================================================

#[test]
fn segment_rejects_zero_structuring_element() {
    let config = PipelineConfig {
        dilate_size: 0,
        ..white_config()
    };
    assert!(matches!(
        segment(&white_rect_image(), &config),
        Err(Error::InvalidConfig { .. })
    ));
}

#[test]
fn segment_selects_white_region_in_hsv() {
    let config = PipelineConfig {
        blur_radius: 0,
        ..white_config()
    };
    let (blurred, mask) = segment(&white_rect_image(), &config).unwrap();

    assert_eq!(blurred, white_rect_image());
    assert_eq!(count_set(&mask), 20 * 20);
    assert_eq!(mask.get_pixel(25, 15).0[0], MASK_ON);
    assert_eq!(mask.get_pixel(5, 5).0[0], 0);
}

#[test]
fn raw_threshold_space_compares_blurred_samples_directly() {
    let config = PipelineConfig {
        blur_radius: 0,
        threshold_space: ColorSpace::Raw,
        ..PipelineConfig::default()
    }
    .with_bounds(ChannelBounds::new(200, 200, 200), ChannelBounds::new(255, 255, 255));

    let (_, mask) = segment(&white_rect_image(), &config).unwrap();
    assert_eq!(count_set(&mask), 20 * 20);
}

#[test]
fn raw_threshold_space_compares_blue_against_first_bound() {
    let image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]));
    let config = PipelineConfig {
        blur_radius: 0,
        threshold_space: ColorSpace::Raw,
        ..PipelineConfig::default()
    }
    .with_bounds(ChannelBounds::new(250, 0, 0), ChannelBounds::new(255, 5, 5));

    let (_, mask) = segment(&image, &config).unwrap();
    assert_eq!(count_set(&mask), 16);

    let red = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
    let (_, mask) = segment(&red, &config).unwrap();
    assert_eq!(count_set(&mask), 0);
}

#[test]
fn stages_are_kept_in_order() {
    let mut image = white_rect_image();
    // Speck of noise that survives the threshold but not the erosion.
    image.put_pixel(5, 5, Rgb([255, 255, 255]));

    let config = PipelineConfig {
        blur_radius: 0,
        erode_size: 3,
        dilate_size: 1,
        ..white_config()
    };
    let stages = segment_stages(&image, &config).unwrap();

    assert_eq!(stages.thresholded.get_pixel(5, 5).0[0], MASK_ON);
    assert_eq!(stages.eroded.get_pixel(5, 5).0[0], 0);
    assert!(count_set(&stages.eroded) < count_set(&stages.thresholded));
    assert_eq!(stages.eroded, stages.dilated);
    assert_eq!(stages.mask(), &stages.dilated);
}

#[test]
fn erode_then_dilate_is_not_symmetric() {
    let config = PipelineConfig {
        blur_radius: 0,
        erode_size: 5,
        dilate_size: 3,
        ..white_config()
    };
    let stages = segment_stages(&white_rect_image(), &config).unwrap();
    assert!(count_set(&stages.dilated) < count_set(&stages.thresholded));
    assert!(count_set(&stages.dilated) > count_set(&stages.eroded));
}

#[test]
fn segmentation_is_deterministic() {
    let image = RgbImage::from_fn(80, 60, |x, y| {
        Rgb([
            ((x * 13 + y * 7) % 256) as u8,
            ((x * 3 + y * 17) % 256) as u8,
            ((x * y) % 256) as u8,
        ])
    });
    let config = PipelineConfig {
        blur_radius: 2,
        erode_size: 3,
        dilate_size: 4,
        ..PipelineConfig::default()
    }
    .with_bounds(ChannelBounds::new(0, 40, 40), ChannelBounds::new(120, 255, 255));

    let first = segment_stages(&image, &config).unwrap();
    let second = segment_stages(&image, &config).unwrap();
    assert_eq!(first.blurred, second.blurred);
    assert_eq!(first.thresholded, second.thresholded);
    assert_eq!(first.dilated, second.dilated);
}
