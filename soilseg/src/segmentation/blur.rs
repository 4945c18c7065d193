//! Separable Gaussian smoothing of 8-bit RGB images.

use image::RgbImage;
use rayon::prelude::*;

/// Binomial kernels used for the small sizes with automatic sigma.
const KERNEL_3: [f32; 3] = [0.25, 0.5, 0.25];
const KERNEL_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];
const KERNEL_7: [f32; 7] = [
    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
];

/// Sigma derived from the kernel size when none is given.
pub fn auto_sigma(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian weights for an odd kernel `size`.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    assert!(size % 2 == 1, "kernel size must be odd, got {}", size);

    match size {
        1 => return vec![1.0],
        3 => return KERNEL_3.to_vec(),
        5 => return KERNEL_5.to_vec(),
        7 => return KERNEL_7.to_vec(),
        _ => {}
    }

    let sigma = auto_sigma(size);
    let scale = -0.5 / (sigma * sigma);
    let center = (size / 2) as f32;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Mirrors an out-of-range index without repeating the edge sample
/// (`...c b | a b c d | c b...`).
#[inline]
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Smooths `image` with a Gaussian kernel `2 * radius + 1` wide.
///
/// Radius 0 returns an unchanged copy.
pub fn gaussian_blur(image: &RgbImage, radius: usize) -> RgbImage {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if radius == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let kernel = gaussian_kernel(2 * radius + 1);
    let r = radius as isize;
    let src = image.as_raw();
    let row_len = width * 3;

    // Horizontal pass into f32 so rounding happens once.
    let mut horizontal = vec![0.0f32; width * height * 3];
    horizontal
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * row_len..(y + 1) * row_len];
            for x in 0..width {
                let mut acc = [0.0f32; 3];
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - r, width);
                    let px = &src_row[sx * 3..sx * 3 + 3];
                    acc[0] += w * px[0] as f32;
                    acc[1] += w * px[1] as f32;
                    acc[2] += w * px[2] as f32;
                }
                row[x * 3..x * 3 + 3].copy_from_slice(&acc);
            }
        });

    let mut out = RgbImage::new(width as u32, height as u32);
    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        for (i, dst) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - r, height);
                acc += w * horizontal[sy * row_len + i];
            }
            *dst = acc.round().clamp(0.0, 255.0) as u8;
        }
    });

    out
}
