// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for the detection model

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size of YOLO-family exports
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Gray used for letterbox padding
pub const PAD_VALUE: u8 = 114;

/// Scale and padding applied by [`letterbox`]
///
/// Needed to map boxes from model space back to the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl PreprocessInfo {
    /// Calculate letterbox parameters for an image of the given size
    pub fn new(orig_w: u32, orig_h: u32, target_w: u32, target_h: u32) -> Self {
        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_w as f32 / orig_w as f32).min(target_h as f32 / orig_h as f32);
        let (new_w, new_h) = scaled_size(orig_w, orig_h, scale, target_w, target_h);

        Self {
            scale,
            offset_x: (target_w - new_w) / 2,
            offset_y: (target_h - new_h) / 2,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Map an `[x1, y1, x2, y2]` box from model space to original pixels
    ///
    /// The result is clipped to the original image, so `x1 <= x2` and
    /// `y1 <= y2` hold for any input box with non-negative extent.
    pub fn map_box_to_original(&self, bbox: [f32; 4]) -> [f32; 4] {
        let w = self.original_width as f32;
        let h = self.original_height as f32;
        let ox = self.offset_x as f32;
        let oy = self.offset_y as f32;

        let x1 = ((bbox[0] - ox) / self.scale).clamp(0.0, w);
        let y1 = ((bbox[1] - oy) / self.scale).clamp(0.0, h);
        let x2 = ((bbox[2] - ox) / self.scale).clamp(0.0, w);
        let y2 = ((bbox[3] - oy) / self.scale).clamp(0.0, h);

        [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]
    }
}

fn scaled_size(orig_w: u32, orig_h: u32, scale: f32, target_w: u32, target_h: u32) -> (u32, u32) {
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_h);
    (new_w, new_h)
}

/// Resize with aspect ratio preserved, centered on a gray canvas
pub fn letterbox(image: &DynamicImage, target_w: u32, target_h: u32) -> (RgbImage, PreprocessInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let info = PreprocessInfo::new(orig_w, orig_h, target_w, target_h);

    let mut output = RgbImage::from_pixel(target_w, target_h, Rgb([PAD_VALUE; 3]));
    if orig_w == 0 || orig_h == 0 {
        return (output, info);
    }

    let (new_w, new_h) = scaled_size(orig_w, orig_h, info.scale, target_w, target_h);
    let resized = image
        .resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
        .to_rgb8();

    image::imageops::replace(
        &mut output,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );

    (output, info)
}

/// Letterbox and convert to an NCHW tensor with values in `[0, 1]`
pub fn preprocess_for_detection(
    image: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> (Array4<f32>, PreprocessInfo) {
    let (canvas, info) = letterbox(image, target_w, target_h);

    let mut tensor = Array4::zeros((1, 3, target_h as usize, target_w as usize));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}
