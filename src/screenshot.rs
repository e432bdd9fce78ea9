//! Viewport captures as data URLs, with the picked element outlined.

use crate::dom::BoundingBox;
use crate::error::{BrowserError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageOutputFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Outline colour, `#4A90D9`
const HIGHLIGHT_BORDER: Rgba<u8> = Rgba([74, 144, 217, 255]);
/// Same colour at 15% opacity
const HIGHLIGHT_FILL: Rgba<u8> = Rgba([74, 144, 217, 38]);
/// Outline width in CSS pixels
const BORDER_WIDTH: f64 = 2.0;

/// `data:image/png;base64,…` for PNG bytes
pub fn to_data_url(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png))
}

/// PNG bytes back out of a data URL produced by [`to_data_url`]
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| BrowserError::InvalidArgument("Expected a base64 PNG data URL".to_string()))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| BrowserError::InvalidArgument(format!("Invalid base64 in data URL: {}", e)))
}

/// Draw the element highlight onto a PNG capture.
///
/// `rect` is in CSS pixels and scaled by `device_pixel_ratio` to match the
/// capture. Elements with no area, or entirely off-screen, leave the image
/// unchanged.
pub fn highlight(png: &[u8], rect: BoundingBox, device_pixel_ratio: f64) -> Result<Vec<u8>> {
    let mut image = image::load_from_memory(png)
        .map_err(|e| BrowserError::ScreenshotFailed(format!("Failed to decode capture: {}", e)))?
        .to_rgba8();

    if let Some(area) = clip(rect.scaled(device_pixel_ratio), image.width(), image.height()) {
        fill(&mut image, area, HIGHLIGHT_FILL);

        let border = (BORDER_WIDTH * device_pixel_ratio).round().max(1.0) as u32;
        for inset in 0..border.min(area.width() / 2).min(area.height() / 2).max(1) {
            let ring = Rect::at(area.left() + inset as i32, area.top() + inset as i32)
                .of_size(area.width() - 2 * inset, area.height() - 2 * inset);
            draw_hollow_rect_mut(&mut image, ring, HIGHLIGHT_BORDER);
        }
    } else {
        log::debug!("Highlight {:?} falls outside the capture, skipping", rect);
    }

    encode_png(&image)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| BrowserError::ScreenshotFailed(format!("Failed to encode capture: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Intersection of `rect` with a `width` x `height` image, in whole pixels
fn clip(rect: BoundingBox, width: u32, height: u32) -> Option<Rect> {
    if !rect.is_visible() {
        return None;
    }

    let left = rect.x.floor().max(0.0);
    let top = rect.y.floor().max(0.0);
    let right = (rect.x + rect.width).ceil().min(width as f64);
    let bottom = (rect.y + rect.height).ceil().min(height as f64);
    if right <= left || bottom <= top {
        return None;
    }

    Some(Rect::at(left as i32, top as i32).of_size((right - left) as u32, (bottom - top) as u32))
}

fn fill(image: &mut RgbaImage, area: Rect, color: Rgba<u8>) {
    for y in area.top()..=area.bottom() {
        for x in area.left()..=area.right() {
            image.get_pixel_mut(x as u32, y as u32).blend(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_png(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))).unwrap()
    }

    fn decode(png: &[u8]) -> RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn test_data_url_round_trip() {
        let png = blank_png(2, 2);
        let url = to_data_url(&png);
        assert!(url.starts_with("data:image/png;base64,iVBOR"));
        assert_eq!(decode_data_url(&url).unwrap(), png);
        assert!(decode_data_url("data:text/plain,hi").is_err());
    }

    #[test]
    fn test_highlight_draws_border_and_fill() {
        let png = blank_png(40, 40);
        let out = decode(&highlight(&png, BoundingBox::new(5.0, 5.0, 10.0, 10.0), 2.0).unwrap());

        assert_eq!(*out.get_pixel(10, 10), HIGHLIGHT_BORDER);
        assert_eq!(*out.get_pixel(11, 11), HIGHLIGHT_BORDER);
        let inside = out.get_pixel(20, 20);
        assert!(inside[0] < 255 && inside[2] > inside[0], "fill should tint towards blue: {:?}", inside);
        assert_eq!(*out.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_highlight_skips_empty_and_offscreen_boxes() {
        let png = blank_png(20, 20);
        for rect in [BoundingBox::new(5.0, 5.0, 0.0, 8.0), BoundingBox::new(50.0, 50.0, 10.0, 10.0)] {
            let out = decode(&highlight(&png, rect, 1.0).unwrap());
            assert!(out.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
        }
    }

    #[test]
    fn test_clip_to_image() {
        let area = clip(BoundingBox::new(-4.0, 2.5, 10.0, 100.0), 8, 8).unwrap();
        assert_eq!((area.left(), area.top(), area.width(), area.height()), (0, 2, 6, 6));
    }

    #[test]
    fn test_invalid_png() {
        assert!(matches!(
            highlight(b"not a png", BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1.0),
            Err(BrowserError::ScreenshotFailed(_))
        ));
    }
}
