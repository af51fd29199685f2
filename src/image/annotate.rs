//! Bounding-box rendering for detection results.

use crate::models::Detection;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LINE_WIDTH: i32 = 3;

/// Draws every detection as a hollow rectangle on a copy of the image.
/// With no detections the copy is pixel-identical to the original.
pub fn draw_detections(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut annotated = image.clone();
    for detection in detections {
        draw_box(&mut annotated, detection.bbox);
    }
    annotated
}

/// Stroke is drawn as nested one-pixel rectangles growing inward, so the
/// outline never spills outside the detection box.
fn draw_box(image: &mut RgbImage, [x1, y1, x2, y2]: [i32; 4]) {
    for t in 0..LINE_WIDTH {
        let width = x2 - x1 - 2 * t;
        let height = y2 - y1 - 2 * t;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x1 + t, y1 + t).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, BOX_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(bbox: [i32; 4]) -> Detection {
        Detection {
            bbox,
            confidence: Some(0.9),
            label: Some("optic_disc".to_string()),
        }
    }

    #[test]
    fn no_detections_leaves_the_image_unchanged() {
        let image = RgbImage::from_pixel(32, 32, Rgb([10, 20, 30]));
        let annotated = draw_detections(&image, &[]);
        assert_eq!(image.as_raw(), annotated.as_raw());
    }

    #[test]
    fn box_border_is_painted_and_interior_is_preserved() {
        let image = RgbImage::from_pixel(64, 64, Rgb([10, 20, 30]));
        let annotated = draw_detections(&image, &[detection([8, 8, 40, 40])]);

        // Corner of the outline
        assert_eq!(*annotated.get_pixel(8, 8), BOX_COLOR);
        // Three pixels of stroke
        assert_eq!(*annotated.get_pixel(8, 20), BOX_COLOR);
        assert_eq!(*annotated.get_pixel(10, 20), BOX_COLOR);
        // Interior untouched
        assert_eq!(*annotated.get_pixel(24, 24), Rgb([10, 20, 30]));
        // Outside untouched
        assert_eq!(*annotated.get_pixel(4, 4), Rgb([10, 20, 30]));
    }

    #[test]
    fn degenerate_boxes_do_not_panic() {
        let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        let annotated = draw_detections(&image, &[detection([5, 5, 6, 6])]);
        assert_eq!(annotated.dimensions(), (16, 16));
    }

    #[test]
    fn original_image_is_not_mutated() {
        let image = RgbImage::from_pixel(32, 32, Rgb([10, 20, 30]));
        let _ = draw_detections(&image, &[detection([0, 0, 31, 31])]);
        assert_eq!(*image.get_pixel(0, 0), Rgb([10, 20, 30]));
    }
}
