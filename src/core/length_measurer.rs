// Length estimation by counting the visible boxes of a reference ruler poster
// Boxes covered by the person are missing from the count

use crate::models::measurement::{LengthConfig, LengthResult};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::point::Point;
use imageproc::rect::Rect;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

pub struct LengthMeasurer {
    config: LengthConfig,
}

impl LengthMeasurer {
    pub fn new(config: LengthConfig) -> Self {
        Self { config }
    }

    pub fn with_default() -> Self {
        Self::new(LengthConfig::default())
    }

    pub fn config(&self) -> &LengthConfig {
        &self.config
    }

    /// Count the ruler boxes in `image` and derive the hidden length.
    ///
    /// Returns the estimate together with an annotated copy of the image in
    /// which every counted box is outlined. The input is never modified.
    pub fn calc_length(&self, image: &RgbImage) -> (LengthResult, RgbImage) {
        let boxes = self.find_boxes(image);

        let mut annotated = image.clone();
        draw_contours(&mut annotated, &boxes, self.config.outline_thickness);

        let number_of_boxes = boxes.len();
        let child_length = self.config.poster_length - number_of_boxes as i64;
        tracing::info!("Number of boxes: {}", number_of_boxes);

        if child_length < 0 {
            tracing::warn!(
                "Counted {} boxes on a poster of length {}; length estimate is negative",
                number_of_boxes,
                self.config.poster_length
            );
        }

        (
            LengthResult {
                child_length,
                number_of_boxes,
            },
            annotated,
        )
    }

    /// Outermost contours of the bright regions whose area passes the noise filter
    pub fn find_boxes(&self, image: &RgbImage) -> Vec<Contour<i32>> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let gray = image::imageops::grayscale(image);
        let binary = pad_with_background(&self.binarize(&gray));

        let contours = find_contours::<i32>(&binary);
        let total = contours.len();

        let boxes: Vec<Contour<i32>> = contours
            .into_iter()
            .filter(is_external)
            .map(unpad)
            .filter(|contour| contour_area(&contour.points) >= self.config.min_box_area)
            .collect();

        tracing::debug!(
            "{} contours found, {} external contours above {} px²",
            total,
            boxes.len(),
            self.config.min_box_area
        );

        boxes
    }

    /// Global threshold: foreground (255) at or above the brightness threshold
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let threshold = self.config.brightness_threshold;
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] >= threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

/// Surround `binary` with a 1 px background frame.
///
/// `find_contours` only classifies a region as an outer border when it has
/// background on its left, so regions touching column 0 would otherwise
/// come back as holes.
fn pad_with_background(binary: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(binary.width() + 2, binary.height() + 2);
    image::imageops::replace(&mut padded, binary, 1, 1);
    padded
}

/// Move contour points from padded back to image coordinates
fn unpad(mut contour: Contour<i32>) -> Contour<i32> {
    for point in &mut contour.points {
        point.x -= 1;
        point.y -= 1;
    }
    contour
}

/// Outer border with no enclosing border, i.e. not nested inside a hole
fn is_external(contour: &Contour<i32>) -> bool {
    contour.border_type == BorderType::Outer && contour.parent.is_none()
}

/// Area enclosed by a closed polygon of boundary points (shoelace formula)
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

fn draw_contours(image: &mut RgbImage, contours: &[Contour<i32>], thickness: u32) {
    let thickness = thickness.max(1);

    for contour in contours {
        for point in &contour.points {
            let rect = Rect::at(point.x, point.y).of_size(thickness, thickness);
            draw_filled_rect_mut(image, rect, OUTLINE_COLOR);
        }
    }
}
