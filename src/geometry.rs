//! Polygon geometry helpers shared by the YOLO and COCO emitters.
//!
//! All functions are pure. Coordinates are `(x, y)` pairs in pixel space unless
//! the function says otherwise.

use crate::error::{ConvertError, Result};

/// Compute `(x_min, y_min, x_max, y_max)` over all points of a polygon.
pub fn bounding_box(polygon: &[(f64, f64)]) -> Result<(f64, f64, f64, f64)> {
    if polygon.is_empty() {
        return Err(ConvertError::EmptyPolygon);
    }

    Ok(polygon.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(x_min, y_min, x_max, y_max), &(x, y)| {
            (x_min.min(x), y_min.min(y), x_max.max(x), y_max.max(y))
        },
    ))
}

/// Calculate polygon area using the shoelace formula.
///
/// Degenerate polygons (two points or fewer) have an area of zero; callers that
/// need to reject them must check the point count themselves.
pub fn polygon_area(polygon: &[(f64, f64)]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let (x_i, y_i) = polygon[i];
        let (x_j, y_j) = polygon[j];
        area += x_i * y_j - x_j * y_i;
    }

    area.abs() / 2.0
}

/// Divide each coordinate by the matching image dimension.
///
/// Out-of-bounds points are passed through; the result is not clamped to [0, 1].
pub fn normalize(polygon: &[(f64, f64)], width: f64, height: f64) -> Result<Vec<(f64, f64)>> {
    check_dimensions(width, height)?;
    Ok(polygon
        .iter()
        .map(|&(x, y)| (x / width, y / height))
        .collect())
}

/// Scale normalized coordinates back to pixel space, rounded to whole pixels.
pub fn denormalize(polygon: &[(f64, f64)], width: f64, height: f64) -> Result<Vec<(f64, f64)>> {
    check_dimensions(width, height)?;
    Ok(polygon
        .iter()
        .map(|&(x, y)| (round_pixel(x * width), round_pixel(y * height)))
        .collect())
}

/// Rescale pixel coordinates from one image size to another, rounded to whole
/// pixels. Used when the paired image is resized.
pub fn resize_polygon(
    polygon: &[(f64, f64)],
    original: (f64, f64),
    target: (f64, f64),
) -> Result<Vec<(f64, f64)>> {
    let (original_width, original_height) = original;
    let (target_width, target_height) = target;
    check_dimensions(original_width, original_height)?;
    check_dimensions(target_width, target_height)?;

    Ok(polygon
        .iter()
        .map(|&(x, y)| {
            (
                round_pixel(x * target_width / original_width),
                round_pixel(y * target_height / original_height),
            )
        })
        .collect())
}

/// Convert corner coordinates to `(x_center, y_center, width, height)`.
pub fn to_center_format(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> (f64, f64, f64, f64) {
    (
        (x_min + x_max) / 2.0,
        (y_min + y_max) / 2.0,
        x_max - x_min,
        y_max - y_min,
    )
}

/// Flatten a polygon into `[x1, y1, x2, y2, ...]`.
pub fn flatten(polygon: &[(f64, f64)]) -> Vec<f64> {
    polygon.iter().flat_map(|&(x, y)| [x, y]).collect()
}

// Nearest integer, halves away from zero. Image coordinates are non-negative,
// where this is the same as rounding halves up.
fn round_pixel(value: f64) -> f64 {
    value.round()
}

fn check_dimensions(width: f64, height: f64) -> Result<()> {
    // NaN fails both comparisons and is rejected as well
    if width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(ConvertError::InvalidDimension { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]
    }

    #[test]
    fn test_bounding_box_of_rectangle() {
        assert_eq!(bounding_box(&rectangle()).unwrap(), (0.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn test_bounding_box_of_empty_polygon() {
        assert!(matches!(bounding_box(&[]), Err(ConvertError::EmptyPolygon)));
    }

    #[test]
    fn test_polygon_area() {
        assert_eq!(polygon_area(&rectangle()), 50.0);

        // Winding order does not change the sign
        let mut reversed = rectangle();
        reversed.reverse();
        assert_eq!(polygon_area(&reversed), 50.0);

        let triangle = [(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)];
        assert_eq!(polygon_area(&triangle), 6.0);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(polygon_area(&[(1.0, 1.0)]), 0.0);
        assert_eq!(polygon_area(&[(1.0, 1.0), (5.0, 5.0)]), 0.0);
    }

    #[test]
    fn test_polygon_area_non_negative_for_self_intersecting() {
        let bowtie = [(0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 4.0)];
        assert!(polygon_area(&bowtie) >= 0.0);
    }

    #[test]
    fn test_normalize() {
        let normalized = normalize(&rectangle(), 20.0, 10.0).unwrap();
        assert_eq!(
            normalized,
            vec![(0.0, 0.0), (0.5, 0.0), (0.5, 0.5), (0.0, 0.5)]
        );
    }

    #[test]
    fn test_normalize_passes_out_of_bounds_through() {
        let normalized = normalize(&[(30.0, -5.0)], 20.0, 10.0).unwrap();
        assert_eq!(normalized, vec![(1.5, -0.5)]);
    }

    #[test]
    fn test_normalize_rejects_non_positive_dimensions() {
        assert!(matches!(
            normalize(&rectangle(), 0.0, 10.0),
            Err(ConvertError::InvalidDimension { .. })
        ));
        assert!(matches!(
            normalize(&rectangle(), 10.0, -1.0),
            Err(ConvertError::InvalidDimension { .. })
        ));
        assert!(normalize(&rectangle(), f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_denormalize_recovers_pixels() {
        let polygon = vec![(13.0, 7.0), (1277.0, 7.0), (1277.0, 991.0), (13.0, 991.0)];
        let (width, height) = (1654.0, 2339.0);
        let normalized = normalize(&polygon, width, height).unwrap();
        let restored = denormalize(&normalized, width, height).unwrap();
        for (&(x0, y0), &(x1, y1)) in polygon.iter().zip(restored.iter()) {
            assert!((x0 - x1).abs() <= 1.0);
            assert!((y0 - y1).abs() <= 1.0);
        }
    }

    #[test]
    fn test_denormalize_rounds_half_up() {
        let restored = denormalize(&[(0.25, 0.75)], 2.0, 2.0).unwrap();
        assert_eq!(restored, vec![(1.0, 2.0)]);
        let restored = denormalize(&[(0.1, 0.1)], 12.0, 14.0).unwrap();
        assert_eq!(restored, vec![(1.0, 1.0)]);
    }

    #[test]
    fn test_resize_polygon() {
        let resized = resize_polygon(&rectangle(), (10.0, 5.0), (640.0, 640.0)).unwrap();
        assert_eq!(
            resized,
            vec![(0.0, 0.0), (640.0, 0.0), (640.0, 640.0), (0.0, 640.0)]
        );

        let resized = resize_polygon(&[(3.0, 3.0)], (4.0, 4.0), (2.0, 2.0)).unwrap();
        assert_eq!(resized, vec![(2.0, 2.0)]);

        assert!(resize_polygon(&rectangle(), (10.0, 5.0), (0.0, 640.0)).is_err());
    }

    #[test]
    fn test_to_center_format() {
        assert_eq!(to_center_format(0.0, 0.0, 10.0, 4.0), (5.0, 2.0, 10.0, 4.0));
    }

    #[test]
    fn test_flatten() {
        assert_eq!(
            flatten(&[(1.0, 2.0), (3.0, 4.0)]),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }
}
