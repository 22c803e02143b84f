use crate::models::ResizeRequest;
use crate::{Error, Result};

/// Resolve the output dimensions for `request` against a source of
/// `source_width` x `source_height`.
///
/// Priority order:
/// 1. both width and height given: used as-is, no aspect correction
/// 2. neither given: both derived from `scale`, rounded, minimum 1
/// 3. only height given: width follows the source aspect ratio
/// 4. only width given: height follows the source aspect ratio
///
/// A zero width or height counts as absent.
pub fn resolve_dimensions(
    source_width: u32,
    source_height: u32,
    request: &ResizeRequest,
) -> Result<(u32, u32)> {
    if source_width == 0 || source_height == 0 {
        return Err(Error::InvalidDimensions {
            width: source_width as i64,
            height: source_height as i64,
        });
    }

    let width = request.width.filter(|w| *w > 0);
    let height = request.height.filter(|h| *h > 0);
    let (sw, sh) = (source_width as f64, source_height as f64);

    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w as f64, h as f64),
        (None, None) => {
            let scale = request.scale;
            if !scale.is_finite() || scale <= 0.0 {
                return Err(Error::InvalidScale(scale));
            }
            (
                (sw * scale).round().max(1.0),
                (sh * scale).round().max(1.0),
            )
        }
        (None, Some(h)) => ((sw * (h as f64 / sh)).round(), h as f64),
        (Some(w), None) => (w as f64, (sh * (w as f64 / sw)).round()),
    };

    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(Error::InvalidDimensions {
            width: w as i64,
            height: h as i64,
        });
    }

    Ok((w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;

    fn request() -> ResizeRequest {
        ResizeRequest::new(OutputFormat::Jpeg)
    }

    #[test]
    fn test_explicit_dimensions_used_as_is() {
        let req = request().with_width(300).with_height(700);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (300, 700));
    }

    #[test]
    fn test_width_only_preserves_aspect() {
        let req = request().with_width(1000).with_quality(0.8);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (1000, 500));
    }

    #[test]
    fn test_height_only_preserves_aspect() {
        let req = request().with_height(250);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (500, 250));
    }

    #[test]
    fn test_scale_only() {
        let req = request().with_scale(0.5);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (1000, 500));

        let req = request().with_scale(0.3);
        assert_eq!(resolve_dimensions(333, 101, &req).unwrap(), (100, 30));
    }

    #[test]
    fn test_scale_ignored_when_a_dimension_is_given() {
        let req = request().with_width(400).with_scale(0.1);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (400, 200));
    }

    #[test]
    fn test_zero_counts_as_absent() {
        let req = request().with_width(0).with_height(0).with_scale(0.5);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (1000, 500));

        let req = request().with_width(0).with_height(100);
        assert_eq!(resolve_dimensions(2000, 1000, &req).unwrap(), (200, 100));
    }

    #[test]
    fn test_scale_result_has_minimum_of_one() {
        let req = request().with_scale(0.01);
        assert_eq!(resolve_dimensions(10, 10, &req).unwrap(), (1, 1));
    }

    #[test]
    fn test_derived_dimension_rounding_to_zero_is_rejected() {
        let req = request().with_width(1);
        assert!(matches!(
            resolve_dimensions(2000, 1, &req),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_non_positive_scale_is_rejected() {
        assert!(matches!(
            resolve_dimensions(100, 100, &request().with_scale(0.0)),
            Err(Error::InvalidScale(_))
        ));
        assert!(matches!(
            resolve_dimensions(100, 100, &request().with_scale(f64::NAN)),
            Err(Error::InvalidScale(_))
        ));
    }

    #[test]
    fn test_aspect_within_one_pixel() {
        for &(sw, sh) in &[(1920u32, 1080u32), (37, 91), (4000, 3), (640, 480)] {
            for target in [1u32, 17, 333, 1000] {
                let (w, h) = resolve_dimensions(sw, sh, &request().with_width(target)).unwrap_or((0, 0));
                if w == 0 {
                    continue;
                }
                let exact = sh as f64 * target as f64 / sw as f64;
                assert!((h as f64 - exact).abs() <= 1.0, "{}x{} -> {}x{}", sw, sh, w, h);
            }
        }
    }
}
