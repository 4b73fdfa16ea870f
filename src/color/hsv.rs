//! HSV masking and statistics over OpenCV images

use opencv::{
    core::{self, Mat, Scalar},
    imgproc::{self, COLOR_BGR2HSV},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use super::conversion::HsvColor;
use crate::error::OpenCvResultExt;
use crate::Result;

/// Inclusive HSV range on OpenCV's 8-bit scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    fn bound(values: [u8; 3]) -> Scalar {
        Scalar::new(
            f64::from(values[0]),
            f64::from(values[1]),
            f64::from(values[2]),
            0.0,
        )
    }

    /// Binary mask (255 = inside) of an HSV image
    pub fn mask(&self, hsv: &Mat) -> Result<Mat> {
        let mut mask = Mat::default();
        core::in_range(hsv, &Self::bound(self.lower), &Self::bound(self.upper), &mut mask)
            .cv_context("inRange")?;
        Ok(mask)
    }

    /// Number of pixels of an HSV image inside the range
    pub fn count(&self, hsv: &Mat) -> Result<i32> {
        let mask = self.mask(hsv)?;
        core::count_non_zero(&mask).cv_context("countNonZero")
    }
}

/// Convert a BGR image to HSV
pub fn bgr_to_hsv(bgr: &Mat) -> Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(bgr, &mut hsv, COLOR_BGR2HSV).cv_context("cvtColor BGR2HSV")?;
    Ok(hsv)
}

/// Per-pixel mean of an HSV image
pub fn mean_hsv(hsv: &Mat) -> Result<HsvColor> {
    let mean = core::mean(hsv, &Mat::default()).cv_context("mean")?;
    Ok(HsvColor::new(mean[0], mean[1], mean[2]))
}

/// Per-pixel mean and standard deviation of an HSV image
pub fn mean_std_hsv(hsv: &Mat) -> Result<(HsvColor, HsvColor)> {
    let mut mean = Mat::default();
    let mut stddev = Mat::default();
    core::mean_std_dev(hsv, &mut mean, &mut stddev, &Mat::default()).cv_context("meanStdDev")?;

    let channel = |m: &Mat, i: i32| -> Result<f64> { m.at::<f64>(i).map(|v| *v).cv_context("meanStdDev read") };
    Ok((
        HsvColor::new(channel(&mean, 0)?, channel(&mean, 1)?, channel(&mean, 2)?),
        HsvColor::new(channel(&stddev, 0)?, channel(&stddev, 1)?, channel(&stddev, 2)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::CV_8UC3;

    fn solid_bgr(rows: i32, cols: i32, b: f64, g: f64, r: f64) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::new(b, g, r, 0.0)).unwrap()
    }

    #[test]
    fn test_mask_bounds_are_inclusive() {
        // H=60 S=255 V=85 sits exactly on the upper V bound
        let image = solid_bgr(3, 3, 0.0, 85.0, 0.0);
        let hsv = bgr_to_hsv(&image).unwrap();
        assert_eq!(HsvRange::new([60, 255, 85], [60, 255, 85]).count(&hsv).unwrap(), 9);
        assert_eq!(HsvRange::new([61, 0, 0], [180, 255, 255]).count(&hsv).unwrap(), 0);
    }

    #[test]
    fn test_green_mask_counts_all_pixels() {
        let image = solid_bgr(10, 20, 34.0, 139.0, 34.0);
        let hsv = bgr_to_hsv(&image).unwrap();
        let green = HsvRange::new([35, 50, 50], [85, 255, 255]);
        assert_eq!(green.count(&hsv).unwrap(), 200);

        let red = HsvRange::new([0, 50, 50], [20, 255, 255]);
        assert_eq!(red.count(&hsv).unwrap(), 0);
    }

    #[test]
    fn test_mean_hsv_of_solid_color() {
        let image = solid_bgr(4, 4, 34.0, 139.0, 34.0);
        let hsv = bgr_to_hsv(&image).unwrap();
        let mean = mean_hsv(&hsv).unwrap();
        assert!((mean.h - 60.0).abs() <= 1.0);
        assert!((mean.v - 139.0).abs() <= 1.0);
        assert!(mean.s > 100.0);
    }

    #[test]
    fn test_std_of_solid_color_is_zero() {
        let image = solid_bgr(4, 4, 200.0, 10.0, 10.0);
        let hsv = bgr_to_hsv(&image).unwrap();
        let (_, std) = mean_std_hsv(&hsv).unwrap();
        assert!(std.h.abs() < 1e-9 && std.s.abs() < 1e-9 && std.v.abs() < 1e-9);
    }
}
