//! Photo enhancement by blending against a degenerate image
//!
//! Each adjustment computes `out = degenerate + factor * (image - degenerate)`,
//! i.e. `factor * image + (1 - factor) * degenerate`, saturating to 8 bits.
//! A factor of 1.0 returns the image unchanged.

use opencv::{
    core::{self, Mat, Point, Scalar, Vec3b, CV_32F},
    imgproc::{self, COLOR_BGR2GRAY, COLOR_GRAY2BGR},
    prelude::*,
};

use crate::error::OpenCvResultExt;
use crate::Result;

/// Stretch intensities away from the rounded mean gray level
pub fn adjust_contrast(bgr: &Mat, factor: f64) -> Result<Mat> {
    let gray = to_gray(bgr)?;
    let mean = core::mean(&gray, &Mat::default()).cv_context("mean gray")?[0];
    let mean = (mean + 0.5).floor();

    let mut out = Mat::default();
    bgr.convert_to(&mut out, -1, factor, mean * (1.0 - factor))
        .cv_context("contrast blend")?;
    Ok(out)
}

/// Blend away from a 3x3 smoothed copy ([1 1 1; 1 5 1; 1 1 1] / 13)
///
/// The outermost pixel ring is not smoothed, so it keeps its input values.
pub fn adjust_sharpness(bgr: &Mat, factor: f64) -> Result<Mat> {
    let mut kernel = Mat::new_rows_cols_with_default(3, 3, CV_32F, Scalar::all(1.0 / 13.0))
        .cv_context("smoothing kernel")?;
    *kernel.at_2d_mut::<f32>(1, 1).cv_context("smoothing kernel")? = 5.0 / 13.0;

    let mut smooth = Mat::default();
    imgproc::filter_2d(
        bgr,
        &mut smooth,
        -1,
        &kernel,
        Point::new(-1, -1),
        0.0,
        core::BORDER_DEFAULT,
    )
    .cv_context("filter2D")?;
    copy_border(bgr, &mut smooth)?;

    blend(bgr, &smooth, factor)
}

/// Overwrite the 1-pixel frame of `dst` with the pixels of `src`
fn copy_border(src: &Mat, dst: &mut Mat) -> Result<()> {
    let (rows, cols) = (src.rows(), src.cols());
    for row in 0..rows {
        let step = if row == 0 || row == rows - 1 { 1 } else { (cols - 1).max(1) };
        let mut col = 0;
        while col < cols {
            *dst.at_2d_mut::<Vec3b>(row, col).cv_context("border write")? =
                *src.at_2d::<Vec3b>(row, col).cv_context("border read")?;
            col += step;
        }
    }
    Ok(())
}

/// Blend away from the grayscale version of the image
pub fn adjust_color(bgr: &Mat, factor: f64) -> Result<Mat> {
    let gray = to_gray(bgr)?;
    let mut gray_bgr = Mat::default();
    imgproc::cvt_color_def(&gray, &mut gray_bgr, COLOR_GRAY2BGR).cv_context("cvtColor GRAY2BGR")?;

    blend(bgr, &gray_bgr, factor)
}

fn blend(image: &Mat, degenerate: &Mat, factor: f64) -> Result<Mat> {
    let mut out = Mat::default();
    core::add_weighted(image, factor, degenerate, 1.0 - factor, 0.0, &mut out, -1)
        .cv_context("addWeighted")?;
    Ok(out)
}

pub(crate) fn to_gray(bgr: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(bgr, &mut gray, COLOR_BGR2GRAY).cv_context("cvtColor BGR2GRAY")?;
    Ok(gray)
}
