//! Unified image loading for uploaded and captured food photos
//!
//! Decoding goes through the `image` crate; the result is converted to an
//! OpenCV Mat in BGR order for the rest of the pipeline. Images can come from
//! a file on disk or from an in-memory buffer (an upload or a camera frame).
//!
//! Upload formats are PNG, JPEG, GIF (first frame) and WebP; BMP and TIFF are
//! accepted as well since the decoder handles them.

use crate::error::{AnalysisError, OpenCvResultExt, Result};
use image::{DynamicImage, ImageReader};
use opencv::core::{Mat, Scalar, Vec3b, CV_8UC3};
use opencv::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image (first frame only)
    Gif,
    /// WebP image
    WebP,
    /// BMP image
    Bmp,
    /// TIFF image
    Tiff,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "bmp" => Some(ImageFormat::Bmp),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    /// Whether the format is one the upload form offers
    pub fn is_upload_format(&self) -> bool {
        matches!(
            self,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
        )
    }
}

/// Load an image from disk and convert to OpenCV Mat (BGR format)
///
/// # Errors
///
/// Returns `AnalysisError::ImageLoadError` if the file cannot be opened or
/// decoded, and `AnalysisError::UnsupportedImage` for unknown extensions.
///
/// # Example
///
/// ```rust,no_run
/// use calorie_scan::image_loader::load_image;
/// use std::path::Path;
///
/// let mat = load_image(Path::new("lunch.jpg"))?;
/// # Ok::<(), calorie_scan::AnalysisError>(())
/// ```
pub fn load_image(path: &Path) -> Result<Mat> {
    ImageFormat::from_extension(path).ok_or_else(|| AnalysisError::UnsupportedImage {
        reason: format!("Unknown image format for file: {}", path.display()),
    })?;

    let reader = ImageReader::open(path).map_err(|e| {
        AnalysisError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;

    let img = reader
        .with_guessed_format()
        .map_err(|e| {
            AnalysisError::image_load(format!("Failed to read image file: {}", path.display()), e)
        })?
        .decode()
        .map_err(|e| {
            AnalysisError::image_load(format!("Failed to decode image: {}", path.display()), e)
        })?;

    dynamic_to_bgr_mat(&img)
}

/// Decode an in-memory image (upload or camera capture) to a BGR Mat
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<Mat> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::image_load("Failed to read image buffer", e))?
        .decode()
        .map_err(|e| AnalysisError::image_load("Failed to decode image buffer", e))?;

    dynamic_to_bgr_mat(&img)
}

/// Convert a decoded image (any color type) to a BGR Mat
pub fn dynamic_to_bgr_mat(img: &DynamicImage) -> Result<Mat> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::UnsupportedImage {
            reason: "image has no pixels".into(),
        });
    }

    rgb_to_bgr_mat(rgb_img.as_raw(), width as i32, height as i32)
}

/// Convert RGB byte buffer to OpenCV BGR Mat
pub(crate) fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    let expected = (width as usize) * (height as usize) * 3;
    if rgb_data.len() < expected {
        return Err(AnalysisError::ProcessingError(format!(
            "RGB buffer too short: {} bytes for {}x{}",
            rgb_data.len(),
            width,
            height
        )));
    }

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
        .cv_context("Mat allocation")?;

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let pixel = mat.at_2d_mut::<Vec3b>(y, x).cv_context("pixel access")?;
            pixel[0] = rgb_data[idx + 2];
            pixel[1] = rgb_data[idx + 1];
            pixel[2] = rgb_data[idx];
        }
    }

    Ok(mat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat as Codec, Rgb, RgbImage};

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_extension(Path::new("meal.jpg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("meal.JPEG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("meal.webp")),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_extension(Path::new("meal.heic")), None);
        assert_eq!(ImageFormat::from_extension(Path::new("meal")), None);
    }

    #[test]
    fn test_upload_formats() {
        assert!(ImageFormat::Gif.is_upload_format());
        assert!(ImageFormat::WebP.is_upload_format());
        assert!(!ImageFormat::Tiff.is_upload_format());
    }

    #[test]
    fn test_rgb_to_bgr_conversion() {
        // 2x2 image: red, green, blue, white
        let rgb_data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];

        let mat = rgb_to_bgr_mat(&rgb_data, 2, 2).unwrap();

        let red: &Vec3b = mat.at_2d(0, 0).unwrap();
        assert_eq!((red[0], red[1], red[2]), (0, 0, 255));
        let green: &Vec3b = mat.at_2d(0, 1).unwrap();
        assert_eq!((green[0], green[1], green[2]), (0, 255, 0));
        let blue: &Vec3b = mat.at_2d(1, 0).unwrap();
        assert_eq!((blue[0], blue[1], blue[2]), (255, 0, 0));
        let white: &Vec3b = mat.at_2d(1, 1).unwrap();
        assert_eq!((white[0], white[1], white[2]), (255, 255, 255));
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(rgb_to_bgr_mat(&[0, 0, 0], 2, 2).is_err());
    }

    #[test]
    fn test_load_png_from_bytes() {
        let img = RgbImage::from_pixel(6, 4, Rgb([255, 69, 0]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), Codec::Png)
            .unwrap();

        let mat = load_image_from_bytes(&bytes).unwrap();
        assert_eq!((mat.cols(), mat.rows()), (6, 4));
        let px: &Vec3b = mat.at_2d(3, 5).unwrap();
        assert_eq!((px[0], px[1], px[2]), (0, 69, 255));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = load_image_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::ImageLoadError { .. }));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = load_image(Path::new("no_such_meal.jpg")).unwrap_err();
        assert!(matches!(err, AnalysisError::ImageLoadError { .. }));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = load_image(Path::new("menu.txt")).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedImage { .. }));
    }
}
