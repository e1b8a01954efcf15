//! Moves `image` buffers in and out of OpenCV matrices. Pixel data is copied
//! as-is, so an RGB image stays RGB inside the `Mat` and colors passed to
//! OpenCV drawing calls must use the same channel order.

use image::{GrayImage, RgbImage};
use opencv::core::{Mat, Scalar, CV_8UC1, CV_8UC3};
use opencv::prelude::*;

pub fn gray_to_mat(img: &GrayImage) -> opencv::Result<Mat> {
    to_mat(img.width(), img.height(), CV_8UC1, img.as_raw())
}

pub fn rgb_to_mat(img: &RgbImage) -> opencv::Result<Mat> {
    to_mat(img.width(), img.height(), CV_8UC3, img.as_raw())
}

pub fn mat_to_rgb(mat: &Mat) -> opencv::Result<RgbImage> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let data = mat.data_bytes()?.to_vec();
    RgbImage::from_raw(width, height, data).ok_or_else(|| {
        opencv::Error::new(
            opencv::core::StsUnmatchedSizes,
            format!("matrix of {width}x{height} does not hold an rgb image"),
        )
    })
}

fn to_mat(width: u32, height: u32, typ: i32, data: &[u8]) -> opencv::Result<Mat> {
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, typ, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(data);
    Ok(mat)
}
