use crate::error::ClassifyError;
use crate::fp16;
use image::imageops::FilterType;
use image::RgbImage;
use std::path::Path;

// Input geometry and statistics are fixed by the GoogLeNet training setup.
pub const IMAGE_DIM: u32 = 224;
pub const IMAGE_MEAN_BGR: [f32; 3] = [104.006_987_93, 116.668_767_62, 122.678_914_34];
pub const IMAGE_STDDEV: f32 = 1.0;

pub fn load_image_tensor(path: &Path) -> Result<Vec<u8>, ClassifyError> {
    let img = image::open(path)?.to_rgb8();
    let resized = image::imageops::resize(&img, IMAGE_DIM, IMAGE_DIM, FilterType::Triangle);
    Ok(tensor_from_rgb(&resized))
}

// Caffe networks take BGR planes with per-channel mean subtraction, packed
// interleaved as fp16.
pub fn tensor_from_rgb(img: &RgbImage) -> Vec<u8> {
    let mut values = Vec::with_capacity((img.width() * img.height() * 3) as usize);
    for pixel in img.pixels() {
        let [r, g, b] = pixel.0;
        values.push((b as f32 - IMAGE_MEAN_BGR[0]) * IMAGE_STDDEV);
        values.push((g as f32 - IMAGE_MEAN_BGR[1]) * IMAGE_STDDEV);
        values.push((r as f32 - IMAGE_MEAN_BGR[2]) * IMAGE_STDDEV);
    }
    fp16::encode_f16_slice(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn tensor_is_bgr_mean_subtracted_fp16() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([200, 150, 100]));

        let bytes = tensor_from_rgb(&img);
        assert_eq!(bytes.len(), 6);

        let values = fp16::decode_f16_slice(&bytes);
        let expected = [
            fp16::f16_to_f32(fp16::f32_to_f16(100.0 - IMAGE_MEAN_BGR[0])),
            fp16::f16_to_f32(fp16::f32_to_f16(150.0 - IMAGE_MEAN_BGR[1])),
            fp16::f16_to_f32(fp16::f32_to_f16(200.0 - IMAGE_MEAN_BGR[2])),
        ];
        assert_eq!(values, expected);
    }

    #[test]
    fn tensor_length_matches_pixel_count() {
        let img = RgbImage::new(4, 3);
        let bytes = tensor_from_rgb(&img);
        assert_eq!(bytes.len(), 4 * 3 * 3 * 2);
    }
}
