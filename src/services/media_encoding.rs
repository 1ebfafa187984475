//! Shrink-until-it-fits JPEG encoding for image uploads.
//!
//! Images are decoded, rotated upright from their EXIF orientation, flattened to
//! RGB, then re-encoded with a decreasing size bound and JPEG quality until the
//! base64 text fits the per-record budget or the floors are reached.

use std::{borrow::Cow, io::Cursor};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{
    DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder,
    imageops::FilterType,
};
use thiserror::Error;

use crate::config::MediaEncodingConfig;

/// Failure while re-encoding an image.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The bytes are not a decodable image.
    #[error("failed to decode image")]
    Decode(#[source] ImageError),
    /// The JPEG encoder failed.
    #[error("failed to encode image")]
    Encode(#[source] ImageError),
}

/// One pass of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingAttempt {
    /// Bounding box side the image was fitted into.
    pub width: u32,
    /// JPEG quality used.
    pub quality: u8,
    /// Length of the base64 text produced.
    pub encoded_size: usize,
}

/// Output of [`encode_within_budget`]: the last attempt and its history.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64 text of the last attempt.
    pub payload: String,
    /// Every attempt, in order.
    pub attempts: Vec<EncodingAttempt>,
    /// Whether `payload` is strictly under the budget.
    pub fits: bool,
}

impl EncodedImage {
    /// Length of the base64 payload.
    pub fn encoded_size(&self) -> usize {
        self.payload.len()
    }
}

/// Whether the bytes start like an image this build can decode.
///
/// Magic numbers alone are not enough: `P1` text looks like PNM, and TIFF or
/// ICO headers are recognised even though their decoders are not compiled in.
/// The header must also parse.
pub fn is_image(bytes: &[u8]) -> bool {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .filter(|reader| reader.format().is_some_and(|format| format.reading_enabled()))
        .is_some_and(|reader| reader.into_decoder().is_ok())
}

/// Base64 text of a payload stored without re-encoding.
pub fn encode_raw(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode `bytes`, apply the EXIF orientation and drop any alpha channel.
pub fn normalize(bytes: &[u8]) -> Result<DynamicImage, MediaError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| MediaError::Decode(ImageError::IoError(err)))?;
    let mut decoder = reader.into_decoder().map_err(MediaError::Decode)?;
    let orientation = decoder.orientation().map_err(MediaError::Decode)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(MediaError::Decode)?;
    image.apply_orientation(orientation);
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Run the shrinking loop over an already normalised image.
///
/// Each pass fits the image into a `width`×`width` box (never upscaling), encodes
/// it as JPEG at `quality` and measures the base64 length. Width and quality then
/// drop by their steps; the loop stops before either would fall below its floor.
pub fn encode_within_budget(
    image: &DynamicImage,
    config: &MediaEncodingConfig,
) -> Result<EncodedImage, MediaError> {
    let mut width = config.initial_width.max(1);
    let mut quality = config.initial_quality.clamp(1, 100);
    let mut attempts = Vec::new();

    loop {
        let fitted = fit_within(image, width);
        let payload = encode_jpeg(&fitted, quality)?;
        attempts.push(EncodingAttempt {
            width,
            quality,
            encoded_size: payload.len(),
        });

        if payload.len() < config.budget {
            return Ok(EncodedImage {
                payload,
                attempts,
                fits: true,
            });
        }

        let next_width = width
            .checked_sub(config.width_step)
            .filter(|next| *next >= config.min_width && *next > 0);
        let next_quality = quality
            .checked_sub(config.quality_step)
            .filter(|next| *next >= config.min_quality && *next > 0);
        match (next_width, next_quality) {
            (Some(next_width), Some(next_quality)) => {
                width = next_width;
                quality = next_quality;
            }
            _ => {
                return Ok(EncodedImage {
                    payload,
                    attempts,
                    fits: false,
                });
            }
        }
    }
}

fn fit_within(image: &DynamicImage, bound: u32) -> Cow<'_, DynamicImage> {
    if image.width() <= bound && image.height() <= bound {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image.resize(bound, bound, FilterType::Triangle))
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<String, MediaError> {
    let rgb = match image.as_rgb8() {
        Some(rgb) => Cow::Borrowed(rgb),
        None => Cow::Owned(image.to_rgb8()),
    };
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&*rgb)
        .map_err(MediaError::Encode)?;
    Ok(STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Pseudo-random pixels compress badly, forcing the loop to iterate.
    fn noisy(width: u32, height: u32) -> DynamicImage {
        let mut state = 0x2545_f491_u32;
        let image = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn small_image_fits_on_first_attempt_without_upscaling() {
        let image = normalize(&png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            40,
            30,
            Rgb([10, 120, 200]),
        ))))
        .unwrap();
        let encoded = encode_within_budget(&image, &MediaEncodingConfig::default()).unwrap();

        assert!(encoded.fits);
        assert_eq!(encoded.attempts.len(), 1);
        assert_eq!(encoded.attempts[0].width, 800);
        assert_eq!(encoded.attempts[0].quality, 70);

        let jpeg = STANDARD.decode(&encoded.payload).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn large_noisy_image_is_shrunk_until_it_fits() {
        let image = noisy(1200, 900);
        let config = MediaEncodingConfig {
            budget: 60_000,
            ..MediaEncodingConfig::default()
        };
        let encoded = encode_within_budget(&image, &config).unwrap();

        assert!(encoded.fits);
        assert!(encoded.attempts.len() > 1);
        assert!(encoded.encoded_size() < config.budget);
        let last = encoded.attempts.last().unwrap();
        assert_eq!(last.encoded_size, encoded.encoded_size());
        for pair in encoded.attempts.windows(2) {
            assert_eq!(pair[0].width - 100, pair[1].width);
            assert_eq!(pair[0].quality - 10, pair[1].quality);
        }

        let jpeg = STANDARD.decode(&encoded.payload).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert!(decoded.width() <= last.width && decoded.height() <= last.width);
        assert_eq!(decoded.width() * 3, decoded.height() * 4);
    }

    #[test]
    fn unreachable_budget_stops_at_the_floor() {
        let image = noisy(300, 300);
        let config = MediaEncodingConfig {
            budget: 10,
            ..MediaEncodingConfig::default()
        };
        let encoded = encode_within_budget(&image, &config).unwrap();

        assert!(!encoded.fits);
        let trail = encoded
            .attempts
            .iter()
            .map(|attempt| (attempt.width, attempt.quality))
            .collect::<Vec<_>>();
        assert_eq!(
            trail,
            [
                (800, 70),
                (700, 60),
                (600, 50),
                (500, 40),
                (400, 30),
                (300, 20),
                (200, 10)
            ]
        );
        assert!(encoded.encoded_size() >= config.budget);
    }

    #[test]
    fn alpha_is_dropped_during_normalisation() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 10]));
        let normalized = normalize(&png_bytes(DynamicImage::ImageRgba8(image))).unwrap();
        assert!(matches!(normalized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn non_rgb_input_is_still_encoded() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([128])));
        let payload = encode_jpeg(&gray, 50).unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn magic_numbers_without_a_decodable_header_are_not_images() {
        for bytes in [
            &b"P1 scored twice"[..],
            b"P6 half time",
            b"II*\0\x08\0\0\0 tiff header",
            b"\0\0\x01\0\x01\0 ico header",
            b"qoif\0\0\0\x10",
        ] {
            assert!(!is_image(bytes), "{bytes:?}");
        }
    }

    #[test]
    fn non_images_are_detected() {
        assert!(!is_image(b"%PDF-1.7 not an image"));
        assert!(is_image(&png_bytes(noisy(2, 2))));
        assert!(matches!(
            normalize(b"plain text"),
            Err(MediaError::Decode(_))
        ));
        assert_eq!(encode_raw(b"abc"), "YWJj");
    }
}
