use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::Object;

use crate::error::{ErrorKind, SessionError};
use crate::options::OptionList;

/// The option keys understood by `load_image`.
pub const IMAGE_KEYS: &[&str] = &["ignoremask", "interpolate"];

/// The low-level image representation for a PDF document.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// Either `DeviceGray` or `DeviceRGB`.
    pub color_space: &'static str,
    /// Should the image be interpolated when scaled?
    pub interpolate: bool,
    /// The samples of the image, or the original JPEG stream when `is_jpeg` is set.
    pub image_data: Vec<u8>,
    /// Whether `image_data` is DCT-encoded and can be passed through untouched.
    pub is_jpeg: bool,
    /// The alpha channel as 8-bit gray samples, if the image is transparent and the
    /// transparency is not ignored.
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Decodes an image of the given type (`auto` to detect it from the data).
    pub fn from_bytes(image_type: &str, data: &[u8], options: &OptionList) -> Result<ImageXObject, SessionError> {
        let ignore_mask = options.boolean("ignoremask")?.unwrap_or(false);
        let interpolate = options.boolean("interpolate")?.unwrap_or(false);

        let format = match image_type.to_lowercase().as_str() {
            "auto" => image::guess_format(data).map_err(|error| {
                SessionError::with_error(ErrorKind::Format, "Unable to recognize the image type", &error)
            })?,
            "png" => ImageFormat::Png,
            "jpeg" | "jpg" => ImageFormat::Jpeg,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" => ImageFormat::Tiff,
            _ => {
                return Err(SessionError::argument(format!(
                    "Unsupported image type {:?}",
                    image_type
                )))
            }
        };
        let decoded = image::load_from_memory_with_format(data, format).map_err(|error| {
            SessionError::with_error(
                ErrorKind::Format,
                format!("Failed to decode the image as {:?}", format),
                &error,
            )
        })?;
        log::trace!(
            "Decoded a {}x{} {:?} image of type {:?}",
            decoded.width(),
            decoded.height(),
            decoded.color(),
            format
        );

        let is_gray = matches!(
            decoded.color(),
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
        );
        let color_space = if is_gray { "DeviceGray" } else { "DeviceRGB" };

        // Opaque 8-bit JPEG files are embedded as they are
        if format == ImageFormat::Jpeg && matches!(decoded.color(), ColorType::L8 | ColorType::Rgb8) {
            return Ok(ImageXObject {
                width: decoded.width(),
                height: decoded.height(),
                color_space,
                interpolate,
                image_data: data.to_vec(),
                is_jpeg: true,
                soft_mask: None,
            });
        }

        let soft_mask = (decoded.color().has_alpha() && !ignore_mask)
            .then(|| alpha_channel(&decoded))
            .filter(|alpha| alpha.iter().any(|sample| *sample < 255));
        let image_data = if is_gray {
            decoded.to_luma8().into_raw()
        } else {
            decoded.to_rgb8().into_raw()
        };

        Ok(ImageXObject {
            width: decoded.width(),
            height: decoded.height(),
            color_space,
            interpolate,
            image_data,
            is_jpeg: false,
            soft_mask,
        })
    }

    /// Adds the image (and its soft mask) to the document, returning the image object.
    pub(crate) fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::ObjectId {
        let mut dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", Object::Name("XObject".into())),
            ("Subtype", Object::Name("Image".into())),
            ("Width", Object::Integer(i64::from(self.width))),
            ("Height", Object::Integer(i64::from(self.height))),
            ("ColorSpace", Object::Name(self.color_space.into())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Interpolate", Object::Boolean(self.interpolate)),
        ]);

        if let Some(soft_mask) = &self.soft_mask {
            let mask_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", Object::Name("XObject".into())),
                ("Subtype", Object::Name("Image".into())),
                ("Width", Object::Integer(i64::from(self.width))),
                ("Height", Object::Integer(i64::from(self.height))),
                ("ColorSpace", Object::Name("DeviceGray".into())),
                ("BitsPerComponent", Object::Integer(8)),
            ]);
            let mask_id =
                inner_document.add_object(lopdf::Stream::new(mask_dictionary, soft_mask.clone()));
            dictionary.set("SMask", Object::Reference(mask_id));
        }

        let stream = if self.is_jpeg {
            dictionary.set("Filter", Object::Name("DCTDecode".into()));
            // The data is compressed already
            lopdf::Stream::new(dictionary, self.image_data.clone()).with_compression(false)
        } else {
            lopdf::Stream::new(dictionary, self.image_data.clone())
        };
        inner_document.add_object(stream)
    }
}

fn alpha_channel(image: &DynamicImage) -> Vec<u8> {
    image
        .to_rgba8()
        .pixels()
        .map(|pixel| pixel.0[3])
        .collect()
}
