use crate::metadata::{DecodedRgbaImage, MetadataRecord};

/// Decode a record's raw preview bytes into an RGBA8 buffer.
///
/// Failures are silent: the record keeps its raw bytes and `image` stays
/// `None`, so the UI can still hand the bytes to its own loader.
pub(crate) fn decode_preview_image(record: &mut MetadataRecord) {
    let Some(bytes) = record.image_data.as_deref() else {
        return;
    };
    let Ok(img) = image::load_from_memory(bytes) else {
        return;
    };
    let rgba = img.to_rgba8();
    record.image = Some(DecodedRgbaImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_bytes() {
        let mut record = MetadataRecord::new("a.png").with_image_bytes(tiny_png());
        decode_preview_image(&mut record);
        let decoded = record.image.unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 2));
        assert_eq!(decoded.rgba.len(), 16);
        assert_eq!(&decoded.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn garbage_bytes_fail_silently() {
        let mut record = MetadataRecord::new("a.png").with_image_bytes(vec![1, 2, 3]);
        decode_preview_image(&mut record);
        assert!(record.image.is_none());
        assert!(record.image_data.is_some());
    }
}
