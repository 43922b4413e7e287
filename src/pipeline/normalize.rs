use crate::config::DatasetConfig;
use crate::constants;
use crate::error::{DatasetError, Result};
use crate::storage::write_manifest;
use crate::types::{ManifestEntry, Split, TargetSize};
use image::imageops::{self, FilterType};
use image::DynamicImage;
use metrics::counter;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use super::label;

/// Resizes to exactly `size` and converts to 8 bits per channel.
///
/// Grayscale sources stay single-channel; anything with colour becomes RGB.
/// Alpha is dropped. The triangle filter widens with the scale factor when
/// shrinking, which gives the anti-aliased result.
pub fn resize_to_u8(img: &DynamicImage, size: TargetSize) -> DynamicImage {
    let (w, h) = (size.width, size.height);
    if img.color().has_color() {
        DynamicImage::ImageRgb8(imageops::resize(&img.to_rgb8(), w, h, FilterType::Triangle))
    } else {
        DynamicImage::ImageLuma8(imageops::resize(&img.to_luma8(), w, h, FilterType::Triangle))
    }
}

/// Reads `src`, normalizes it and writes it to `dst` in the format implied by
/// the extension of `dst`.
pub fn normalize_image(src: &Path, dst: &Path, size: TargetSize) -> Result<()> {
    if !src.is_file() {
        return Err(DatasetError::MissingSource(src.to_path_buf()));
    }
    let img = image::open(src)?;
    let out = resize_to_u8(&img, size);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    out.save(dst)?;
    debug!("{} -> {}", src.display(), dst.display());
    Ok(())
}

/// Normalizes every manifest row from `images_dir` into `processed_dir`,
/// keeping relative paths.
pub fn process_images(
    entries: &[ManifestEntry],
    images_dir: &Path,
    processed_dir: &Path,
    size: TargetSize,
) -> Result<usize> {
    let total = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        normalize_image(
            &images_dir.join(&entry.path),
            &processed_dir.join(&entry.path),
            size,
        )?;
        counter!("fgnet_images_processed_total").increment(1);
        if (i + 1) % constants::PROGRESS_EVERY == 0 {
            info!("Processing images: {}/{}", i + 1, total);
        }
    }
    info!("Processed {} images to {}", total, size);
    Ok(total)
}

/// Labels the raw images, writes `fgnet.csv`, then writes the resized copies.
///
/// The manifest is written before any image so a failed run leaves it behind
/// for inspection; completion is tracked separately by the stage sentinel.
#[instrument(skip(config), fields(root = %config.root.display()))]
pub fn process(config: &DatasetConfig) -> Result<Vec<ManifestEntry>> {
    let images_dir = config.images_dir();
    let processed_dir = config.processed_dir();

    let entries = label::load_data(&images_dir, &config.categories)?;
    fs::create_dir_all(&processed_dir)?;
    write_manifest(&config.manifest_path(Split::Full), &entries)?;

    process_images(&entries, &images_dir, &processed_dir, config.target_size)?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Luma, Rgb, Rgba};
    use tempfile::tempdir;

    #[test]
    fn test_color_image_becomes_rgb8_at_target_size() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(300, 200, Rgba([10, 20, 30, 255])));
        let out = resize_to_u8(&img, TargetSize { height: 64, width: 32 });
        assert_eq!(out.dimensions(), (32, 64));
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_gray16_image_becomes_luma8() {
        let img = DynamicImage::ImageLuma16(ImageBuffer::from_pixel(10, 10, Luma([65535u16])));
        let out = resize_to_u8(&img, TargetSize { height: 20, width: 20 });
        assert_eq!(out.dimensions(), (20, 20));
        match out {
            DynamicImage::ImageLuma8(buf) => assert_eq!(buf.get_pixel(5, 5)[0], 255),
            other => panic!("unexpected color type {:?}", other.color()),
        }
    }

    #[test]
    fn test_normalize_writes_nested_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("001A02.png");
        ImageBuffer::from_pixel(50, 70, Rgb([200u8, 100, 0])).save(&src).unwrap();

        let dst = dir.path().join("out/sub/001A02.png");
        normalize_image(&src, &dst, TargetSize::default()).unwrap();

        let written = image::open(&dst).unwrap();
        assert_eq!(written.dimensions(), (128, 128));
        assert!(matches!(written, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_missing_source_is_reported() {
        let dir = tempdir().unwrap();
        let err = normalize_image(
            &dir.path().join("001A02.png"),
            &dir.path().join("out.png"),
            TargetSize::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::MissingSource(_)));
    }
}
