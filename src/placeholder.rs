use crate::error::Result;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 600;
const BORDER: u32 = 8;

/// Bytes written in place of a page whose image could not be fetched:
/// the configured file if there is one, otherwise a generated grey card.
pub fn load(custom: Option<&Path>) -> Result<Vec<u8>> {
    match custom {
        Some(path) => Ok(std::fs::read(path)?),
        None => generate(),
    }
}

/// A light grey page with a dark frame and a cross through it.
pub fn generate() -> Result<Vec<u8>> {
    let background = Rgb([224, 224, 224]);
    let ink = Rgb([96, 96, 96]);

    let image = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let on_border = x < BORDER || y < BORDER || x >= WIDTH - BORDER || y >= HEIGHT - BORDER;
        // Diagonals, using integer cross-multiplication against the aspect ratio.
        let down = (x * HEIGHT).abs_diff(y * WIDTH) < 3 * WIDTH;
        let up = (x * HEIGHT).abs_diff((HEIGHT - 1 - y) * WIDTH) < 3 * WIDTH;
        if on_border || down || up {
            ink
        } else {
            background
        }
    });

    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut bytes, ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn generated_placeholder_is_a_png() {
        let bytes = generate().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn custom_placeholder_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        std::fs::write(&path, b"custom").unwrap();
        assert_eq!(load(Some(&path)).unwrap(), b"custom");
        assert!(load(Some(&dir.path().join("nope.png"))).is_err());
    }
}
