//! # Map Image
//!
//! The occupancy map the robot localises against, loaded from an image file. Light pixels are free
//! space, dark pixels are obstacles.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pixels strictly brighter than this are free space.
pub const FREE_THRESHOLD: u8 = 127;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MapImage {
    path: PathBuf,
    image: GrayImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Could not load the map image {0:?}: {1}")]
    LoadError(PathBuf, image::ImageError),

    #[error("The map image {0:?} is empty")]
    EmptyImage(PathBuf),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MapImage {
    /// Load a map image from disk, converting it to 8 bit greyscale.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();

        let image = image::open(&path)
            .map_err(|e| MapError::LoadError(path.clone(), e))?
            .to_luma8();

        Self::from_image(path, image)
    }

    /// Build a map from an image already in memory. `path` is only kept for reporting.
    pub fn from_image<P: AsRef<Path>>(path: P, image: GrayImage) -> Result<Self, MapError> {
        let path = path.as_ref().to_path_buf();

        if image.width() == 0 || image.height() == 0 {
            return Err(MapError::EmptyImage(path));
        }

        Ok(Self { path, image })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Return whether the pixel at `(x, y)` is free space. Pixels outside the image are not free.
    pub fn is_free(&self, x: u32, y: u32) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }

        let Luma([value]) = *self.image.get_pixel(x, y);
        value > FREE_THRESHOLD
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_image() -> GrayImage {
        // Dark border around a light interior
        GrayImage::from_fn(4, 3, |x, y| {
            if x == 0 || y == 0 || x == 3 || y == 2 {
                Luma([0])
            } else if x == 2 {
                Luma([FREE_THRESHOLD])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_is_free() {
        let map = MapImage::from_image("mem.png", test_image()).unwrap();

        assert_eq!((map.width(), map.height()), (4, 3));
        assert_eq!(map.path(), Path::new("mem.png"));

        assert!(map.is_free(1, 1));
        assert!(!map.is_free(2, 1));
        assert!(!map.is_free(0, 0));
        assert!(!map.is_free(4, 1));
        assert!(!map.is_free(1, 3));
    }

    #[test]
    fn test_empty_image() {
        assert!(matches!(
            MapImage::from_image("empty.png", GrayImage::new(0, 0)),
            Err(MapError::EmptyImage(_))
        ));
    }

    #[test]
    fn test_load() {
        let mut path = std::env::temp_dir();
        path.push(format!("laser_loc_map_test_{}.png", std::process::id()));
        test_image().save(&path).unwrap();

        let map = MapImage::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((map.width(), map.height()), (4, 3));
        assert!(map.is_free(1, 1));

        assert!(matches!(
            MapImage::load("/nonexistent/laser_loc_map.png"),
            Err(MapError::LoadError(_, _))
        ));
    }

    #[test]
    fn test_shipped_map() {
        let map = MapImage::load(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/map.pgm")).unwrap();

        assert_eq!((map.width(), map.height()), (100, 100));
        assert!(!map.is_free(0, 0));
        assert!(map.is_free(50, 50));
        assert!(!map.is_free(25, 65));
    }
}
