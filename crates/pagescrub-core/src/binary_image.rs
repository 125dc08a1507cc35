//! Binary image container
//!
//! `BinaryImage` is the one-bit-per-pixel raster that page processing
//! operates on.
//!
//! # Pixel layout
//!
//! - Image data is stored in 32-bit words
//! - Every row starts on a 32-bit boundary
//! - Pixels are packed MSB to LSB within each word
//! - A set bit is a foreground (black) pixel
//! - Padding bits past `width` in the last word of a row are kept zero
//!
//! # Ownership model
//!
//! `BinaryImage` uses `Arc` for efficient cloning (shared ownership).
//! To modify pixel data, convert to `BinaryImageMut` via
//! [`BinaryImage::try_into_mut`] or [`BinaryImage::to_mut`], then convert
//! back with `Into<BinaryImage>`.

use crate::error::{Error, Result};
use std::sync::Arc;

/// Internal image data
#[derive(Debug)]
struct ImageData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// 32-bit words per line
    wpl: u32,
    /// The image data (packed 32-bit words)
    data: Vec<u32>,
}

impl ImageData {
    fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let wpl = width.div_ceil(32);
        let data = vec![0u32; (wpl as usize) * (height as usize)];
        Ok(ImageData {
            width,
            height,
            wpl,
            data,
        })
    }
}

/// A one-bit-per-pixel image
///
/// # Examples
///
/// ```
/// use pagescrub_core::BinaryImage;
///
/// let image = BinaryImage::new(100, 50).unwrap();
/// assert_eq!(image.get_pixel(10, 10), Some(false));
/// ```
#[derive(Debug, Clone)]
pub struct BinaryImage {
    inner: Arc<ImageData>,
}

impl BinaryImage {
    /// Create a new all-background image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(BinaryImage {
            inner: Arc::new(ImageData::new(width, height)?),
        })
    }

    /// Create an image with the given foreground pixels set.
    ///
    /// Convenience for tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are invalid or any coordinate
    /// is out of bounds.
    pub fn from_fg_pixels(width: u32, height: u32, pixels: &[(u32, u32)]) -> Result<Self> {
        let mut image = BinaryImage::new(width, height)?.try_into_mut().unwrap_or_else(|i| i.to_mut());
        for &(x, y) in pixels {
            image.set_pixel(x, y, true)?;
        }
        Ok(image.into())
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the number of 32-bit words per line.
    #[inline]
    pub fn words_per_line(&self) -> u32 {
        self.inner.wpl
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &self.inner.data[start..end]
    }

    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(get_data_bit(self.row_data(y), x))
    }

    /// Count the foreground pixels of the whole image.
    pub fn count_foreground(&self) -> u64 {
        self.inner
            .data
            .iter()
            .map(|word| u64::from(word.count_ones()))
            .sum()
    }

    /// Get the number of strong references to this image.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<BinaryImageMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(BinaryImageMut { inner: data }),
            Err(arc) => Err(BinaryImage { inner: arc }),
        }
    }

    /// Create a mutable copy of this image.
    ///
    /// Always creates a new copy that can be modified.
    pub fn to_mut(&self) -> BinaryImageMut {
        BinaryImageMut {
            inner: ImageData {
                width: self.inner.width,
                height: self.inner.height,
                wpl: self.inner.wpl,
                data: self.inner.data.clone(),
            },
        }
    }
}

impl PartialEq for BinaryImage {
    fn eq(&self, other: &Self) -> bool {
        self.inner.width == other.inner.width
            && self.inner.height == other.inner.height
            && self.inner.data == other.inner.data
    }
}

impl Eq for BinaryImage {}

/// Mutable binary image
///
/// Allows modification of pixel data. Convert back to an immutable
/// [`BinaryImage`] using `Into<BinaryImage>`.
#[derive(Debug)]
pub struct BinaryImageMut {
    inner: ImageData,
}

impl BinaryImageMut {
    /// Create a new all-background mutable image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(BinaryImageMut {
            inner: ImageData::new(width, height)?,
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the number of 32-bit words per line.
    #[inline]
    pub fn words_per_line(&self) -> u32 {
        self.inner.wpl
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable raw access to the image data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &self.inner.data[start..end]
    }

    /// Get mutable access to the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &mut self.inner.data[start..end]
    }

    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(get_data_bit(self.row_data(y), x))
    }

    /// Set a pixel value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the coordinates are out of
    /// bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, foreground: bool) -> Result<()> {
        if x >= self.width() {
            return Err(Error::IndexOutOfBounds {
                index: x as usize,
                len: self.width() as usize,
            });
        }
        if y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                index: y as usize,
                len: self.height() as usize,
            });
        }
        let row = self.row_data_mut(y);
        if foreground {
            set_data_bit(row, x);
        } else {
            clear_data_bit(row, x);
        }
        Ok(())
    }

    /// Count the foreground pixels of the whole image.
    pub fn count_foreground(&self) -> u64 {
        self.inner
            .data
            .iter()
            .map(|word| u64::from(word.count_ones()))
            .sum()
    }

    /// Clear all pixels to background.
    pub fn clear(&mut self) {
        self.inner.data.fill(0);
    }
}

impl From<BinaryImageMut> for BinaryImage {
    fn from(image: BinaryImageMut) -> Self {
        BinaryImage {
            inner: Arc::new(image.inner),
        }
    }
}

/// Get a 1-bit pixel value from a row buffer.
///
/// Pixels are packed MSB to LSB within each 32-bit word.
#[inline]
pub fn get_data_bit(line: &[u32], x: u32) -> bool {
    let word_index = (x >> 5) as usize;
    let bit_index = 31 - (x & 31);
    (line[word_index] >> bit_index) & 1 != 0
}

/// Set a 1-bit pixel in a row buffer to foreground.
#[inline]
pub fn set_data_bit(line: &mut [u32], x: u32) {
    let word_index = (x >> 5) as usize;
    let bit_index = 31 - (x & 31);
    line[word_index] |= 1 << bit_index;
}

/// Clear a 1-bit pixel in a row buffer to background.
#[inline]
pub fn clear_data_bit(line: &mut [u32], x: u32) {
    let word_index = (x >> 5) as usize;
    let bit_index = 31 - (x & 31);
    line[word_index] &= !(1 << bit_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let image = BinaryImage::new(100, 200).unwrap();
        assert_eq!(image.width(), 100);
        assert_eq!(image.height(), 200);
        // 100 pixels need 4 words per line
        assert_eq!(image.words_per_line(), 4);
        assert_eq!(image.data().len(), 4 * 200);
    }

    #[test]
    fn test_creation_invalid() {
        assert!(BinaryImage::new(0, 100).is_err());
        assert!(BinaryImage::new(100, 0).is_err());
    }

    #[test]
    fn test_wpl_boundaries() {
        assert_eq!(BinaryImage::new(32, 1).unwrap().words_per_line(), 1);
        assert_eq!(BinaryImage::new(33, 1).unwrap().words_per_line(), 2);
        assert_eq!(BinaryImage::new(64, 1).unwrap().words_per_line(), 2);
    }

    #[test]
    fn test_msb_first_packing() {
        let mut image = BinaryImageMut::new(40, 2).unwrap();
        image.set_pixel(0, 0, true).unwrap();
        image.set_pixel(31, 0, true).unwrap();
        image.set_pixel(32, 0, true).unwrap();

        // Pixel 0 is the most significant bit of the first word.
        assert_eq!(image.row_data(0)[0], 0x8000_0001);
        assert_eq!(image.row_data(0)[1], 0x8000_0000);
        assert_eq!(image.row_data(1)[0], 0);
    }

    #[test]
    fn test_get_set_clear() {
        let mut image = BinaryImageMut::new(10, 10).unwrap();
        assert_eq!(image.get_pixel(5, 5), Some(false));

        image.set_pixel(5, 5, true).unwrap();
        assert_eq!(image.get_pixel(5, 5), Some(true));
        assert_eq!(image.count_foreground(), 1);

        image.set_pixel(5, 5, false).unwrap();
        assert_eq!(image.get_pixel(5, 5), Some(false));
        assert_eq!(image.count_foreground(), 0);

        assert!(image.set_pixel(10, 5, true).is_err());
        assert!(image.set_pixel(5, 10, true).is_err());
        assert_eq!(image.get_pixel(10, 5), None);
    }

    #[test]
    fn test_from_fg_pixels() {
        let image = BinaryImage::from_fg_pixels(20, 10, &[(0, 0), (19, 9), (7, 3)]).unwrap();
        assert_eq!(image.count_foreground(), 3);
        assert_eq!(image.get_pixel(0, 0), Some(true));
        assert_eq!(image.get_pixel(19, 9), Some(true));
        assert_eq!(image.get_pixel(7, 3), Some(true));
        assert_eq!(image.get_pixel(1, 1), Some(false));

        assert!(BinaryImage::from_fg_pixels(20, 10, &[(20, 0)]).is_err());
    }

    #[test]
    fn test_clone_shares_data() {
        let image1 = BinaryImage::new(100, 100).unwrap();
        let image2 = image1.clone();

        assert_eq!(image1.ref_count(), 2);
        assert_eq!(image1.data().as_ptr(), image2.data().as_ptr());
    }

    #[test]
    fn test_mut_round_trip() {
        let image = BinaryImage::new(50, 50).unwrap();
        let mut image_mut = image.try_into_mut().unwrap();
        image_mut.set_pixel(10, 20, true).unwrap();

        let image: BinaryImage = image_mut.into();
        assert_eq!(image.get_pixel(10, 20), Some(true));
    }

    #[test]
    fn test_try_into_mut_fails_when_shared() {
        let image1 = BinaryImage::new(10, 10).unwrap();
        let _image2 = image1.clone();
        assert!(image1.try_into_mut().is_err());
    }

    #[test]
    fn test_to_mut_copies() {
        let image = BinaryImage::new(10, 10).unwrap();
        let mut copy = image.to_mut();
        copy.set_pixel(3, 3, true).unwrap();

        assert_eq!(image.get_pixel(3, 3), Some(false));
        assert_eq!(copy.get_pixel(3, 3), Some(true));
    }

    #[test]
    fn test_equality() {
        let a = BinaryImage::from_fg_pixels(10, 10, &[(1, 2)]).unwrap();
        let b = BinaryImage::from_fg_pixels(10, 10, &[(1, 2)]).unwrap();
        let c = BinaryImage::from_fg_pixels(10, 10, &[(2, 1)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_padding_bits_stay_zero() {
        // Width 33: one pixel in the second word, 31 padding bits.
        let mut image = BinaryImageMut::new(33, 1).unwrap();
        for x in 0..33 {
            image.set_pixel(x, 0, true).unwrap();
        }
        assert_eq!(image.row_data(0)[0], 0xFFFF_FFFF);
        assert_eq!(image.row_data(0)[1], 0x8000_0000);
        assert_eq!(image.count_foreground(), 33);
    }
}
