//! Connectivity labeling
//!
//! Builds a dense label map of the connected components of a binary
//! image. The map carries a one-pixel zero border on every side so that
//! scan-based algorithms can read all four neighbors of any pixel
//! without bounds checks.

use pagescrub_core::{BinaryImage, BinaryImageMut, DebugImage, get_data_bit};
use tracing::debug;

/// Connectivity rule for component membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// 4-way connectivity (up, down, left, right)
    Four,
    /// 8-way connectivity (includes diagonals)
    Eight,
}

/// Union-Find data structure for efficient connected component labeling
struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // Slot 0 is a dummy so that provisional labels index directly.
        Self {
            parent: vec![0],
            rank: vec![0],
        }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        self.rank.push(0);
        label
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }

        let rank_x = self.rank[root_x as usize];
        let rank_y = self.rank[root_y as usize];
        if rank_x < rank_y {
            self.parent[root_x as usize] = root_y;
        } else if rank_x > rank_y {
            self.parent[root_y as usize] = root_x;
        } else {
            self.parent[root_y as usize] = root_x;
            self.rank[root_x as usize] += 1;
        }
    }
}

/// A dense component label map with a zero-padding border
///
/// Every pixel of the source image gets the label of its connected
/// component; background pixels and the one-pixel border around the
/// image get label 0. Labels are consecutive, starting at 1 in raster
/// order of first appearance, up to [`max_label`](Self::max_label).
///
/// The padded layout is (width + 2) x (height + 2) words with
/// `stride() == width + 2`; unpadded pixel (0, 0) lives at index
/// [`data_offset`](Self::data_offset) of the padded buffer.
///
/// # Examples
///
/// ```
/// use pagescrub_core::BinaryImage;
/// use pagescrub_region::{Connectivity, ConnectivityMap};
///
/// let image = BinaryImage::from_fg_pixels(10, 10, &[(1, 1), (2, 2), (7, 7)]).unwrap();
/// let cmap = ConnectivityMap::new(&image, Connectivity::Eight);
///
/// // The diagonal pair is one component under 8-way connectivity.
/// assert_eq!(cmap.max_label(), 2);
/// assert_eq!(cmap.label(1, 1), cmap.label(2, 2));
/// assert_ne!(cmap.label(1, 1), cmap.label(7, 7));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectivityMap {
    /// Padded (width + 2) x (height + 2) label grid
    data: Vec<u32>,
    width: u32,
    height: u32,
    max_label: u32,
}

impl ConnectivityMap {
    /// Label the connected components of a binary image.
    pub fn new(image: &BinaryImage, connectivity: Connectivity) -> Self {
        Self::build(
            image.width(),
            image.height(),
            image.words_per_line(),
            image.data(),
            connectivity,
        )
    }

    /// Label the connected components of a mutable binary image.
    pub fn from_mut_image(image: &BinaryImageMut, connectivity: Connectivity) -> Self {
        Self::build(
            image.width(),
            image.height(),
            image.words_per_line(),
            image.data(),
            connectivity,
        )
    }

    /// Two-pass union-find labeling over the padded grid.
    ///
    /// The first pass assigns provisional labels and records
    /// equivalences between touching runs; the second resolves the
    /// equivalences and compacts the labels in raster order.
    fn build(width: u32, height: u32, wpl: u32, words: &[u32], connectivity: Connectivity) -> Self {
        let w = width as usize;
        let h = height as usize;
        let wpl = wpl as usize;
        let stride = w + 2;

        let mut data = vec![0u32; stride * (h + 2)];
        let mut uf = UnionFind::new();

        for y in 0..h {
            let row = &words[y * wpl..(y + 1) * wpl];
            let row_base = (y + 1) * stride + 1;
            for x in 0..w {
                if !get_data_bit(row, x as u32) {
                    continue;
                }
                let off = row_base + x;

                // Already-labeled neighbors; the padding border reads as 0.
                let neighbors = match connectivity {
                    Connectivity::Four => [data[off - 1], data[off - stride], 0, 0],
                    Connectivity::Eight => [
                        data[off - 1],
                        data[off - stride - 1],
                        data[off - stride],
                        data[off - stride + 1],
                    ],
                };

                let mut min_label = 0u32;
                for label in neighbors {
                    if label != 0 && (min_label == 0 || label < min_label) {
                        min_label = label;
                    }
                }

                if min_label == 0 {
                    data[off] = uf.make_set();
                } else {
                    data[off] = min_label;
                    for label in neighbors {
                        if label != 0 {
                            uf.union(min_label, label);
                        }
                    }
                }
            }
        }

        // Resolve equivalences; compact to 1..=max_label in raster order.
        let mut remap = vec![0u32; uf.len()];
        let mut max_label = 0u32;
        for y in 1..=h {
            for x in 1..=w {
                let off = y * stride + x;
                let label = data[off];
                if label == 0 {
                    continue;
                }
                let root = uf.find(label) as usize;
                if remap[root] == 0 {
                    max_label += 1;
                    remap[root] = max_label;
                }
                data[off] = remap[root];
            }
        }

        debug!(width, height, max_label, "connectivity map built");

        ConnectivityMap {
            data,
            width,
            height,
            max_label,
        }
    }

    /// Get the unpadded image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the unpadded image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the padded row stride in words.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.width + 2
    }

    /// Get the largest label in use (0 for an all-background image).
    #[inline]
    pub fn max_label(&self) -> u32 {
        self.max_label
    }

    /// Replace the largest-label bookkeeping after an in-place relabeling.
    pub(crate) fn set_max_label(&mut self, max_label: u32) {
        self.max_label = max_label;
    }

    /// Get the padded label grid.
    #[inline]
    pub fn padded_data(&self) -> &[u32] {
        &self.data
    }

    /// Get mutable access to the padded label grid.
    #[inline]
    pub(crate) fn padded_data_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Index of unpadded pixel (0, 0) inside the padded buffer.
    #[inline]
    pub fn data_offset(&self) -> usize {
        self.stride() as usize + 1
    }

    /// Get the label of an unpadded pixel.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn label(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height);
        self.data[self.data_offset() + (y * self.stride() + x) as usize]
    }

    /// Render the labeling for debug capture.
    ///
    /// Background is white; every label gets a deterministic color.
    /// The exact palette is not part of any contract.
    pub fn visualized(&self) -> DebugImage {
        let w = self.width as usize;
        let h = self.height as usize;
        let stride = self.stride() as usize;
        let origin = self.data_offset();

        let mut pixels = vec![0xFFFF_FFFFu32; w * h];
        for y in 0..h {
            for x in 0..w {
                let label = self.data[origin + y * stride + x];
                if label != 0 {
                    pixels[y * w + x] = label_color(label);
                }
            }
        }

        DebugImage {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Deterministic per-label color, dark enough to stand out on white.
fn label_color(label: u32) -> u32 {
    let hash = label.wrapping_mul(0x9E37_79B9);
    let r = (hash >> 24) & 0xFF;
    let g = (hash >> 16) & 0xFF;
    let b = (hash >> 8) & 0xFF;
    0xFF00_0000 | (r.min(0xC0) << 16) | (g.min(0xC0) << 8) | b.min(0xC0)
}
