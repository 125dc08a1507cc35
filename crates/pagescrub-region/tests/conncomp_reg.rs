//! Connectivity map regression test
//!
//! Verifies:
//! 1. 4-way and 8-way component counts on a structured page
//! 2. 8-way count <= 4-way count
//! 3. Label density and the padded layout contract

use pagescrub_core::BinaryImage;
use pagescrub_region::{Connectivity, ConnectivityMap};

/// A page with a grid of blocks plus a diagonal staircase that only
/// 8-way connectivity sees as one component.
fn test_page() -> BinaryImage {
    let mut pixels = Vec::new();
    for by in 0..4u32 {
        for bx in 0..5u32 {
            for y in 0..3 {
                for x in 0..3 {
                    pixels.push((5 + bx * 8 + x, 5 + by * 8 + y));
                }
            }
        }
    }
    for i in 0..6u32 {
        pixels.push((50 + i, 5 + i));
    }
    BinaryImage::from_fg_pixels(64, 40, &pixels).unwrap()
}

#[test]
fn conncomp_reg() {
    let page = test_page();

    let four = ConnectivityMap::new(&page, Connectivity::Four);
    let eight = ConnectivityMap::new(&page, Connectivity::Eight);

    // 20 blocks; the staircase is 6 components under 4-way and 1 under
    // 8-way connectivity.
    assert_eq!(four.max_label(), 26);
    assert_eq!(eight.max_label(), 21);
    assert!(eight.max_label() <= four.max_label());

    // Every label in 1..=max_label occurs somewhere.
    let mut seen = vec![false; eight.max_label() as usize + 1];
    for y in 0..page.height() {
        for x in 0..page.width() {
            let label = eight.label(x, y);
            assert_eq!(label != 0, page.get_pixel(x, y) == Some(true));
            seen[label as usize] = true;
        }
    }
    assert!(seen[1..].iter().all(|&s| s));
}

#[test]
fn padded_layout_contract() {
    let page = test_page();
    let cmap = ConnectivityMap::new(&page, Connectivity::Eight);

    assert_eq!(cmap.stride(), page.width() + 2);
    assert_eq!(cmap.data_offset(), cmap.stride() as usize + 1);
    assert_eq!(
        cmap.padded_data().len(),
        (page.width() as usize + 2) * (page.height() as usize + 2)
    );

    // The unpadded view through the padded buffer agrees with label().
    let stride = cmap.stride() as usize;
    let origin = cmap.data_offset();
    for y in 0..page.height() as usize {
        for x in 0..page.width() as usize {
            assert_eq!(
                cmap.padded_data()[origin + y * stride + x],
                cmap.label(x as u32, y as u32)
            );
        }
    }
}
