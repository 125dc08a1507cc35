//! Despeckling of binary page images
//!
//! Removes small, isolated blobs ("speckle") from a scanned page while
//! keeping marks that are either large on their own or close enough to a
//! large mark to plausibly belong to it: dots over letters, punctuation,
//! accents, thin strokes fragmented by binarization.
//!
//! The idea of the algorithm:
//!
//! - Connected components larger than a threshold are kept
//!   unconditionally.
//! - A component close enough to a kept component, with the kept one at
//!   least comparable in size, is kept as well. Keeping propagates along
//!   chains of components, so an accent can survive via the letter it
//!   sits on even when the letter itself only survives via a larger
//!   neighbor.
//!
//! Proximity is judged on a Voronoi partition of the page background:
//! two components are neighbors when their territories touch, and the
//! distance between them is measured between
//! the witness pixels seen across the shared boundary. A single Voronoi
//! pass can under-approximate the neighborhood of a component whose
//! territory is walled in by a small sibling, so a second pass with
//! frozen seeds rescues components occluded that way.
//!
//! # Example
//!
//! ```
//! use pagescrub_core::{BinaryImage, Dpi, NeverCancelled};
//! use pagescrub_region::despeckle::{Level, despeckle};
//!
//! // A lone pixel far away from everything is speckle.
//! let image = BinaryImage::from_fg_pixels(200, 200, &[(100, 100)]).unwrap();
//! let cleaned = despeckle(&image, Dpi::STANDARD, Level::Normal, &NeverCancelled, None).unwrap();
//! assert_eq!(cleaned.count_foreground(), 0);
//! ```

mod voronoi;

use std::collections::VecDeque;

use pagescrub_core::{
    BinaryImage, BinaryImageMut, DebugImages, Dpi, TaskStatus, clear_data_bit,
};
use tracing::debug;

use crate::conncomp::{Connectivity, ConnectivityMap};
use crate::error::RegionResult;
use voronoi::{ConnMap, Distance, voronoi, voronoi_distances, voronoi_special};

/// Despeckling aggressiveness presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Remove only clearly isolated specks.
    Cautious,
    /// The default trade-off.
    #[default]
    Normal,
    /// Remove everything that does not look attached to content.
    Aggressive,
}

/// Derived despeckling parameters.
///
/// Produced from a [`Level`] or a continuous strength value plus the
/// scan resolution; all three parameters scale with DPI so that a given
/// aggressiveness behaves the same on a 300 and a 600 DPI scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Multiplied by the pixel count of a component, gives the minimum
    /// pixel count of another component it may be attached to.
    pub min_relative_parent_weight: f64,

    /// Multiplied by the pixel count of a component, gives the maximum
    /// squared distance to another component it may be attached to.
    pub pixels_to_sq_dist: u32,

    /// The minimum width or height in pixels that by itself guarantees
    /// a component won't be removed.
    pub big_object_threshold: i32,
}

impl Settings {
    /// Derive settings from a discrete aggressiveness level.
    pub fn for_level(level: Level, dpi: Dpi) -> Settings {
        let dpi_factor = f64::from(dpi.min()) / 300.0;

        match level {
            Level::Cautious => Settings {
                min_relative_parent_weight: 0.125 * dpi_factor,
                pixels_to_sq_dist: 10.0f64.powi(2) as u32,
                big_object_threshold: (7.0 * dpi_factor).round() as i32,
            },
            Level::Normal => Settings {
                min_relative_parent_weight: 0.175 * dpi_factor,
                pixels_to_sq_dist: 6.5f64.powi(2) as u32,
                big_object_threshold: (12.0 * dpi_factor).round() as i32,
            },
            Level::Aggressive => Settings {
                min_relative_parent_weight: 0.225 * dpi_factor,
                pixels_to_sq_dist: 3.5f64.powi(2) as u32,
                big_object_threshold: (17.0 * dpi_factor).round() as i32,
            },
        }
    }

    /// Derive settings from a continuous strength value.
    ///
    /// Strengths 1.0, 2.0 and 3.0 correspond to [`Level::Cautious`],
    /// [`Level::Normal`] and [`Level::Aggressive`]; anything in between
    /// interpolates.
    pub fn for_strength(level: f64, dpi: Dpi) -> Settings {
        let dpi_factor = f64::from(dpi.min()) / 300.0;

        Settings {
            min_relative_parent_weight: (0.05 * level + 0.075) * dpi_factor,
            pixels_to_sq_dist: (0.25 * level * level - 4.25 * level + 14.0).powi(2) as u32,
            big_object_threshold: ((5.0 * level + 2.0) * dpi_factor).round() as i32,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Level {}
    impl Sealed for f64 {}
}

/// Despeckling aggressiveness: a discrete [`Level`] or a continuous
/// `f64` strength.
pub trait Strength: sealed::Sealed + Copy {
    /// Derive the despeckling parameters for this aggressiveness.
    fn settings(self, dpi: Dpi) -> Settings;
}

impl Strength for Level {
    fn settings(self, dpi: Dpi) -> Settings {
        Settings::for_level(self, dpi)
    }
}

impl Strength for f64 {
    fn settings(self, dpi: Dpi) -> Settings {
        Settings::for_strength(self, dpi)
    }
}

/// Per-component state.
///
/// `num_pixels` starts as the census pixel count and is later treated
/// as an attachment weight; the unified big component gets it saturated
/// to the page area so it qualifies as a parent for anything. The
/// anchor tags double as the visited marker during the final
/// reachability walk.
#[derive(Debug, Clone, Copy, Default)]
struct Component {
    num_pixels: u32,
    anchored_to_big: bool,
    anchored_to_small: bool,
}

impl Component {
    fn anchored_to_small_but_not_big(self) -> bool {
        self.anchored_to_small && !self.anchored_to_big
    }

    fn clear_tags(&mut self) {
        self.anchored_to_big = false;
        self.anchored_to_small = false;
    }
}

/// Inclusive bounding box accumulated during the census.
#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    top: i32,
    left: i32,
    bottom: i32,
    right: i32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            top: i32::MAX,
            left: i32::MAX,
            bottom: i32::MIN,
            right: i32::MIN,
        }
    }
}

impl BoundingBox {
    fn width(self) -> i32 {
        self.right - self.left + 1
    }

    fn height(self) -> i32 {
        self.bottom - self.top + 1
    }

    fn extend(&mut self, x: i32, y: i32) {
        self.top = self.top.min(y);
        self.left = self.left.min(x);
        self.bottom = self.bottom.max(y);
        self.right = self.right.max(x);
    }
}

/// A directed association: keeping `target` keeps `source`.
///
/// Sorted by target then source so that all associations of one target
/// form a contiguous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TargetSourceConn {
    target: u32,
    source: u32,
}

/// Tag the source component as anchored to a big or to a small
/// neighbor, or leave it untagged.
fn tag_source_component(
    components: &mut [Component],
    src: u32,
    tgt: u32,
    sqdist: u32,
    settings: &Settings,
) {
    let target_weight = components[tgt as usize].num_pixels;
    let source = &mut components[src as usize];

    if source.anchored_to_big {
        // No point in setting the small tag.
        return;
    }
    if u64::from(sqdist) > u64::from(source.num_pixels) * u64::from(settings.pixels_to_sq_dist) {
        // Too far.
        return;
    }

    if f64::from(target_weight) >= settings.min_relative_parent_weight * f64::from(source.num_pixels)
    {
        source.anchored_to_big = true;
    } else {
        source.anchored_to_small = true;
    }
}

/// Check if a component may be attached to another one.
///
/// Attaching preserves the attached component, provided the one it is
/// attached to is preserved itself.
fn can_be_attached_to(comp: Component, target: Component, sqdist: u32, settings: &Settings) -> bool {
    u64::from(sqdist) <= u64::from(comp.num_pixels) * u64::from(settings.pixels_to_sq_dist)
        && f64::from(target.num_pixels)
            >= f64::from(comp.num_pixels) * settings.min_relative_parent_weight
}

/// Despeckle a copy of the image and return it.
///
/// The input is left untouched; see [`despeckle_in_place`] for the
/// variant working on a mutable image, and [`Strength`] for the two
/// kinds of aggressiveness argument.
///
/// # Errors
///
/// Returns [`RegionError::Cancelled`](crate::RegionError::Cancelled)
/// when `status` reports a cancellation between two pipeline phases.
pub fn despeckle(
    src: &BinaryImage,
    dpi: Dpi,
    strength: impl Strength,
    status: &dyn TaskStatus,
    dbg: Option<&mut DebugImages>,
) -> RegionResult<BinaryImage> {
    let mut dst = src.to_mut();
    despeckle_in_place(&mut dst, dpi, strength, status, dbg)?;
    Ok(dst.into())
}

/// Despeckle an image in place.
///
/// On cancellation the image may be left in an intermediate state; no
/// rollback is attempted. Callers that need atomicity should run on a
/// copy, which is exactly what [`despeckle`] does.
///
/// # Errors
///
/// Returns [`RegionError::Cancelled`](crate::RegionError::Cancelled)
/// when `status` reports a cancellation between two pipeline phases.
pub fn despeckle_in_place(
    image: &mut BinaryImageMut,
    dpi: Dpi,
    strength: impl Strength,
    status: &dyn TaskStatus,
    dbg: Option<&mut DebugImages>,
) -> RegionResult<()> {
    let settings = strength.settings(dpi);
    debug!(
        ?settings,
        width = image.width(),
        height = image.height(),
        "despeckling"
    );
    despeckle_impl(image, &settings, status, dbg)
}

fn despeckle_impl(
    image: &mut BinaryImageMut,
    settings: &Settings,
    status: &dyn TaskStatus,
    mut dbg: Option<&mut DebugImages>,
) -> RegionResult<()> {
    let mut cmap = ConnectivityMap::from_mut_image(image, Connectivity::Eight);
    if cmap.max_label() == 0 {
        // Completely white image?
        return Ok(());
    }
    status.throw_if_cancelled()?;

    let width = image.width() as usize;
    let height = image.height() as usize;
    let stride = cmap.stride() as usize;
    let origin = cmap.data_offset();

    let mut components = vec![Component::default(); cmap.max_label() as usize + 1];
    let mut bounding_boxes = vec![BoundingBox::default(); cmap.max_label() as usize + 1];

    // Count the number of pixels and a bounding box of each component.
    {
        let labels = cmap.padded_data();
        for y in 0..height {
            for x in 0..width {
                let label = labels[origin + y * stride + x] as usize;
                components[label].num_pixels += 1;
                bounding_boxes[label].extend(x as i32, y as i32);
            }
        }
    }
    status.throw_if_cancelled()?;

    // Unify big components into one.
    let mut remapping_table = vec![0u32; components.len()];
    let mut unified_big_component = 0u32;
    let mut next_avail_component = 1u32;
    for label in 1..=cmap.max_label() {
        let bbox = bounding_boxes[label as usize];
        if bbox.width() < settings.big_object_threshold
            && bbox.height() < settings.big_object_threshold
        {
            components[next_avail_component as usize] = components[label as usize];
            remapping_table[label as usize] = next_avail_component;
            next_avail_component += 1;
        } else {
            if unified_big_component == 0 {
                unified_big_component = next_avail_component;
                next_avail_component += 1;
                components[unified_big_component as usize] = components[label as usize];
                // A weight this large makes can_be_attached_to() accept
                // the unified component as a parent for anything.
                components[unified_big_component as usize].num_pixels =
                    (width as u32).saturating_mul(height as u32);
            }
            remapping_table[label as usize] = unified_big_component;
        }
    }
    components.truncate(next_avail_component as usize);
    drop(bounding_boxes);
    status.throw_if_cancelled()?;

    let max_label = next_avail_component - 1;
    debug!(
        components = max_label,
        big = (unified_big_component != 0),
        "big components unified"
    );

    // Remap individual pixels.
    {
        let labels = cmap.padded_data_mut();
        for y in 0..height {
            for x in 0..width {
                let offset = origin + y * stride + x;
                labels[offset] = remapping_table[labels[offset] as usize];
            }
        }
    }
    cmap.set_max_label(max_label);
    if let Some(dbg) = dbg.as_deref_mut() {
        dbg.add("big_components_unified", cmap.visualized());
    }
    status.throw_if_cancelled()?;

    // Build a Voronoi diagram.
    let mut distance_matrix = voronoi(&mut cmap);
    if let Some(dbg) = dbg.as_deref_mut() {
        dbg.add("voronoi", cmap.visualized());
    }
    status.throw_if_cancelled()?;

    // The minimum distances between neighboring components.
    let mut conns = ConnMap::new();
    voronoi_distances(&cmap, &distance_matrix, &mut conns);
    status.throw_if_cancelled()?;

    // Tag components as anchored to a big or to a small neighbor.
    for (&conn, &sqdist) in &conns {
        tag_source_component(&mut components, conn.lesser, conn.greater, sqdist, settings);
        tag_source_component(&mut components, conn.greater, conn.lesser, sqdist, settings);
    }

    // Prevent the unified component from growing when the Voronoi
    // diagram is computed the second time.
    components[unified_big_component as usize].anchored_to_big = true;

    let have_anchored_to_small_but_not_big = components
        .iter()
        .any(|comp| comp.anchored_to_small_but_not_big());

    if have_anchored_to_small_but_not_big {
        status.throw_if_cancelled()?;

        // Give such components a second chance. Maybe they do have big
        // neighbors, but Voronoi territories of smaller ones block the
        // path to the bigger ones.
        let zero_distance = Distance::ZERO;
        let special_distance = Distance::SPECIAL;
        {
            let labels = cmap.padded_data();
            for y in 0..height {
                for x in 0..width {
                    let offset = origin + y * stride + x;
                    let label = labels[offset];
                    debug_assert_ne!(label, 0);

                    if !components[label as usize].anchored_to_small_but_not_big() {
                        if distance_matrix[offset] == zero_distance {
                            // Prevent this region from growing and from
                            // being taken over by another region.
                            distance_matrix[offset] = special_distance;
                        } else {
                            // Allow this region to be taken over by
                            // others. x + 1 is the padded x coordinate.
                            distance_matrix[offset] = Distance::reset(x as i32 + 1);
                        }
                    }
                }
            }
        }
        status.throw_if_cancelled()?;

        debug!("re-running propagation with frozen seeds");
        voronoi_special(&mut cmap, &mut distance_matrix);
        if let Some(dbg) = dbg.as_deref_mut() {
            dbg.add("voronoi_special", cmap.visualized());
        }
        status.throw_if_cancelled()?;

        // We've got new connections. Add them to the table.
        voronoi_distances(&cmap, &distance_matrix, &mut conns);
    }
    status.throw_if_cancelled()?;

    drop(distance_matrix);

    for comp in &mut components {
        comp.clear_tags();
    }

    // Build a directional connection list, keeping only the good
    // connections, that is those with a small enough distance.
    let mut target_source = Vec::new();
    for (conn, sqdist) in conns.drain() {
        let comp1 = components[conn.lesser as usize];
        let comp2 = components[conn.greater as usize];
        if can_be_attached_to(comp1, comp2, sqdist, settings) {
            target_source.push(TargetSourceConn {
                target: conn.greater,
                source: conn.lesser,
            });
        }
        if can_be_attached_to(comp2, comp1, sqdist, settings) {
            target_source.push(TargetSourceConn {
                target: conn.lesser,
                source: conn.greater,
            });
        }
    }
    target_source.sort_unstable();
    status.throw_if_cancelled()?;
    debug!(edges = target_source.len(), "attachment graph built");

    // An index for quick access to the group of connections with a
    // given target. Labels before the first target share its first
    // index; labels after the last one get the end of the list.
    let num_target_sources = target_source.len();
    let mut target_source_idx: Vec<usize> = Vec::with_capacity(max_label as usize + 1);
    for (i, conn) in target_source.iter().enumerate() {
        debug_assert_ne!(conn.target, 0);
        while target_source_idx.len() <= conn.target as usize {
            target_source_idx.push(i);
        }
    }
    while target_source_idx.len() <= max_label as usize {
        target_source_idx.push(num_target_sources);
    }

    // Components reachable from the unified big one are to be retained.
    let mut ok_labels = VecDeque::new();
    ok_labels.push_back(unified_big_component);
    while let Some(label) = ok_labels.pop_front() {
        let comp = &mut components[label as usize];
        if comp.anchored_to_big {
            continue;
        }
        comp.anchored_to_big = true;

        let mut idx = target_source_idx[label as usize];
        while idx < num_target_sources && target_source[idx].target == label {
            ok_labels.push_back(target_source[idx].source);
            idx += 1;
        }
    }
    status.throw_if_cancelled()?;

    debug!(
        retained = components[1..]
            .iter()
            .filter(|comp| comp.anchored_to_big)
            .count(),
        total = max_label,
        "reachability done"
    );

    // Remove unmarked components from the binary image.
    let image_stride = image.words_per_line() as usize;
    let labels = cmap.padded_data();
    let words = image.data_mut();
    for y in 0..height {
        let image_line = &mut words[y * image_stride..(y + 1) * image_stride];
        for x in 0..width {
            let label = labels[origin + y * stride + x] as usize;
            if !components[label].anchored_to_big {
                clear_data_bit(image_line, x as u32);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_level_table() {
        let normal = Settings::for_level(Level::Normal, Dpi::STANDARD);
        assert_eq!(normal.min_relative_parent_weight, 0.175);
        assert_eq!(normal.pixels_to_sq_dist, 42);
        assert_eq!(normal.big_object_threshold, 12);

        let cautious = Settings::for_level(Level::Cautious, Dpi::STANDARD);
        assert_eq!(cautious.min_relative_parent_weight, 0.125);
        assert_eq!(cautious.pixels_to_sq_dist, 100);
        assert_eq!(cautious.big_object_threshold, 7);

        let aggressive = Settings::for_level(Level::Aggressive, Dpi::STANDARD);
        assert_eq!(aggressive.min_relative_parent_weight, 0.225);
        assert_eq!(aggressive.pixels_to_sq_dist, 12);
        assert_eq!(aggressive.big_object_threshold, 17);
    }

    #[test]
    fn test_settings_strength_matches_levels() {
        for (level, strength) in [
            (Level::Cautious, 1.0),
            (Level::Normal, 2.0),
            (Level::Aggressive, 3.0),
        ] {
            let discrete = Settings::for_level(level, Dpi::STANDARD);
            let continuous = Settings::for_strength(strength, Dpi::STANDARD);
            assert_eq!(
                discrete.pixels_to_sq_dist, continuous.pixels_to_sq_dist,
                "strength {strength}"
            );
            assert_eq!(
                discrete.big_object_threshold, continuous.big_object_threshold,
                "strength {strength}"
            );
            assert!(
                (discrete.min_relative_parent_weight - continuous.min_relative_parent_weight).abs()
                    < 1e-12,
                "strength {strength}"
            );
        }
    }

    #[test]
    fn test_settings_scale_with_dpi() {
        let at_300 = Settings::for_level(Level::Normal, Dpi::STANDARD);
        let at_600 = Settings::for_level(Level::Normal, Dpi::new(600, 600));

        assert_eq!(at_600.big_object_threshold, 2 * at_300.big_object_threshold);
        assert_eq!(
            at_600.min_relative_parent_weight,
            2.0 * at_300.min_relative_parent_weight
        );
        // The distance budget does not scale with resolution.
        assert_eq!(at_600.pixels_to_sq_dist, at_300.pixels_to_sq_dist);

        // The smaller axis wins.
        let mixed = Settings::for_level(Level::Normal, Dpi::new(600, 300));
        assert_eq!(mixed.big_object_threshold, at_300.big_object_threshold);
    }

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::default();
        bbox.extend(5, 3);
        assert_eq!(bbox.width(), 1);
        assert_eq!(bbox.height(), 1);

        bbox.extend(2, 8);
        assert_eq!(bbox.width(), 4);
        assert_eq!(bbox.height(), 6);
    }

    #[test]
    fn test_can_be_attached_to() {
        let settings = Settings::for_level(Level::Normal, Dpi::STANDARD);
        let speck = Component {
            num_pixels: 1,
            ..Component::default()
        };
        let blob = Component {
            num_pixels: 2500,
            ..Component::default()
        };

        // Within the distance budget of one pixel (42).
        assert!(can_be_attached_to(speck, blob, 25, &settings));
        assert!(!can_be_attached_to(speck, blob, 64, &settings));

        // The blob has a much larger budget, but the speck is far too
        // light to serve as its parent.
        assert!(!can_be_attached_to(blob, speck, 25, &settings));
    }

    #[test]
    fn test_tag_source_component() {
        let settings = Settings::for_level(Level::Normal, Dpi::STANDARD);
        let mut components = vec![
            Component::default(),
            Component {
                num_pixels: 100,
                ..Component::default()
            },
            Component {
                num_pixels: 4,
                ..Component::default()
            },
            Component {
                num_pixels: 4000,
                ..Component::default()
            },
        ];

        // A neighbor below the weight ratio anchors to small...
        tag_source_component(&mut components, 1, 2, 9, &settings);
        assert!(components[1].anchored_to_small_but_not_big());

        // ...a heavy one promotes to big, and the promotion sticks.
        tag_source_component(&mut components, 1, 3, 9, &settings);
        assert!(components[1].anchored_to_big);
        tag_source_component(&mut components, 1, 2, 9, &settings);
        assert!(components[1].anchored_to_big);
        assert!(!components[1].anchored_to_small_but_not_big());

        // Too far away: no tag at all.
        tag_source_component(&mut components, 2, 3, 1_000_000, &settings);
        assert!(!components[2].anchored_to_big);
        assert!(!components[2].anchored_to_small);
    }

    #[test]
    fn test_target_source_ordering() {
        let mut conns = vec![
            TargetSourceConn {
                target: 2,
                source: 9,
            },
            TargetSourceConn {
                target: 1,
                source: 5,
            },
            TargetSourceConn {
                target: 2,
                source: 3,
            },
        ];
        conns.sort_unstable();
        assert_eq!(
            conns,
            [
                TargetSourceConn {
                    target: 1,
                    source: 5
                },
                TargetSourceConn {
                    target: 2,
                    source: 3
                },
                TargetSourceConn {
                    target: 2,
                    source: 9
                },
            ]
        );
    }
}
