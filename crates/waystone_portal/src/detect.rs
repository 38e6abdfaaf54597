//! Portal site discovery.
//!
//! A portal surface is planar and vertical, so detection is a 2-D scanline
//! flood fill along one horizontal axis and up. It starts on the bottom row
//! (the build markers) and only ever climbs.

use glam::IVec3;
use rustc_hash::FxHashSet;
use tracing::debug;
use waystone_shared::block::{is_build_marker, is_portal_surface, BlockId};
use waystone_shared::coords::{RealmId, VoxelPos};
use waystone_shared::geometry::NeighborhoodScan;
use waystone_shared::world::VoxelWorld;

use crate::portal::Orientation;

/// Voxels that may belong to a portal that is being built or already active.
pub fn is_inside_build(block: BlockId) -> bool {
    block == BlockId::AIR || is_build_marker(block) || is_portal_surface(block)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSite {
    pub voxels: FxHashSet<IVec3>,
    /// Horizontal midpoint of the lowest row.
    pub center: IVec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildSite {
    pub realm: RealmId,
    pub orientation: Orientation,
    pub site: DetectedSite,
}

/// Flood-fills the surface containing `seed` along `orientation`.
///
/// Fails when the seed is not inside-build, when any row is wider than
/// `max_span`, or when the fill climbs `max_span` rows above the seed.
pub fn detect_site<W: VoxelWorld + ?Sized>(
    world: &W,
    seed: VoxelPos,
    orientation: Orientation,
    max_span: i32,
) -> Option<DetectedSite> {
    let realm = seed.realm;
    let axis = orientation.axis();
    let inside = |pos: IVec3| is_inside_build(world.block_at(realm, pos));

    if !inside(seed.pos) {
        return None;
    }

    let mut voxels = FxHashSet::default();
    let mut center = None;
    let mut seeds = vec![seed.pos];

    while let Some(row_seed) = seeds.pop() {
        if voxels.contains(&row_seed) {
            continue;
        }
        if row_seed.y - seed.pos.y >= max_span {
            debug!("Site at {} rises past {max_span} rows", seed.pos);
            return None;
        }

        let mut cursor = row_seed;
        let mut moved = 0;
        while inside(cursor) && moved < max_span {
            cursor -= axis;
            moved += 1;
        }
        if inside(cursor) {
            debug!("Site at {} is wider than {max_span}", seed.pos);
            return None;
        }

        cursor += axis;
        moved = 0;
        let mut in_run = false;
        while inside(cursor) && moved < max_span {
            let above = cursor + IVec3::Y;
            if inside(above) {
                if !in_run {
                    seeds.push(above);
                    in_run = true;
                }
            } else {
                in_run = false;
            }
            voxels.insert(cursor);
            moved += 1;
            cursor += axis;
        }
        if inside(cursor) {
            debug!("Site at {} is wider than {max_span}", seed.pos);
            return None;
        }

        center.get_or_insert(cursor - axis * (moved / 2));
    }

    let center = center?;
    Some(DetectedSite { voxels, center })
}

/// Finds the first build marker near `origin` that starts a valid regular site.
///
/// Stacked markers would make a free-standing column portal, which is not
/// supported; such markers are skipped like any other invalid candidate.
pub fn find_build_site<W: VoxelWorld + ?Sized>(
    world: &W,
    origin: VoxelPos,
    search_radius: i32,
    max_span: i32,
) -> Option<BuildSite> {
    let realm = origin.realm;
    let block = |pos: IVec3| world.block_at(realm, pos);

    for pos in NeighborhoodScan::new(origin.pos, search_radius) {
        if !is_build_marker(block(pos)) {
            continue;
        }

        let below = block(pos - IVec3::Y);
        if is_build_marker(below) || is_build_marker(block(pos + IVec3::Y)) {
            continue;
        }
        if below == BlockId::AIR {
            continue;
        }

        let marker_along = |step: IVec3| is_build_marker(block(pos + step)) || is_build_marker(block(pos - step));
        let orientation = match (marker_along(IVec3::X), marker_along(IVec3::Z)) {
            (true, false) => Orientation::EastWest,
            (false, true) => Orientation::NorthSouth,
            _ => continue,
        };

        let Some(site) = detect_site(world, VoxelPos::new(realm, pos), orientation, max_span) else {
            continue;
        };

        debug!(
            "Found {orientation} build site at {pos} with {} voxels",
            site.voxels.len()
        );
        return Some(BuildSite {
            realm,
            orientation,
            site,
        });
    }

    None
}
