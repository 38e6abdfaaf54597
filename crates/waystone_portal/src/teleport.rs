//! Destination resolution for travelers stepping into a portal.

use glam::{IVec3, Vec3};
use rand::Rng;
use tracing::{debug, warn};
use waystone_shared::block::{is_hazard, is_unsafe_footing, BlockId};
use waystone_shared::coords::{Location, RealmId};
use waystone_shared::geometry::{rotate_about_vertical, snap_to_dominant_axis, voxel_step};
use waystone_shared::world::{Effect, Traveler, VoxelWorld};

use crate::config::PortalConfig;
use crate::portal::{Orientation, Portal};
use crate::target::FixedPoint;

pub const BLOCKED_MESSAGE: &str = "Something is blocking the other side...";
pub const NO_DESTINATION_MESSAGE: &str =
    "It seems there's no good place for you right now. Try again in a few seconds.";
pub const MISCONFIGURED_MESSAGE: &str = "Something about this portal feels wrong... (misconfigured portal)";

/// Height above the sampled surface at which random warps land.
const RANDOM_DROP_HEIGHT: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum TeleportOutcome {
    /// The portal has no target.
    Idle,
    /// Absorbed by the shared cooldown.
    CoolingDown,
    Teleported(Location),
    /// The linked exit was obstructed; the traveler was pushed back.
    Blocked,
    /// Random mode ran out of tries.
    NoDestination,
    /// The stored fixed point could not be parsed.
    Misconfigured,
}

impl TeleportOutcome {
    /// Whether the portal (and its partner) cool down after this outcome.
    pub fn starts_cooldown(&self) -> bool {
        !matches!(self, Self::Idle | Self::CoolingDown)
    }

    pub fn destination(&self) -> Option<Location> {
        match self {
            Self::Teleported(location) => Some(*location),
            _ => None,
        }
    }
}

/// Maps the traveler's facing through a pair of portals onto a unit exit step.
///
/// The result is horizontal and axis-aligned. A facing with no horizontal
/// component exits along the destination portal's normal.
pub fn exit_direction(facing: Vec3, from: Orientation, to: Orientation, mirrored: bool) -> Vec3 {
    let mut direction = Vec3::new(facing.x, 0.0, facing.z);
    if from != to {
        direction = rotate_about_vertical(direction, 90.0);
    }
    if mirrored {
        direction = -direction;
    }

    let snapped = snap_to_dominant_axis(direction);
    if snapped == Vec3::ZERO {
        return to.normal().as_vec3();
    }
    snapped
}

/// A voxel is free when it and the voxel above are air and solid, non-hazardous
/// ground lies at most `depth` voxels below.
pub fn check_free<W: VoxelWorld + ?Sized>(world: &W, realm: RealmId, pos: IVec3, depth: i32) -> bool {
    if world.block_at(realm, pos) != BlockId::AIR || world.block_at(realm, pos + IVec3::Y) != BlockId::AIR {
        return false;
    }

    for step in 1..=depth {
        let below = world.block_at(realm, pos - IVec3::Y * step);
        if below == BlockId::AIR {
            continue;
        }
        return !is_hazard(below);
    }
    false
}

pub(crate) fn through_link<W, T>(
    world: &mut W,
    traveler: &mut T,
    source: &Portal,
    partner: &Portal,
    config: &PortalConfig,
) -> TeleportOutcome
where
    W: VoxelWorld + ?Sized,
    T: Traveler + ?Sized,
{
    let facing = traveler.location().direction();
    let direction = exit_direction(facing, source.orientation(), partner.orientation(), source.is_mirrored());
    let exit = partner.anchor() + voxel_step(direction);

    if !check_free(&*world, partner.realm(), exit, config.free_check_depth) {
        debug!("Exit {exit} of '{}' is obstructed", partner.name());
        push_back(traveler, config.exit_speed, BLOCKED_MESSAGE);
        return TeleportOutcome::Blocked;
    }

    let destination = Location::at_voxel(partner.realm(), exit).facing(direction);
    arrive(world, traveler, destination);
    traveler.set_velocity(direction * config.exit_speed);
    debug!("'{}' sent a traveler to '{}' at {exit}", source.name(), partner.name());
    TeleportOutcome::Teleported(destination)
}

pub(crate) fn through_random<W, T, R>(
    world: &mut W,
    traveler: &mut T,
    source: &Portal,
    rng: &mut R,
    config: &PortalConfig,
) -> TeleportOutcome
where
    W: VoxelWorld + ?Sized,
    T: Traveler + ?Sized,
    R: Rng,
{
    let range = config.random_range.max(1);
    let realm = source.realm();
    let origin = source.anchor();

    for attempt in 1..=config.random_max_tries {
        let x = origin.x + rng.gen_range(-range..range);
        let z = origin.z + rng.gen_range(-range..range);
        let surface = world.surface_height(realm, x, z);
        let ground = world.block_at(realm, IVec3::new(x, surface, z));
        if is_unsafe_footing(ground) {
            debug!("Random warp try {attempt} at ({x}, {surface}, {z}) is unsafe");
            continue;
        }

        let facing = traveler.location();
        let destination = Location::at_voxel(realm, IVec3::new(x, surface + RANDOM_DROP_HEIGHT, z))
            .with_angles(facing.pitch, facing.yaw);
        arrive(world, traveler, destination);
        debug!("'{}' warped a traveler to ({x}, {surface}, {z})", source.name());
        return TeleportOutcome::Teleported(destination);
    }

    debug!(
        "'{}' found no random destination in {} tries",
        source.name(),
        config.random_max_tries
    );
    push_back(traveler, config.exit_speed, NO_DESTINATION_MESSAGE);
    TeleportOutcome::NoDestination
}

pub(crate) fn through_fixed_point<W, T>(
    world: &mut W,
    traveler: &mut T,
    source: &Portal,
    point: &FixedPoint,
) -> TeleportOutcome
where
    W: VoxelWorld + ?Sized,
    T: Traveler + ?Sized,
{
    match point.resolve(source.realm()) {
        Ok(destination) => {
            arrive(world, traveler, destination);
            TeleportOutcome::Teleported(destination)
        }
        Err(err) => {
            warn!("Portal '{}' is misconfigured: {err}", source.name());
            traveler.send_message(MISCONFIGURED_MESSAGE);
            TeleportOutcome::Misconfigured
        }
    }
}

fn arrive<W, T>(world: &mut W, traveler: &mut T, destination: Location)
where
    W: VoxelWorld + ?Sized,
    T: Traveler + ?Sized,
{
    traveler.teleport_to(destination);
    world.play_effect(destination, Effect::Teleported);
}

fn push_back<T: Traveler + ?Sized>(traveler: &mut T, speed: f32, message: &str) {
    let facing = traveler.location().direction();
    let horizontal = Vec3::new(facing.x, 0.0, facing.z).normalize_or_zero();
    traveler.set_velocity(-horizontal * speed);
    traveler.send_message(message);
}
