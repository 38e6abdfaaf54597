use std::time::Instant;

use glam::{IVec3, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};
use waystone_persist::record::{PortalFile, PortalRecord};
use waystone_persist::store::PortalStore;
use waystone_shared::block::BlockId;
use waystone_shared::coords::{Location, VoxelPos};
use waystone_shared::world::{Effect, Traveler, VoxelWorld};

use crate::config::PortalConfig;
use crate::detect::{detect_site, find_build_site};
use crate::error::PortalError;
use crate::portal::{surface_reach, Orientation, Portal, PortalSummary};
use crate::target::{FixedPoint, Target};
use crate::teleport::{self, TeleportOutcome, MISCONFIGURED_MESSAGE};

/// Reserved because `link <portal> random` selects random mode.
pub const RESERVED_NAME: &str = "random";

/// Distance from the anchor, through the surface, at which `visit` places the visitor.
const VISIT_OFFSET: i32 = 2;

/// Owns every portal of a session. All link changes go through here so both
/// ends of a pair change together, and every successful mutation is written
/// to the store.
pub struct PortalRegistry {
    config: PortalConfig,
    portals: FxHashMap<String, Portal>,
    store: Option<PortalStore>,
    rng: StdRng,
}

impl PortalRegistry {
    /// In-memory registry; nothing is persisted.
    pub fn new(config: PortalConfig) -> Self {
        let config = config.sanitize();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            portals: FxHashMap::default(),
            store: None,
            rng,
        }
    }

    pub fn with_store(config: PortalConfig, store: PortalStore) -> Self {
        let mut registry = Self::new(config);
        registry.store = Some(store);
        registry
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&PortalStore> {
        self.store.as_ref()
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Portal> {
        self.portals.get(name)
    }

    /// Every portal with its target, sorted by name.
    pub fn list(&self) -> Vec<PortalSummary> {
        let mut summaries: Vec<PortalSummary> = self.portals.values().map(Portal::summary).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Detects a build site near `near` and turns it into an unlinked portal.
    pub fn create<W: VoxelWorld + ?Sized>(
        &mut self,
        world: &mut W,
        name: &str,
        near: Location,
        now: Instant,
    ) -> Result<(), PortalError> {
        validate_name(name)?;
        if self.portals.contains_key(name) {
            return Err(PortalError::DuplicateName(name.to_string()));
        }

        let realm = near.realm;
        let realm_name = world.realm_name(realm).ok_or_else(|| PortalError::UnknownRealm {
            portal: name.to_string(),
            realm: realm.to_string(),
        })?;

        let radius = self.config.build_search_radius;
        let build = find_build_site(&*world, near.voxel(), radius, self.config.max_span)
            .ok_or(PortalError::NoBuildSite { radius })?;

        if let Some(owner) = self
            .portals
            .values()
            .find(|portal| portal.realm == realm && !portal.surface.is_disjoint(&build.site.voxels))
        {
            return Err(PortalError::SiteClaimed(owner.name.clone()));
        }

        let portal = Portal {
            name: name.to_string(),
            realm,
            realm_name,
            anchor: build.site.center,
            orientation: build.orientation,
            mirrored: false,
            target: Target::Unlinked,
            reach: surface_reach(build.site.center, &build.site.voxels),
            surface: build.site.voxels,
            cooldown_until: now + self.config.cooldown(),
        };

        world.set_blocks(realm, &portal.surface_sorted(), build.orientation.surface_block());
        world.play_effect(Location::at_voxel(realm, portal.anchor), Effect::PortalOpened);
        info!(
            "Created {} portal '{name}' at {} in {} ({} blocks)",
            portal.orientation,
            portal.anchor,
            portal.realm_name,
            portal.surface.len()
        );
        self.portals.insert(name.to_string(), portal);
        self.persist()
    }

    /// Links `a` and `b` to each other, tearing down any previous links of either.
    pub fn link(&mut self, a: &str, b: &str, now: Instant) -> Result<(), PortalError> {
        let first = self.require(a)?;
        let second = self.require(b)?;
        if a == b {
            return Err(PortalError::SelfLink(a.to_string()));
        }
        if first.realm != second.realm {
            return Err(PortalError::CrossRealm {
                from: a.to_string(),
                to: b.to_string(),
            });
        }

        self.detach(a);
        self.detach(b);
        self.set_target(a, Target::Linked(b.to_string()));
        self.set_target(b, Target::Linked(a.to_string()));
        self.start_cooldown(a, now);

        info!("Linked portals '{a}' and '{b}'");
        self.persist()
    }

    pub fn set_random(&mut self, name: &str) -> Result<(), PortalError> {
        self.require(name)?;
        self.detach(name);
        self.set_target(name, Target::Random);
        info!("Portal '{name}' now warps to random destinations");
        self.persist()
    }

    /// Sends travelers of `name` to a fixed point in the portal's own realm.
    pub fn set_fixed_point(
        &mut self,
        name: &str,
        position: Vec3,
        pitch: f32,
        yaw: f32,
    ) -> Result<(), PortalError> {
        self.require(name)?;
        self.detach(name);
        let point = FixedPoint::new(position, pitch, yaw);
        info!("Portal '{name}' now leads to {}", point.as_str());
        self.set_target(name, Target::FixedPoint(point));
        self.persist()
    }

    /// Clears the target of `name` and of its partner. Returns `false` when
    /// the portal was already unlinked.
    pub fn unlink(&mut self, name: &str) -> Result<bool, PortalError> {
        if self.require(name)?.target.is_unlinked() {
            return Ok(false);
        }

        self.detach(name);
        self.set_target(name, Target::Unlinked);
        info!("Unlinked portal '{name}'");
        self.persist()?;
        Ok(true)
    }

    /// Toggles the mirrored flag and returns its new value.
    pub fn flip(&mut self, name: &str) -> Result<bool, PortalError> {
        let portal = self
            .portals
            .get_mut(name)
            .ok_or_else(|| PortalError::UnknownPortal(name.to_string()))?;
        portal.mirrored = !portal.mirrored;
        let mirrored = portal.mirrored;

        info!("Portal '{name}' is now {}", if mirrored { "mirrored" } else { "unmirrored" });
        self.persist()?;
        Ok(mirrored)
    }

    /// Unlinks both ends, reverts the surface to air and forgets the portal.
    pub fn destroy<W: VoxelWorld + ?Sized>(&mut self, world: &mut W, name: &str) -> Result<(), PortalError> {
        self.require(name)?;
        self.detach(name);
        let Some(portal) = self.portals.remove(name) else {
            return Err(PortalError::UnknownPortal(name.to_string()));
        };

        world.set_blocks(portal.realm, &portal.surface_sorted(), BlockId::AIR);
        world.play_effect(Location::at_voxel(portal.realm, portal.anchor), Effect::PortalClosed);
        info!("Destroyed portal '{name}'");
        self.persist()
    }

    /// Moves `traveler` in front of (or else behind) a portal, facing it.
    pub fn visit<W, T>(&self, world: &mut W, name: &str, traveler: &mut T) -> Result<Location, PortalError>
    where
        W: VoxelWorld + ?Sized,
        T: Traveler + ?Sized,
    {
        let portal = self.require(name)?;
        let offset = portal.orientation.normal() * VISIT_OFFSET;

        let Some(spot) = [portal.anchor - offset, portal.anchor + offset]
            .into_iter()
            .find(|spot| teleport::check_free(&*world, portal.realm, *spot, self.config.free_check_depth))
        else {
            return Err(PortalError::NoFreeSpace {
                name: name.to_string(),
                anchor: portal.anchor,
            });
        };

        let toward = (portal.anchor - spot).as_vec3();
        let destination = Location::at_voxel(portal.realm, spot).facing(toward);
        traveler.teleport_to(destination);
        world.play_effect(destination, Effect::Teleported);
        debug!("Visited portal '{name}' from {spot}");
        Ok(destination)
    }

    /// Portal owning `pos`, if any portal within the protection radius does.
    pub fn owner_of(&self, pos: VoxelPos) -> Option<&Portal> {
        self.nearby(pos).find(|portal| portal.contains(pos))
    }

    pub fn is_portal_surface_voxel(&self, pos: VoxelPos) -> bool {
        self.owner_of(pos).is_some()
    }

    /// Whether any of `positions` belongs to a managed portal.
    pub fn manages_any(&self, positions: &[VoxelPos]) -> bool {
        positions.iter().any(|pos| self.is_portal_surface_voxel(*pos))
    }

    /// Portals in range of `pos`. A portal larger than the protection radius
    /// still covers its whole surface.
    fn nearby(&self, pos: VoxelPos) -> impl Iterator<Item = &Portal> + '_ {
        let radius = self.config.protection_radius;
        self.portals.values().filter(move |portal| {
            portal
                .anchor_pos()
                .distance(pos)
                .is_some_and(|distance| distance <= radius.max(portal.reach))
        })
    }

    /// Sends `traveler` through the portal `name`.
    pub fn teleport<W, T>(
        &mut self,
        world: &mut W,
        name: &str,
        traveler: &mut T,
        now: Instant,
    ) -> Result<TeleportOutcome, PortalError>
    where
        W: VoxelWorld + ?Sized,
        T: Traveler + ?Sized,
    {
        let source = self
            .portals
            .get(name)
            .ok_or_else(|| PortalError::UnknownPortal(name.to_string()))?;
        if source.target.is_unlinked() {
            return Ok(TeleportOutcome::Idle);
        }
        if source.is_cooling_down(now) {
            return Ok(TeleportOutcome::CoolingDown);
        }

        let outcome = match &source.target {
            Target::Unlinked => TeleportOutcome::Idle,
            Target::Linked(partner) => match self.portals.get(partner) {
                Some(partner) => teleport::through_link(world, traveler, source, partner, &self.config),
                None => {
                    warn!("Portal '{name}' links to missing portal '{partner}'");
                    traveler.send_message(MISCONFIGURED_MESSAGE);
                    TeleportOutcome::Misconfigured
                }
            },
            Target::Random => teleport::through_random(world, traveler, source, &mut self.rng, &self.config),
            Target::FixedPoint(point) => teleport::through_fixed_point(world, traveler, source, point),
        };

        if outcome.starts_cooldown() {
            self.start_cooldown(name, now);
        }
        Ok(outcome)
    }

    /// Teleports `traveler` through whichever portal owns its current voxel.
    pub fn traverse<W, T>(&mut self, world: &mut W, traveler: &mut T, now: Instant) -> Option<TeleportOutcome>
    where
        W: VoxelWorld + ?Sized,
        T: Traveler + ?Sized,
    {
        let name = self.owner_of(traveler.location().voxel())?.name.clone();
        self.teleport(world, &name, traveler, now).ok()
    }

    /// Starts the cooldown of `name` and of its partner, which share one window.
    pub fn start_cooldown(&mut self, name: &str, now: Instant) {
        let until = now + self.config.cooldown();
        let Some(portal) = self.portals.get_mut(name) else {
            return;
        };
        portal.cooldown_until = until;
        let partner = portal.target.linked_name().map(str::to_string);

        if let Some(partner) = partner {
            if let Some(partner) = self.portals.get_mut(&partner) {
                partner.cooldown_until = until;
            }
        }
    }

    /// Full persisted form of the registry.
    pub fn snapshot(&self) -> PortalFile {
        let mut file = PortalFile::default();
        for portal in self.portals.values() {
            file.portals.insert(
                portal.name.clone(),
                PortalRecord {
                    realm: portal.realm_name.clone(),
                    anchor: portal.anchor.to_array(),
                    target: portal.target.to_persisted(),
                    east_west: portal.orientation.is_east_west(),
                    mirrored: portal.mirrored,
                },
            );
        }
        file
    }

    pub fn save(&self) -> Result<(), PortalError> {
        self.persist()
    }

    /// Replaces the registry with the store's contents and returns the number
    /// of portals loaded. Any failure leaves the registry empty.
    pub fn load<W: VoxelWorld + ?Sized>(&mut self, world: &mut W, now: Instant) -> Result<usize, PortalError> {
        for portal in self.portals.values() {
            world.set_blocks(portal.realm, &portal.surface_sorted(), BlockId::AIR);
        }
        self.portals.clear();

        let Some(store) = &self.store else {
            return Ok(0);
        };
        let file = store.load().map_err(PortalError::from_load)?;
        let portals = rebuild(&*world, file, self.config.max_span, now)?;

        for portal in portals.values() {
            world.set_blocks(portal.realm, &portal.surface_sorted(), portal.orientation.surface_block());
        }
        self.portals = portals;
        info!("Loaded {} portals", self.portals.len());
        Ok(self.portals.len())
    }

    /// Final flush at the end of a session.
    pub fn shutdown(self) -> Result<(), PortalError> {
        self.persist()?;
        info!("Portal registry closed with {} portals", self.portals.len());
        Ok(())
    }

    fn require(&self, name: &str) -> Result<&Portal, PortalError> {
        self.portals
            .get(name)
            .ok_or_else(|| PortalError::UnknownPortal(name.to_string()))
    }

    fn set_target(&mut self, name: &str, target: Target) {
        if let Some(portal) = self.portals.get_mut(name) {
            portal.target = target;
        }
    }

    /// Breaks the link of `name`, if any, on both ends.
    fn detach(&mut self, name: &str) {
        let Some(partner) = self
            .portals
            .get(name)
            .and_then(|portal| portal.target.linked_name())
            .map(str::to_string)
        else {
            return;
        };

        if self.portals.get(&partner).and_then(|p| p.target.linked_name()) == Some(name) {
            self.set_target(&partner, Target::Unlinked);
        }
        self.set_target(name, Target::Unlinked);
    }

    fn persist(&self) -> Result<(), PortalError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save(&self.snapshot()).map_err(|err| {
            warn!("Failed to save portals to {}: {err}", store.path().display());
            PortalError::Persistence(err)
        })
    }
}

fn validate_name(name: &str) -> Result<(), PortalError> {
    let valid = !name.is_empty()
        && name != RESERVED_NAME
        && !name.contains(':')
        && !name.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(PortalError::InvalidName(name.to_string()))
    }
}

fn rebuild<W: VoxelWorld + ?Sized>(
    world: &W,
    file: PortalFile,
    max_span: i32,
    now: Instant,
) -> Result<FxHashMap<String, Portal>, PortalError> {
    let mut portals: FxHashMap<String, Portal> = FxHashMap::default();

    for (name, record) in file.portals {
        let realm = world.realm_id(&record.realm).ok_or_else(|| PortalError::UnknownRealm {
            portal: name.clone(),
            realm: record.realm.clone(),
        })?;
        let target = Target::parse(record.target.as_deref()).map_err(|_| PortalError::BadTarget {
            portal: name.clone(),
            target: record.target.clone().unwrap_or_default(),
        })?;

        let anchor = IVec3::from_array(record.anchor);
        let orientation = Orientation::from_east_west(record.east_west);
        let site = detect_site(world, VoxelPos::new(realm, anchor), orientation, max_span)
            .ok_or_else(|| PortalError::SiteLost(name.clone()))?;

        if let Some(other) = portals
            .values()
            .find(|other| other.realm == realm && !other.surface.is_disjoint(&site.voxels))
        {
            return Err(PortalError::OverlappingSites {
                portal: name,
                other: other.name.clone(),
            });
        }

        portals.insert(
            name.clone(),
            Portal {
                name,
                realm,
                realm_name: record.realm,
                anchor,
                orientation,
                mirrored: record.mirrored,
                target,
                reach: surface_reach(anchor, &site.voxels),
                surface: site.voxels,
                cooldown_until: now,
            },
        );
    }

    let mut one_sided = FxHashSet::default();
    for portal in portals.values() {
        let Some(partner) = portal.target.linked_name() else {
            continue;
        };
        if partner == portal.name {
            one_sided.insert(portal.name.clone());
            continue;
        }
        let Some(other) = portals.get(partner) else {
            return Err(PortalError::DanglingLink {
                portal: portal.name.clone(),
                target: partner.to_string(),
            });
        };
        if other.target.linked_name() != Some(portal.name.as_str()) {
            one_sided.insert(portal.name.clone());
        }
    }

    for name in one_sided {
        warn!("Portal '{name}' had a one-sided link; it is now unlinked");
        if let Some(portal) = portals.get_mut(&name) {
            portal.target = Target::Unlinked;
        }
    }

    Ok(portals)
}
