use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{I64Vec3, IVec3};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use waystone_persist::store::PortalStore;
use waystone_portal::{ErrorClass, PortalConfig, PortalError, PortalRegistry};
use waystone_shared::coords::{Location, RealmId, VoxelPos};
use waystone_shared::world::{Traveler, VoxelWorld};

use crate::commands::{self, Command, PortalAction};
use crate::persistence::PersistenceLayer;
use crate::player::PlayerState;
use crate::world::ServerWorld;

const TICK_RATE: u32 = 20;
const TICK_DURATION: Duration = Duration::from_millis(1000 / TICK_RATE as u64);
const AUTOSAVE_INTERVAL_TICKS: u64 = (TICK_RATE as u64) * 30;
const MAX_FILL_VOLUME: i64 = 32_768;
const FACE_NEIGHBORS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub world_path: PathBuf,
    pub portal_config: PortalConfig,
}

pub struct Server {
    config: ServerConfig,
    world: ServerWorld,
    persistence: Option<PersistenceLayer>,
    portals: PortalRegistry,
    players: FxHashMap<String, PlayerState>,
    tick: u64,
    running: Arc<AtomicBool>,
    command_rx: Receiver<Command>,
}

impl Server {
    pub fn new(config: ServerConfig, running: Arc<AtomicBool>, command_rx: Receiver<Command>) -> Self {
        let mut world = ServerWorld::default();

        let persistence = match PersistenceLayer::open(&config.world_path) {
            Ok(persistence) => Some(persistence),
            Err(err) => {
                warn!(
                    "Failed to initialize persistence at {}: {err}",
                    config.world_path.display()
                );
                None
            }
        };
        if let Some(persistence) = &persistence {
            match persistence.load_edits() {
                Ok(file) => {
                    let applied = world.apply_edits(&file);
                    info!("Restored {applied} block edits");
                }
                Err(err) => warn!("Failed to load block edits: {err}"),
            }
        }

        let portals = match PortalStore::open(&config.world_path) {
            Ok(store) => PortalRegistry::with_store(config.portal_config.clone(), store),
            Err(err) => {
                warn!("Portals will not be saved: {err}");
                PortalRegistry::new(config.portal_config.clone())
            }
        };

        let mut server = Self {
            config,
            world,
            persistence,
            portals,
            players: FxHashMap::default(),
            tick: 0,
            running,
            command_rx,
        };
        server.load_portals();
        server
    }

    pub fn run(mut self) {
        info!("Starting Waystone server (world: {})", self.config.world_path.display());

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            self.handle_console_commands();
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            self.tick += 1;
            if self.tick % AUTOSAVE_INTERVAL_TICKS == 0 {
                self.save_world();
            }

            let elapsed = tick_start.elapsed();
            if elapsed < TICK_DURATION {
                std::thread::sleep(TICK_DURATION - elapsed);
            }
        }

        info!("Stopping after {} ticks", self.tick);
        self.save_world();
        if let Err(err) = self.portals.shutdown() {
            warn!("Final portal save failed: {err}");
        }
        info!("Shutdown complete");
    }

    fn load_portals(&mut self) {
        match self.portals.load(&mut self.world, Instant::now()) {
            Ok(count) => info!("Loaded {count} portals"),
            Err(err) => warn!("Portal configuration not loaded ({:?}): {err}", err.class()),
        }
    }

    fn handle_console_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.execute_console_command(command);
        }
    }

    fn execute_console_command(&mut self, command: Command) {
        match command {
            Command::Noop => {}
            Command::Stop => self.request_shutdown("console /stop"),
            Command::List => self.log_overview(),
            Command::Save => {
                self.save_world();
                if let Err(err) = self.portals.save() {
                    warn!("[CONSOLE] portal save failed: {err}");
                }
                info!("[CONSOLE] world saved");
            }
            Command::Help => self.log_help(),
            Command::Portal { player, action } => self.execute_portal_action(&player, action),
            Command::Spawn {
                player,
                realm,
                position,
            } => {
                let Some(realm_id) = self.world.realm_id(&realm) else {
                    warn!("[CONSOLE] /spawn failed: unknown realm '{realm}'");
                    return;
                };
                let location = Location::new(realm_id, position);
                match self.players.get_mut(&player) {
                    Some(state) => state.teleport_to(location),
                    None => {
                        self.players
                            .insert(player.clone(), PlayerState::new(player.clone(), location));
                    }
                }
                info!("[CONSOLE] {player} spawned in {realm} at {position}");
            }
            Command::Move {
                player,
                position,
                facing,
            } => self.move_player(&player, position, facing),
            Command::SetBlock { realm, pos, block } => self.edit_blocks(&realm, pos, pos, &block),
            Command::Fill {
                realm,
                from,
                to,
                block,
            } => self.edit_blocks(&realm, from, to, &block),
            Command::InvalidUsage(message) => warn!("[CONSOLE] {message}"),
            Command::Unknown(input) => {
                warn!("[CONSOLE] unknown command '{input}' (try /help)")
            }
        }
    }

    fn execute_portal_action(&mut self, player_name: &str, action: PortalAction) {
        let Some(player) = self.players.get_mut(player_name) else {
            warn!("[CONSOLE] player '{player_name}' is not spawned (use /spawn)");
            return;
        };
        let now = Instant::now();

        let result = match action {
            PortalAction::Create(name) => self
                .portals
                .create(&mut self.world, &name, player.location, now)
                .map(|()| format!("Portal '{name}' created.")),
            PortalAction::Link(a, b) => self
                .portals
                .link(&a, &b, now)
                .map(|()| format!("Portals '{a}' and '{b}' are now linked.")),
            PortalAction::Random(name) => self
                .portals
                .set_random(&name)
                .map(|()| format!("Portal '{name}' now leads somewhere random.")),
            PortalAction::Point {
                name,
                position,
                angles,
            } => {
                let here = player.location;
                let position = position.unwrap_or(here.position);
                let (pitch, yaw) = angles.unwrap_or((here.pitch, here.yaw));
                self.portals
                    .set_fixed_point(&name, position, pitch, yaw)
                    .map(|()| format!("Portal '{name}' now leads to {position}."))
            }
            PortalAction::Flip(name) => self.portals.flip(&name).map(|mirrored| {
                let state = if mirrored { "mirrored" } else { "no longer mirrored" };
                format!("Portal '{name}' is now {state}.")
            }),
            PortalAction::Visit(name) => self
                .portals
                .visit(&mut self.world, &name, player)
                .map(|_| format!("Welcome to '{name}'.")),
            PortalAction::Unlink(name) => self.portals.unlink(&name).map(|changed| {
                if changed {
                    format!("Portal '{name}' unlinked.")
                } else {
                    format!("Portal '{name}' was not linked.")
                }
            }),
            PortalAction::Destroy(name) => self
                .portals
                .destroy(&mut self.world, &name)
                .map(|()| format!("Portal '{name}' destroyed.")),
            PortalAction::List => {
                let summaries = self.portals.list();
                if summaries.is_empty() {
                    Ok("There are no portals.".to_string())
                } else {
                    for summary in &summaries {
                        player.send_message(&summary.to_string());
                    }
                    Ok(format!("{} portals.", summaries.len()))
                }
            }
        };

        match result {
            Ok(message) => player.send_message(&message),
            Err(err) => report_error(player, &err),
        }
        flush_messages(player);
    }

    fn move_player(&mut self, name: &str, position: glam::Vec3, facing: Option<(f32, f32)>) {
        let Some(player) = self.players.get_mut(name) else {
            warn!("[CONSOLE] /move failed: player '{name}' is not spawned");
            return;
        };

        let mut location = Location::new(player.location.realm, position);
        let (yaw, pitch) = facing.unwrap_or((player.location.yaw, player.location.pitch));
        location = location.with_angles(pitch, yaw);
        player.teleport_to(location);

        if let Some(outcome) = self.portals.traverse(&mut self.world, player, Instant::now()) {
            debug!("{name} entered a portal: {outcome:?}");
        }
        info!(
            "[CONSOLE] {name} is at {} in {} (velocity {})",
            player.location.position, player.location.realm, player.velocity
        );
        flush_messages(player);
    }

    fn edit_blocks(&mut self, realm: &str, from: IVec3, to: IVec3, block: &str) {
        let Some(realm_id) = self.world.realm_id(realm) else {
            warn!("[CONSOLE] unknown realm '{realm}'");
            return;
        };
        let Some(block_id) = self.world.resolve_block(block) else {
            warn!("[CONSOLE] unknown block '{block}'");
            return;
        };

        let min = from.min(to);
        let max = from.max(to);
        let extent = max.as_i64vec3() - min.as_i64vec3() + I64Vec3::ONE;
        let volume = extent.x.saturating_mul(extent.y).saturating_mul(extent.z);
        if volume > MAX_FILL_VOLUME {
            warn!("[CONSOLE] refusing to edit {volume} blocks (limit {MAX_FILL_VOLUME})");
            return;
        }

        let mut positions = Vec::with_capacity(volume as usize);
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    positions.push(IVec3::new(x, y, z));
                }
            }
        }

        if touches_portal(&self.portals, realm_id, &positions) {
            warn!("[CONSOLE] refusing to edit blocks that touch a portal");
            return;
        }

        self.world.set_blocks(realm_id, &positions, block_id);
        info!("[CONSOLE] set {} blocks to {block} in {realm}", positions.len());
    }

    fn save_world(&mut self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(err) = persistence.save_edits(&self.world.edits()) {
            warn!("Failed to save block edits: {err}");
        }
    }

    fn request_shutdown(&mut self, source: &str) {
        info!("Shutdown requested via {source}");
        self.running.store(false, Ordering::SeqCst);
    }

    fn log_overview(&self) {
        let realms: Vec<&str> = self.world.realm_names().collect();
        info!("[CONSOLE] realms: {}", realms.join(", "));
        info!("[CONSOLE] portals: {}", self.portals.len());
        if self.players.is_empty() {
            info!("[CONSOLE] no players");
            return;
        }

        let mut players: Vec<&PlayerState> = self.players.values().collect();
        players.sort_by(|a, b| a.username.cmp(&b.username));
        info!("[CONSOLE] players ({}):", players.len());
        for player in players {
            let realm = self
                .world
                .realm_name(player.location.realm)
                .unwrap_or_else(|| player.location.realm.to_string());
            info!(
                "[CONSOLE] - {} in {realm} at {}",
                player.username, player.location.position
            );
        }
    }

    fn log_help(&self) {
        info!("[CONSOLE] Available commands:");
        info!("[CONSOLE]   /help");
        info!("[CONSOLE]   /list");
        info!("[CONSOLE]   /save");
        info!("[CONSOLE]   /spawn <player> <realm> <x> <y> <z>");
        info!("[CONSOLE]   /move <player> <x> <y> <z> [<yaw> <pitch>]");
        info!("[CONSOLE]   /setblock <realm> <x> <y> <z> <block>");
        info!("[CONSOLE]   /fill <realm> <x1> <y1> <z1> <x2> <y2> <z2> <block>");
        info!("[CONSOLE]   /portal <player> create <name>");
        info!("[CONSOLE]   /portal <player> link <portal1> <portal2|random>");
        info!("[CONSOLE]   /portal <player> point <name> [<x> <y> <z> [<pitch> <yaw>]]");
        info!("[CONSOLE]   /portal <player> flip|visit|unlink|destroy <name>");
        info!("[CONSOLE]   /portal <player> list");
        info!("[CONSOLE]   /stop");
    }
}

/// Edits may not touch a portal voxel or any of its face neighbours.
fn touches_portal(portals: &PortalRegistry, realm: RealmId, positions: &[IVec3]) -> bool {
    let guarded: Vec<VoxelPos> = positions
        .iter()
        .flat_map(|pos| std::iter::once(*pos).chain(FACE_NEIGHBORS.iter().map(move |step| *pos + *step)))
        .map(|pos| VoxelPos::new(realm, pos))
        .collect();
    portals.manages_any(&guarded)
}

fn report_error(player: &mut PlayerState, err: &PortalError) {
    match err.class() {
        ErrorClass::User => {}
        ErrorClass::Persistence => warn!("Portal change kept in memory only: {err}"),
        class => warn!("Portal error ({class:?}): {err}"),
    }
    player.send_message(&err.to_string());
}

fn flush_messages(player: &mut PlayerState) {
    for message in player.take_messages() {
        info!("[{}] {message}", player.username);
    }
}

pub fn run(config: ServerConfig, running: Arc<AtomicBool>) -> io::Result<()> {
    let (command_tx, command_rx) = mpsc::channel();
    spawn_console_command_thread(command_tx);

    Server::new(config, running, command_rx).run();
    Ok(())
}

fn spawn_console_command_thread(command_tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line_result in stdin.lock().lines() {
            let line = match line_result {
                Ok(line) => line,
                Err(err) => {
                    warn!("Failed to read server console input: {err}");
                    break;
                }
            };

            let command = commands::parse_command(&line);
            if command_tx.send(command).is_err() {
                break;
            }
        }
    });
}
