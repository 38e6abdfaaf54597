use glam::Vec3;
use waystone_shared::coords::Location;
use waystone_shared::world::Traveler;

/// A console-driven player. Messages queue in `outbox` until the server prints them.
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub username: String,
    pub location: Location,
    pub velocity: Vec3,
    pub outbox: Vec<String>,
}

impl PlayerState {
    pub fn new(username: impl Into<String>, location: Location) -> Self {
        Self {
            username: username.into(),
            location,
            velocity: Vec3::ZERO,
            outbox: Vec::new(),
        }
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }
}

impl Traveler for PlayerState {
    fn location(&self) -> Location {
        self.location
    }

    fn teleport_to(&mut self, destination: Location) {
        self.location = destination;
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn send_message(&mut self, message: &str) {
        self.outbox.push(message.to_string());
    }
}
