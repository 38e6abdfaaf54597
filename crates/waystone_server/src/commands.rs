use glam::{IVec3, Vec3};

const PORTAL_USAGE: &str =
    "Usage: /portal <player> create|link|point|flip|visit|unlink|destroy|list [args]";
const SPAWN_USAGE: &str = "Usage: /spawn <player> <realm> <x> <y> <z>";
const MOVE_USAGE: &str = "Usage: /move <player> <x> <y> <z> [<yaw> <pitch>]";
const SETBLOCK_USAGE: &str = "Usage: /setblock <realm> <x> <y> <z> <block>";
const FILL_USAGE: &str = "Usage: /fill <realm> <x1> <y1> <z1> <x2> <y2> <z2> <block>";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Noop,
    Stop,
    List,
    Save,
    Help,
    Portal {
        player: String,
        action: PortalAction,
    },
    Spawn {
        player: String,
        realm: String,
        position: Vec3,
    },
    Move {
        player: String,
        position: Vec3,
        /// `(yaw, pitch)`; the player keeps facing the same way when absent.
        facing: Option<(f32, f32)>,
    },
    SetBlock {
        realm: String,
        pos: IVec3,
        block: String,
    },
    Fill {
        realm: String,
        from: IVec3,
        to: IVec3,
        block: String,
    },
    InvalidUsage(String),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortalAction {
    Create(String),
    Link(String, String),
    Random(String),
    /// Without coordinates the invoking player's location is used, and
    /// without angles the player's facing.
    Point {
        name: String,
        position: Option<Vec3>,
        angles: Option<(f32, f32)>,
    },
    Flip(String),
    Visit(String),
    Unlink(String),
    Destroy(String),
    List,
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Noop;
    }

    let input = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if input.is_empty() {
        return Command::Noop;
    }

    let mut head_tail = input.splitn(2, char::is_whitespace);
    let command = head_tail.next().unwrap_or_default().to_ascii_lowercase();
    let rest = head_tail.next().unwrap_or("").trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    match command.as_str() {
        "stop" => Command::Stop,
        "list" => Command::List,
        "save" => Command::Save,
        "help" => Command::Help,
        "portal" => parse_portal(&args),
        "spawn" => match args.as_slice() {
            [player, realm, x, y, z] => match parse_vec3(x, y, z) {
                Some(position) => Command::Spawn {
                    player: player.to_string(),
                    realm: realm.to_string(),
                    position,
                },
                None => usage(SPAWN_USAGE),
            },
            _ => usage(SPAWN_USAGE),
        },
        "move" => match args.as_slice() {
            [player, x, y, z] => match parse_vec3(x, y, z) {
                Some(position) => Command::Move {
                    player: player.to_string(),
                    position,
                    facing: None,
                },
                None => usage(MOVE_USAGE),
            },
            [player, x, y, z, yaw, pitch] => match (parse_vec3(x, y, z), parse_pair(yaw, pitch)) {
                (Some(position), Some(facing)) => Command::Move {
                    player: player.to_string(),
                    position,
                    facing: Some(facing),
                },
                _ => usage(MOVE_USAGE),
            },
            _ => usage(MOVE_USAGE),
        },
        "setblock" => match args.as_slice() {
            [realm, x, y, z, block] => match parse_ivec3(x, y, z) {
                Some(pos) => Command::SetBlock {
                    realm: realm.to_string(),
                    pos,
                    block: block.to_string(),
                },
                None => usage(SETBLOCK_USAGE),
            },
            _ => usage(SETBLOCK_USAGE),
        },
        "fill" => match args.as_slice() {
            [realm, x1, y1, z1, x2, y2, z2, block] => {
                match (parse_ivec3(x1, y1, z1), parse_ivec3(x2, y2, z2)) {
                    (Some(from), Some(to)) => Command::Fill {
                        realm: realm.to_string(),
                        from,
                        to,
                        block: block.to_string(),
                    },
                    _ => usage(FILL_USAGE),
                }
            }
            _ => usage(FILL_USAGE),
        },
        _ => Command::Unknown(input.to_string()),
    }
}

fn parse_portal(args: &[&str]) -> Command {
    let Some((player, rest)) = args.split_first() else {
        return usage(PORTAL_USAGE);
    };
    let Some((sub, rest)) = rest.split_first() else {
        return usage(PORTAL_USAGE);
    };

    let action = match (sub.to_ascii_lowercase().as_str(), rest) {
        ("create", [name]) => PortalAction::Create(name.to_string()),
        ("link", [name, target]) if target.eq_ignore_ascii_case("random") => {
            PortalAction::Random(name.to_string())
        }
        ("link", [a, b]) => PortalAction::Link(a.to_string(), b.to_string()),
        ("point", [name]) => PortalAction::Point {
            name: name.to_string(),
            position: None,
            angles: None,
        },
        ("point", [name, x, y, z]) => match parse_vec3(x, y, z) {
            Some(position) => PortalAction::Point {
                name: name.to_string(),
                position: Some(position),
                angles: None,
            },
            None => return usage("Usage: /portal <player> point <name> [<x> <y> <z> [<pitch> <yaw>]]"),
        },
        ("point", [name, x, y, z, pitch, yaw]) => match (parse_vec3(x, y, z), parse_pair(pitch, yaw)) {
            (Some(position), Some(angles)) => PortalAction::Point {
                name: name.to_string(),
                position: Some(position),
                angles: Some(angles),
            },
            _ => return usage("Usage: /portal <player> point <name> [<x> <y> <z> [<pitch> <yaw>]]"),
        },
        ("flip", [name]) => PortalAction::Flip(name.to_string()),
        ("visit", [name]) => PortalAction::Visit(name.to_string()),
        ("unlink", [name]) => PortalAction::Unlink(name.to_string()),
        ("destroy", [name]) => PortalAction::Destroy(name.to_string()),
        ("list", []) => PortalAction::List,
        ("create" | "flip" | "visit" | "unlink" | "destroy", _) => {
            return usage(&format!("Usage: /portal <player> {sub} <name>"))
        }
        ("link", _) => return usage("Usage: /portal <player> link <portal1> <portal2|random>"),
        ("point", _) => {
            return usage("Usage: /portal <player> point <name> [<x> <y> <z> [<pitch> <yaw>]]")
        }
        ("list", _) => return usage("Usage: /portal <player> list"),
        _ => return usage(PORTAL_USAGE),
    };

    Command::Portal {
        player: player.to_string(),
        action,
    }
}

fn usage(message: &str) -> Command {
    Command::InvalidUsage(message.to_string())
}

fn parse_vec3(x: &str, y: &str, z: &str) -> Option<Vec3> {
    let parse = |value: &str| value.parse::<f32>().ok().filter(|parsed| parsed.is_finite());
    Some(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
}

fn parse_ivec3(x: &str, y: &str, z: &str) -> Option<IVec3> {
    Some(IVec3::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?))
}

fn parse_pair(a: &str, b: &str) -> Option<(f32, f32)> {
    let parse = |value: &str| value.parse::<f32>().ok().filter(|parsed| parsed.is_finite());
    Some((parse(a)?, parse(b)?))
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};

    use super::{parse_command, Command, PortalAction};

    fn portal(player: &str, action: PortalAction) -> Command {
        Command::Portal {
            player: player.to_string(),
            action,
        }
    }

    #[test]
    fn parses_server_commands() {
        assert_eq!(parse_command(""), Command::Noop);
        assert_eq!(parse_command("/"), Command::Noop);
        assert_eq!(parse_command("/stop"), Command::Stop);
        assert_eq!(parse_command("list"), Command::List);
        assert_eq!(parse_command("/SAVE"), Command::Save);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/dance now"), Command::Unknown("dance now".to_string()));
    }

    #[test]
    fn parses_portal_actions() {
        assert_eq!(
            parse_command("/portal Ada create Home"),
            portal("Ada", PortalAction::Create("Home".into()))
        );
        assert_eq!(
            parse_command("/portal Ada link Home Away"),
            portal("Ada", PortalAction::Link("Home".into(), "Away".into()))
        );
        assert_eq!(
            parse_command("/portal Ada link Home RANDOM"),
            portal("Ada", PortalAction::Random("Home".into()))
        );
        assert_eq!(
            parse_command("/portal Ada point Home"),
            portal(
                "Ada",
                PortalAction::Point {
                    name: "Home".into(),
                    position: None,
                    angles: None
                }
            )
        );
        assert_eq!(
            parse_command("/portal Ada point Home 1 64.5 -3 10 270"),
            portal(
                "Ada",
                PortalAction::Point {
                    name: "Home".into(),
                    position: Some(Vec3::new(1.0, 64.5, -3.0)),
                    angles: Some((10.0, 270.0))
                }
            )
        );
        assert_eq!(
            parse_command("/portal Ada Flip Home"),
            portal("Ada", PortalAction::Flip("Home".into()))
        );
        assert_eq!(
            parse_command("portal Ada visit Home"),
            portal("Ada", PortalAction::Visit("Home".into()))
        );
        assert_eq!(
            parse_command("/portal Ada unlink Home"),
            portal("Ada", PortalAction::Unlink("Home".into()))
        );
        assert_eq!(
            parse_command("/portal Ada destroy Home"),
            portal("Ada", PortalAction::Destroy("Home".into()))
        );
        assert_eq!(parse_command("/portal Ada list"), portal("Ada", PortalAction::List));
    }

    #[test]
    fn parses_world_commands() {
        assert_eq!(
            parse_command("/spawn Ada overworld 0.5 41 0.5"),
            Command::Spawn {
                player: "Ada".into(),
                realm: "overworld".into(),
                position: Vec3::new(0.5, 41.0, 0.5),
            }
        );
        assert_eq!(
            parse_command("/move Ada 1 41 2"),
            Command::Move {
                player: "Ada".into(),
                position: Vec3::new(1.0, 41.0, 2.0),
                facing: None,
            }
        );
        assert_eq!(
            parse_command("/move Ada 1 41 2 90 -15"),
            Command::Move {
                player: "Ada".into(),
                position: Vec3::new(1.0, 41.0, 2.0),
                facing: Some((90.0, -15.0)),
            }
        );
        assert_eq!(
            parse_command("/setblock overworld 3 41 -2 waystone_marker"),
            Command::SetBlock {
                realm: "overworld".into(),
                pos: IVec3::new(3, 41, -2),
                block: "waystone_marker".into(),
            }
        );
        assert_eq!(
            parse_command("/fill underdeep 0 40 0 3 45 0 obsidian"),
            Command::Fill {
                realm: "underdeep".into(),
                from: IVec3::new(0, 40, 0),
                to: IVec3::new(3, 45, 0),
                block: "obsidian".into(),
            }
        );
    }

    #[test]
    fn reports_usage_errors() {
        let invalid = |line: &str| matches!(parse_command(line), Command::InvalidUsage(_));

        assert!(invalid("/portal"));
        assert!(invalid("/portal Ada"));
        assert!(invalid("/portal Ada teleport Home"));
        assert!(invalid("/portal Ada create"));
        assert!(invalid("/portal Ada create two names"));
        assert!(invalid("/portal Ada link Home"));
        assert!(invalid("/portal Ada point Home 1 2"));
        assert!(invalid("/portal Ada point Home 1 2 x"));
        assert!(invalid("/portal Ada list extra"));
        assert!(invalid("/spawn Ada overworld 1 2"));
        assert!(invalid("/move Ada 1 2 three"));
        assert!(invalid("/move Ada 1 2 3 90"));
        assert!(invalid("/setblock overworld 1.5 2 3 sand"));
        assert!(invalid("/fill overworld 0 0 0 1 1 1"));
        assert_eq!(
            parse_command("/portal Ada destroy"),
            Command::InvalidUsage("Usage: /portal <player> destroy <name>".to_string())
        );
    }
}
