use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use waystone_persist::record::PortalFile;
use waystone_persist::store::PortalStore;

fn main() {
    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: portal_inspector <path/to/portals.toml>");
        std::process::exit(2);
    };

    match inspect(Path::new(&path)) {
        Ok(0) => {}
        Ok(problems) => {
            eprintln!("{problems} link problem(s) found");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("portal_inspector error: {err}");
            std::process::exit(1);
        }
    }
}

/// Prints the file and returns how many portal links would not survive a load.
fn inspect(path: &Path) -> Result<usize, String> {
    if !path.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }

    let file = PortalStore::at(path)
        .load()
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;

    println!("{} (format v{})", path.display(), file.format_version);

    let mut per_realm: BTreeMap<&str, usize> = BTreeMap::new();
    for record in file.portals.values() {
        *per_realm.entry(record.realm.as_str()).or_default() += 1;
    }
    println!("{} portals in {} realms", file.len(), per_realm.len());
    for (realm, count) in &per_realm {
        println!("  {realm}: {count}");
    }

    for (name, record) in &file.portals {
        let [x, y, z] = record.anchor;
        let facing = match (record.east_west, record.mirrored) {
            (true, false) => "east-west",
            (true, true) => "east-west mirrored",
            (false, false) => "north-south",
            (false, true) => "north-south mirrored",
        };
        let target = record.target.as_deref().unwrap_or("-");
        println!("{name:<16} {:<12} {x:>6} {y:>4} {z:>6}  {facing:<20} {target}", record.realm);
    }

    let problems = link_problems(&file);
    for problem in &problems {
        println!("warning: {problem}");
    }
    Ok(problems.len())
}

fn link_problems(file: &PortalFile) -> Vec<String> {
    let mut problems = Vec::new();
    for (name, record) in &file.portals {
        let Some(partner) = record.target.as_deref().and_then(|t| t.strip_prefix("portal:")) else {
            continue;
        };
        if partner == name.as_str() {
            problems.push(format!("{name} links to itself"));
            continue;
        }
        match file.portals.get(partner) {
            None => problems.push(format!("{name} links to missing portal {partner}")),
            Some(other) if other.realm != record.realm => {
                problems.push(format!("{name} links across realms to {partner}"))
            }
            Some(other) => {
                let back = other.target.as_deref().and_then(|t| t.strip_prefix("portal:"));
                if back != Some(name.as_str()) {
                    problems.push(format!("{name} -> {partner} is not linked back"));
                }
            }
        }
    }
    problems
}
