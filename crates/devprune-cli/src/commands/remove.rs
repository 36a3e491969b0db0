use std::path::Path;

use colored::Colorize;
use devprune_core::{PlannedRemoval, Selector, Snapshot};

pub fn run(dir: &Path, selector: &Selector, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("loading registry files from {}", dir.display());
    let mut snapshot = Snapshot::load(dir)?;
    report_index(&snapshot)?;

    let plan = snapshot.plan(selector)?;
    print_removals("Devices to remove:", &plan.devices);
    print_removals("Config Entries to remove:", &plan.config_entries);
    print_removals("Entities to remove:", &plan.entities);

    if dry_run {
        println!("{}", "Dry run, nothing written.".yellow());
        return Ok(());
    }

    snapshot.apply(&plan)?;
    snapshot.commit()?;
    println!("{}", "DONE.".green());
    Ok(())
}

/// Counts plus the diagnostics that never block a prune on their own.
fn report_index(snapshot: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
    let index = snapshot.index();
    println!("Found {} devices by id.", index.device_pos.len());
    println!("Found {} devices by unique name.", index.device_by_name.len());

    if !index.duplicate_names.is_empty() {
        println!(
            "{}",
            "WARNING: You have multiple devices with the same name.".yellow()
        );
        println!("{}", format!("{:>30} {:>40} {}", "name", "id", "connections").yellow());
        let devices = &snapshot.registry().devices;
        for (name, ids) in &index.duplicate_names {
            for id in ids {
                let Some(&pos) = index.device_pos.get(id) else {
                    continue;
                };
                let connections = serde_json::to_string(&devices[pos].connections)?;
                println!(
                    "{}",
                    format!("{:>30} {:>40} {}", format!("{:?}", name), id, connections).yellow()
                );
            }
        }
    }

    println!(
        "Found {} devices by name by user.",
        index.device_by_user_name.len()
    );

    for (entry_id, count) in index.shared_config_entries() {
        println!(
            "config_entry \"{}\" is referenced from {} devices",
            entry_id, count
        );
    }
    Ok(())
}

fn print_removals(heading: &str, removals: &[PlannedRemoval]) {
    println!("{}", heading.bold());
    if removals.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for removal in removals {
        println!("  {} {} - {}", "•".cyan(), removal.id, removal.label);
    }
}
