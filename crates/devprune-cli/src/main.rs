mod commands;

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use colored::Colorize;
use devprune_core::Selector;

#[derive(Parser)]
#[command(
    name = "devprune",
    version,
    about = "Delete a device and everything that depends on it from the registry files",
    long_about = "Delete a device and everything that depends on it from the registry files.\n\n\
        Copy 'core.entity_registry', 'core.device_registry' and 'core.config_entries' \
        into the working directory (or point --dir at them) before running. Sub-devices, \
        config entries no other device uses, and the devices' entities are removed too."
)]
struct Cli {
    /// Name of device to delete
    #[arg(long)]
    name: Option<String>,
    /// Id of device to delete (any given name is ignored)
    #[arg(long)]
    id: Option<String>,
    /// Directory holding the registry files
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// Show what would be removed without writing anything
    #[arg(long)]
    dry_run: bool,
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let Some(selector) = Selector::from_flags(cli.id, cli.name) else {
        // Best effort: the exit status reports the usage error.
        Cli::command().print_help().ok();
        std::process::exit(1);
    };

    match &selector {
        Selector::Id { id, name: Some(_) } => println!(
            "{}",
            format!(
                "Deleting the device with id \"{}\" (any given name will be ignored).",
                id
            )
            .green()
        ),
        Selector::Id { id, name: None } => {
            println!("{}", format!("Deleting the device with id \"{}\".", id).green())
        }
        Selector::Name(name) => {
            println!("{}", format!("Deleting the device named \"{}\".", name).green())
        }
    }

    if let Err(e) = commands::remove::run(&cli.dir, &selector, cli.dry_run) {
        eprintln!("{} {}", "ERROR:".red().bold(), e.to_string().red());
        std::process::exit(1);
    }
}
