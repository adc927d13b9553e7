//! `smark` - CLI for screenmark
//!
//! This binary records points and measurements into the configured history
//! and prints, exports or reorganises what has been recorded.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;

use screenmark::cli::{Cli, Command, ConfigCommand, GroupCommand, ListCommand, StatusCommand};
use screenmark::export::describe;
use screenmark::storage::schema::Document;
use screenmark::{init_logging, CaptureEvent, Config, HistoryStore, LoadOutcome, Point, Recorded};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        command => {
            let mut store = open_store(&config)?;
            handle_command(&mut store, &config, command)
        }
    }
}

fn open_store(config: &Config) -> Result<HistoryStore> {
    let path = config.history_path();
    let (store, outcome) = HistoryStore::open(&path, config.store_options())
        .with_context(|| format!("failed to open history at {}", path.display()))?;

    match outcome {
        LoadOutcome::Corrupt(warning) => {
            eprintln!("warning: {warning}; starting with an empty history");
            if let Some(backup) = &warning.backup {
                eprintln!("warning: the unreadable file was copied to {}", backup.display());
            }
        }
        LoadOutcome::Migrated { from_version, .. } => {
            eprintln!("note: upgraded history from version {from_version}");
        }
        LoadOutcome::Missing | LoadOutcome::Loaded { .. } => {}
    }
    Ok(store)
}

fn handle_command(store: &mut HistoryStore, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Point(cmd) => {
            let id = store.add_point(cmd.x, cmd.y, cmd.label.as_deref(), cmd.group)?;
            println!("{id}");
        }
        Command::Ruler(cmd) => {
            let event = CaptureEvent::Ruler {
                start: Point::new(cmd.x1, cmd.y1),
                end: Point::new(cmd.x2, cmd.y2),
                free: cmd.free,
            };
            let recorded = store.record(event, config.capture.align_ratio, cmd.group)?;
            if let Some(label) = &cmd.label {
                store.rename(recorded.primary(), label)?;
            }
            if let Recorded::Ruler {
                measurement,
                auto_aligned,
                ..
            } = recorded
            {
                print_distance(store, measurement, auto_aligned)?;
            }
        }
        Command::Measure(cmd) => {
            let id = store.add_measurement(cmd.start, cmd.end, cmd.label.as_deref(), cmd.group)?;
            print_distance(store, id, false)?;
        }
        Command::Group(group_cmd) => handle_group(store, group_cmd)?,
        Command::Rename { id, label } => store.rename(id, &label)?,
        Command::Delete { id } => {
            let removed = store.delete(id)?;
            println!("Deleted {} entries", removed.len());
        }
        Command::Move(cmd) => store.move_to(cmd.id, cmd.into, cmd.at)?,
        Command::Sort(cmd) => store.sort(cmd.group, cmd.by.into(), !cmd.desc)?,
        Command::Distance { id } => match store.distance_of(id)? {
            Some(distance) => println!("{distance:.2}px"),
            None => println!("orphaned"),
        },
        Command::Nearest(cmd) => {
            let radius = cmd.radius.unwrap_or(config.capture.hit_radius);
            let history = store.history();
            match history.nearest(cmd.x, cmd.y, radius) {
                Some(id) => {
                    let entry = history.entry(id)?;
                    println!("{id}  {}", describe(history, entry));
                }
                None => println!("Nothing within {radius}px of ({}, {})", cmd.x, cmd.y),
            }
        }
        Command::List(cmd) => handle_list(store, &cmd)?,
        Command::Export(cmd) => {
            let options = config.export_options();
            match cmd.output {
                Some(path) => {
                    store.export_to(&path, &options)?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{}", store.export_text(&options)),
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("this removes every entry; use --yes to confirm");
            }
            store.clear()?;
            println!("History cleared.");
        }
        Command::Status(cmd) => handle_status(store, &cmd)?,
        Command::Config(config_cmd) => handle_config(config, config_cmd)?,
    }
    Ok(())
}

fn print_distance(store: &HistoryStore, id: screenmark::EntryId, aligned: bool) -> Result<()> {
    let distance = store.distance_of(id)?.unwrap_or_default();
    let suffix = if aligned { " (aligned)" } else { "" };
    println!("{id}  {distance:.2}px{suffix}");
    Ok(())
}

fn handle_group(store: &mut HistoryStore, cmd: GroupCommand) -> Result<()> {
    match cmd {
        GroupCommand::New { label, parent } => {
            let id = store.add_group(Some(&label), parent)?;
            println!("{id}");
        }
        GroupCommand::Wrap { ids, label } => {
            let id = store.group_entries(&ids, label.as_deref())?;
            println!("{id}");
        }
        GroupCommand::Fold { id } => store.set_expanded(id, false)?,
        GroupCommand::Unfold { id } => store.set_expanded(id, true)?,
    }
    Ok(())
}

fn handle_list(store: &HistoryStore, cmd: &ListCommand) -> Result<()> {
    let history = store.history();

    if cmd.json {
        let document = Document::from_history(history);
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if let Some(filter) = &cmd.filter {
        let pattern = Regex::new(filter).map_err(screenmark::Error::from)?;
        for id in history.find(&pattern) {
            let entry = history.entry(id)?;
            println!("{id:>4}  {}", describe(history, entry));
        }
        return Ok(());
    }

    // Children of folded groups stay hidden.
    let mut folded_at: Option<usize> = None;
    for (depth, entry) in history.walk() {
        if let Some(level) = folded_at {
            if depth > level {
                continue;
            }
            folded_at = None;
        }
        println!(
            "{:>4}  {}{}",
            entry.id,
            "  ".repeat(depth),
            describe(history, entry)
        );
        if entry.as_group().is_some_and(|g| !g.expanded) {
            folded_at = Some(depth);
        }
    }
    Ok(())
}

fn handle_status(store: &HistoryStore, cmd: &StatusCommand) -> Result<()> {
    let stats = store.stats();

    if cmd.json {
        let status = serde_json::json!({
            "history_path": store.path(),
            "points": stats.points,
            "measurements": stats.measurements,
            "groups": stats.groups,
            "orphans": stats.orphans,
            "next_id": stats.next_id,
            "file_size_bytes": stats.file_size_bytes,
            "oldest_entry": stats.oldest_entry,
            "newest_entry": stats.newest_entry,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("smark status");
        println!("------------");
        println!("History:       {}", store.path().display());
        println!("Points:        {}", stats.points);
        println!("Measurements:  {} ({} orphaned)", stats.measurements, stats.orphans);
        println!("Groups:        {}", stats.groups);
        println!("Next id:       {}", stats.next_id);
        println!("File size:     {} bytes", stats.file_size_bytes);
        if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
            println!("Oldest entry:  {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            println!("Newest entry:  {}", newest.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  History path:       {}", config.history_path().display());
                println!("  Autosave:           {}", config.storage.autosave);
                println!("  Strict load:        {}", config.storage.strict_load);
                println!("  Backup corrupt:     {}", config.storage.backup_corrupt);
                println!();
                println!("[Capture]");
                println!("  Align ratio:        {}", config.capture.align_ratio);
                println!("  Hit radius:         {}px", config.capture.hit_radius);
                println!();
                println!("[Export]");
                println!("  Title:              {}", config.export.title);
                println!("  Indent:             {}", config.export.indent);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
