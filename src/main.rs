use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::path::PathBuf;

use schoolshots::catalog::{
    classify_within, import_roster, query_photos, ClassStats, DashboardStats, EventOverview,
    PhotoQuery, Principal, Role, Roster,
};
use schoolshots::config::Config;
use schoolshots::db::Database;
use schoolshots::logging;

#[derive(Debug)]
enum Command {
    Init,
    Import(PathBuf),
    /// `page_size` of `None` takes the configured default.
    Photos { query: PhotoQuery, page_size: Option<u32> },
    Events { school_id: Option<i64> },
    Stats,
}

struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    print_help();
    std::process::exit(1);
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(value) => value,
        None => usage_error(&format!("{} requires a value", flag)),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> T {
    value
        .parse()
        .unwrap_or_else(|_| usage_error(&format!("{} expects a number, got {:?}", flag, value)))
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command_name = None;
    let mut positional = Vec::new();
    let mut query = PhotoQuery::new(1, 0);
    let mut page_size = None;
    let mut school_id = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("schoolshots {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(next_value(&args, &mut i, "--config")));
            }
            "--page" => query.page = parse_number(next_value(&args, &mut i, "--page"), "--page"),
            "--page-size" => {
                page_size = Some(parse_number(next_value(&args, &mut i, "--page-size"), "--page-size"))
            }
            "--school" => {
                let id = parse_number(next_value(&args, &mut i, "--school"), "--school");
                query.school_id = Some(id);
                school_id = Some(id);
            }
            "--class" => {
                query.class_id = Some(parse_number(next_value(&args, &mut i, "--class"), "--class"))
            }
            "--event" => {
                query.event_id = Some(parse_number(next_value(&args, &mut i, "--event"), "--event"))
            }
            "--search" => query.search = Some(next_value(&args, &mut i, "--search").to_string()),
            "--all" => query.public_only = false,
            other if other.starts_with('-') => usage_error(&format!("Unknown argument: {}", other)),
            other if command_name.is_none() => command_name = Some(other.to_string()),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = match command_name.as_deref() {
        Some("init") => Command::Init,
        Some("import") => match positional.first() {
            Some(path) => Command::Import(PathBuf::from(path)),
            None => usage_error("import requires a FILE.json argument"),
        },
        Some("photos") => Command::Photos { query, page_size },
        Some("events") => Command::Events { school_id },
        Some("stats") => Command::Stats,
        Some(other) => usage_error(&format!("Unknown command: {}", other)),
        None => usage_error("no command given"),
    };

    Cli {
        config_path,
        command,
    }
}

fn print_help() {
    println!(
        r#"schoolshots - school photography catalog administration

USAGE:
    schoolshots [OPTIONS] <COMMAND>

COMMANDS:
    init                Create the catalog tables
    import FILE.json    Import a roster of schools, classes, students and photos
                        (all rows or none)
    photos              List gallery photos
        --page N            Page number (default 1)
        --page-size N       Photos per page (default from config)
        --school ID         Only photos from this school
        --class ID          Only photos from this class
        --event ID          Only photos from this event
        --search TERM       Match reference code, class, school or event name
        --all               Include photos hidden from the public gallery
    events              List photo-shoot events with their status
        --school ID         Only events for this school
    stats               Show catalog statistics

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SCHOOLSHOTS_CONFIG  Path to config file (overrides default location)
    SCHOOLSHOTS_LOG     Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/schoolshots/config.toml

See also: schoolshots-server --help"#
    );
}

fn main() -> Result<()> {
    let cli = parse_args();

    let _ = logging::init(None, logging::Fallback::File);

    let config = match &cli.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db = Database::open(&config.database).context("Failed to open catalog store")?;

    match cli.command {
        Command::Init => {
            db.initialize()?;
            println!("Catalog initialized");
        }
        Command::Import(path) => {
            db.initialize()?;
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let roster = Roster::from_json(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let operator = std::env::var("USER").unwrap_or_else(|_| "cli".to_string());
            let principal = Principal::new(operator, Role::PhotographerAdmin);
            let summary = import_roster(&db, &principal, &roster)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Photos { mut query, page_size } => {
            query.page_size = page_size.unwrap_or(config.server.default_page_size);
            list_photos(&db, &query)?;
        }
        Command::Events { school_id } => {
            list_events(&db, school_id, config.events.upcoming_window_days)?;
        }
        Command::Stats => show_stats(&db)?,
    }

    Ok(())
}

fn list_photos(db: &Database, query: &PhotoQuery) -> Result<()> {
    let page = query_photos(db, query)?;
    if page.photos.is_empty() {
        println!("No photos found");
    }
    for photo in &page.photos {
        let school = photo.school.as_ref().map_or("-", |s| s.school_name.as_str());
        let class = photo.class.as_ref().map_or("-", |c| c.class_name.as_str());
        let event = photo.event.as_ref().map_or("-", |e| e.event_name.as_str());
        println!(
            "{:<10} {:<24} {:<16} {:<24} {}{}",
            photo.photo.photo_reference_code,
            school,
            class,
            event,
            photo.photo.uploaded_at.format("%Y-%m-%d %H:%M"),
            if photo.photo.is_public_in_gallery { "" } else { "  (hidden)" }
        );
    }
    if page.has_more {
        println!("More photos: --page {}", query.page + 1);
    }
    Ok(())
}

fn list_events(db: &Database, school_id: Option<i64>, window_days: i64) -> Result<()> {
    let now = Utc::now();
    let events: Vec<_> = db
        .list_events()?
        .into_iter()
        .filter(|e| school_id.is_none() || e.event.school_id == school_id)
        .collect();

    for entry in &events {
        let status = classify_within(&entry.event, now, window_days);
        let school = entry.school.as_ref().map_or("-", |s| s.school_name.as_str());
        let shoot = entry
            .event
            .shoot_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unscheduled".to_string());
        println!(
            "{:<6} {:<28} {:<24} {:<12} {}",
            entry.event.event_id, entry.event.event_name, school, shoot, status
        );
    }

    let overview = EventOverview::from_events(events.iter().map(|e| &e.event), now);
    println!(
        "{} events: {} upcoming, {} past, {} with order deadline passed",
        overview.total, overview.upcoming, overview.past, overview.overdue_orders
    );
    Ok(())
}

fn show_stats(db: &Database) -> Result<()> {
    let schools = db.list_schools()?;
    let classes = db.list_classes()?;
    let year = Utc::now().year();

    let dashboard = DashboardStats::compute(&schools, &classes, year);
    println!(
        "Schools:              {} ({} with classes)",
        dashboard.total_schools, dashboard.schools_with_classes
    );
    println!("Classes:              {}", dashboard.total_classes);
    println!("Classes in {}:      {}", year, dashboard.classes_in_year);
    println!("Classes per school:   {:.1}", dashboard.average_classes_per_school);

    match ClassStats::compute(&classes) {
        Some(stats) => {
            println!("Teachers:             {}", stats.unique_teachers);
            println!("Academic years:       {}", stats.academic_years);
            println!("Classes with events:  {}", stats.classes_with_events);
        }
        None => println!("No classes yet"),
    }
    Ok(())
}
