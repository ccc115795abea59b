use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use hospital_finder::config::FileConfig;
use hospital_finder::view::{write_csv, write_geojson};
use hospital_finder::{DefaultFinder, HospitalRecord, ResultsView, SearchStage};

/// Find hospitals near a city using OpenStreetMap data
///
/// Examples:
///   # List hospitals around Springfield
///   hospital-finder -c "Springfield, Illinois"
///
///   # Only show entries mentioning "clinic" and save everything as CSV
///   hospital-finder -c Leeds -f clinic --csv
///
///   # Zoom in on the second result and export map markers
///   hospital-finder -c Lyon --select 2 --geojson lyon.geojson
#[derive(Parser, Debug)]
#[command(name = "hospital-finder")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches hospital-finder.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// City to search around
    #[arg(short = 'c', long)]
    city: Option<String>,

    /// Search radius in meters
    #[arg(short = 'r', long)]
    radius: Option<u32>,

    /// Only list hospitals whose name or address contains this text
    #[arg(short = 'f', long)]
    filter: Option<String>,

    /// Show details for the Nth listed hospital (1-based, after filtering)
    #[arg(long)]
    select: Option<usize>,

    /// Export all results as CSV (defaults to hospitals_in_{city}.csv)
    #[arg(long, num_args = 0..=1)]
    csv: Option<Option<PathBuf>>,

    /// Export map markers as GeoJSON
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Skip the map-search fallback when few results are found
    #[arg(long)]
    no_fallback: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let mut config = match args.config {
        Some(ref path) => FileConfig::load_from(path)?,
        None => FileConfig::load().unwrap_or_default(),
    };

    let verbose = args.verbose || config.verbose;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();

    let city = match args.city.clone().or_else(|| config.city.clone()) {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => bail!("Must provide a city with --city/-c or in the config file"),
    };
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    if args.no_fallback {
        config.fallback = false;
    }

    println!("hospital-finder");
    println!("===============");
    println!();

    if verbose {
        println!("Configuration:");
        println!("  City: {}", city);
        println!("  Radius: {}m", config.radius);
        println!(
            "  Fallback: {} (below {} results)",
            if config.fallback { "enabled" } else { "disabled" },
            config.fallback_threshold
        );
        println!("  Nominatim: {}", config.endpoints.nominatim_url);
        println!("  Overpass: {}", config.endpoints.overpass_url);
        println!();
    }

    let finder = DefaultFinder::from_config(&config)?;

    let spinner = create_spinner("Starting search...");
    let start = Instant::now();
    let mut stage = SearchStage::Idle;
    let result = finder.search_with_progress(&city, |s| {
        if s != SearchStage::Failed {
            stage = s;
        }
        spinner.set_message(format!("{}...", capitalize(&s.to_string())));
    });

    let hospitals = match result {
        Ok(h) => {
            spinner.finish_with_message(format!(
                "Found {} hospital(s) near {} [{:.1}s]",
                h.len(),
                city,
                start.elapsed().as_secs_f32()
            ));
            h
        }
        Err(e) => {
            spinner.abandon_with_message(format!("Search failed while {}", stage));
            return Err(e).context(format!("Search for hospitals in {} failed", city));
        }
    };

    let mut view = ResultsView::new();
    view.replace_results(city.as_str(), hospitals);
    if let Some(ref term) = args.filter {
        view.set_filter(term.as_str());
    }

    println!();
    print_list(&view);

    if let Some(n) = args.select {
        let id = view
            .filtered()
            .get(n.wrapping_sub(1))
            .map(|h| h.id.clone())
            .with_context(|| format!("--select {} is out of range", n))?;
        if let Some(record) = view.select(&id) {
            print_details(record);
        }
        let viewport = view.viewport();
        println!(
            "  Map: centre ({:.4}, {:.4}), zoom {}",
            viewport.center.lat, viewport.center.lon, viewport.zoom
        );
        println!();
    }

    if let Some(ref csv) = args.csv {
        let path = csv.clone().unwrap_or_else(|| view.export_file_name());
        write_csv(&path, view.hospitals())?;
        println!("Wrote CSV: {}", path.display());
    }

    if let Some(ref path) = args.geojson {
        write_geojson(path, view.hospitals())?;
        println!("Wrote GeoJSON: {}", path.display());
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn print_list(view: &ResultsView) {
    let shown = view.filtered();

    println!(
        "Hospitals in {} ({} found, {} shown)",
        view.city(),
        view.hospitals().len(),
        shown.len()
    );
    println!();

    if shown.is_empty() {
        if view.hospitals().is_empty() {
            println!("  No hospitals found");
        } else {
            println!("  No hospitals match your search");
        }
        println!();
        return;
    }

    for (i, hospital) in shown.iter().enumerate() {
        println!("{:>3}. {}", i + 1, hospital.name);
        println!("     {}", hospital.address);
        if let Some(ref phone) = hospital.phone {
            println!("     Phone: {}", phone);
        }
        if let Some(ref website) = hospital.website {
            println!("     Website: {}", website);
        }
    }
    println!();
}

fn print_details(hospital: &HospitalRecord) {
    println!("Selected: {}", hospital.name);
    println!("  Address: {}", hospital.address);
    if let Some(ref phone) = hospital.phone {
        println!("  Phone: {}", phone);
    }
    if let Some(ref website) = hospital.website {
        println!("  Website: {}", website);
    }
    if let Some(ref kind) = hospital.facility_type {
        println!("  Type: {}", kind);
    }
    if !hospital.services.is_empty() {
        println!("  Services: {}", hospital.services.join(", "));
    }
    println!(
        "  Location: ({:.5}, {:.5})",
        hospital.latitude, hospital.longitude
    );
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
