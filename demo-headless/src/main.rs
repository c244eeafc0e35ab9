use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use firms_cluster_core::{
    analyze, AnalysisConfig, AnalysisReport, EngineeredEmbedder, FireDetection, SelectionMode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Known fire-prone locations used to seed synthetic hotspots (lat, lon, label)
const HOTSPOT_SITES: [(f64, f64, &str); 8] = [
    (38.0, 23.5, "Attica"),
    (40.0, -8.0, "Central Portugal"),
    (43.5, 5.5, "Provence"),
    (60.0, 20.0, "Åland"),
    (48.0, 35.0, "Donbas"),
    (37.5, 14.0, "Sicily"),
    (42.0, 25.0, "Thrace"),
    (52.5, -1.5, "Midlands"),
];

/// Cluster a synthetic batch of European fire detections
#[derive(Parser, Debug)]
#[command(name = "firms-cluster-demo")]
#[command(about = "Adaptive clustering and regional classification of fire detections", long_about = None)]
struct Args {
    /// Number of synthetic detections
    #[arg(short = 'n', long, default_value_t = 300)]
    count: usize,

    /// Number of hotspots to scatter detections around (1-8)
    #[arg(long, default_value_t = 3)]
    hotspots: usize,

    /// Positional spread around each hotspot in degrees
    #[arg(long, default_value_t = 0.5)]
    spread: f64,

    /// Fraction of detections scattered uniformly over Europe
    #[arg(long, default_value_t = 0.05)]
    background: f64,

    /// Seed for the synthetic batch
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// JSON configuration file; missing keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run both methods and keep the better one
    #[arg(long)]
    compare: bool,

    /// Write the full report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the effective configuration as JSON and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => AnalysisConfig::default(),
    };
    if args.compare {
        config.selection = SelectionMode::Compare;
    }

    if let Some(path) = &args.save_config {
        config.save_json(path).map_err(|e| e.to_string())?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    println!("=== FIRMS Cluster Demo ===\n");

    let window_end = Utc::now();
    let detections = synthesize(args, &config, window_end);
    println!(
        "Generated {} detections around {} hotspot(s) over {} day(s)",
        detections.len(),
        args.hotspots.clamp(1, HOTSPOT_SITES.len()),
        config.days_back
    );
    for (lat, lon, label) in HOTSPOT_SITES.iter().take(args.hotspots.clamp(1, HOTSPOT_SITES.len())) {
        println!("  {label:<18} ({lat:6.2}, {lon:6.2})");
    }
    println!();

    let embedder = EngineeredEmbedder::from_analysis_config(&config, window_end);
    let report = analyze(&detections, &embedder, &config).map_err(|e| e.to_string())?;
    print_report(&report);

    if let Some(path) = &args.output {
        report.save_json(path).map_err(|e| e.to_string())?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

/// Hotspot-centred detections plus uniform background over the configured bounds
fn synthesize(args: &Args, config: &AnalysisConfig, window_end: DateTime<Utc>) -> Vec<FireDetection> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let sites = &HOTSPOT_SITES[..args.hotspots.clamp(1, HOTSPOT_SITES.len())];
    let bounds = config.region_bounds;
    let window_minutes = i64::from(config.days_back) * 24 * 60;
    let spread = args.spread.abs();

    (0..args.count)
        .map(|i| {
            let background = rng.random::<f64>() < args.background.clamp(0.0, 1.0);
            let (lat, lon) = if background {
                (
                    rng.random_range(bounds.lat_min..=bounds.lat_max),
                    rng.random_range(bounds.lon_min..=bounds.lon_max),
                )
            } else {
                let (lat, lon, _) = sites[i % sites.len()];
                (
                    (lat + rng.random_range(-spread..=spread)).clamp(-90.0, 90.0),
                    (lon + rng.random_range(-spread..=spread)).clamp(-180.0, 180.0),
                )
            };
            let timestamp = window_end - Duration::minutes(rng.random_range(0..window_minutes));

            FireDetection::new(i as u64, lat, lon, timestamp)
                .with_intensity(rng.random_range(310.0..380.0), rng.random_range(1.0..60.0))
                .with_confidence(rng.random_range(30.0..100.0))
        })
        .collect()
}

fn print_report(report: &AnalysisReport) {
    println!("Method: {} ({})", report.method, report.selection_reason);
    println!(
        "Quality: {} [{:?}], silhouette {:.3}, noise {:.1}%",
        report.quality.score,
        report.quality.metric,
        report.quality.silhouette,
        report.quality.noise_ratio * 100.0
    );
    if report.truncated > 0 {
        println!("Truncated: {} detections beyond max_samples", report.truncated);
    }

    println!("\nCluster | Count | Size      | Primary region               | Peak hour | Mean FRP");
    println!("--------|-------|-----------|------------------------------|-----------|---------");
    for (id, profile) in &report.summary.clusters {
        println!(
            "{:7} | {:5} | {:9} | {:28} | {:9} | {:8.1}",
            id,
            profile.count,
            format!("{:?}", profile.size_class),
            profile.regions.primary_region,
            profile.temporal.peak_hour,
            profile.intensity.frp_mean
        );
    }
    println!("  noise | {:5} |", report.summary.noise_points);

    println!("\nRegion                        | Count | Mean FRP");
    println!("------------------------------|-------|---------");
    for (name, stats) in &report.summary.regions {
        println!("{:29} | {:5} | {:8.1}", name, stats.count, stats.mean_frp);
    }
    if report.summary.out_of_bounds > 0 {
        println!("\nOutside area of interest: {}", report.summary.out_of_bounds);
    }
}
