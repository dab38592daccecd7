use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use log::info;

use dem_clipper::place::PlaceResolver;
use dem_clipper::{
    Config, Coordinate, ExtractionRequest, Extractor, RawExtractionRequest, Transformer,
};

fn cli() -> ClapCommand {
    ClapCommand::new("dem-clipper")
        .about("Clip DTM/DSM rasters to a bounding box and look up place boundaries")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            ClapCommand::new("extract")
                .about("Clip a product to a bounding box given in longitude/latitude")
                .arg(
                    Arg::new("corner1")
                        .help("First corner as 'lon,lat'")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("corner2")
                        .help("Opposite corner as 'lon,lat'")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("product")
                        .short('p')
                        .long("product")
                        .help("DTM or DSM")
                        .value_name("PRODUCT")
                        .default_value("DTM"),
                )
                .arg(
                    Arg::new("resolution")
                        .short('r')
                        .long("resolution")
                        .help("Output resolution, e.g. '2.0 m'")
                        .value_name("RES")
                        .default_value("0.5 m"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output GeoTIFF; defaults to the download file name")
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            ClapCommand::new("place")
                .about("Print the boundary of a named place as GeoJSON")
                .arg(Arg::new("name").help("Place name").required(true).index(1))
                .arg(
                    Arg::new("display")
                        .long("display")
                        .help("Output longitude/latitude instead of RD New")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("project")
                .about("Convert one coordinate between longitude/latitude and RD New")
                .arg(
                    Arg::new("x")
                        .help("Longitude, or easting with --inverse")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64))
                        .index(1),
                )
                .arg(
                    Arg::new("y")
                        .help("Latitude, or northing with --inverse")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64))
                        .index(2),
                )
                .arg(
                    Arg::new("inverse")
                        .short('i')
                        .long("inverse")
                        .help("Convert RD New to longitude/latitude")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn parse_corner(text: &str) -> anyhow::Result<(&str, &str)> {
    text.split_once(',')
        .map(|(lon, lat)| (lon.trim(), lat.trim()))
        .ok_or_else(|| anyhow!("Corner must be 'lon,lat', got '{}'", text))
}

async fn run_extract(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let text = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(String::as_str)
            .unwrap_or_default()
    };
    let corner1 = parse_corner(text("corner1"))?;
    let corner2 = parse_corner(text("corner2"))?;
    let product = matches.get_one::<String>("product").map(String::as_str).unwrap_or("DTM");
    let resolution = matches.get_one::<String>("resolution").map(String::as_str).unwrap_or("0.5 m");

    let raw = RawExtractionRequest::from_text(corner1, corner2, product, resolution);
    let request = ExtractionRequest::build(&raw, &Transformer::rd_new()?)?;
    let source = config.product_sources().resolve(request.product).await?;

    let extractor = Extractor::new(config.extractor_settings());
    let bytes = extractor.extract(&source, &request).await?;

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(request.download_filename()));
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {} ({} bytes)", output.display(), bytes.len());
    println!("{}", output.display());
    Ok(())
}

fn run_place(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let name = matches
        .get_one::<String>("name")
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| anyhow!("Name parameter is required"))?;

    let resolver = PlaceResolver::new(Arc::new(config.place_store()?), Transformer::rd_new()?);
    let geometry = if matches.get_flag("display") {
        resolver.resolve_for_display(name)?
    } else {
        resolver.resolve(name)?
    };
    println!("{}", serde_json::to_string_pretty(&geometry)?);
    Ok(())
}

fn run_project(matches: &ArgMatches) -> anyhow::Result<()> {
    let (Some(&x), Some(&y)) = (matches.get_one::<f64>("x"), matches.get_one::<f64>("y")) else {
        bail!("Both coordinates are required");
    };
    let transformer = Transformer::rd_new()?;

    if matches.get_flag("inverse") {
        let c = transformer.to_display(Coordinate::new(x, y))?;
        println!("{:.6} {:.6}", c.lon(), c.lat());
    } else {
        let input = Coordinate::checked_lonlat(x, y)
            .ok_or_else(|| anyhow!("({}, {}) is outside longitude ±180 / latitude ±90", x, y))?;
        let c = transformer.to_native(input)?;
        println!("{:.3} {:.3}", c.x, c.y);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("Failed to load configuration")?;

    match matches.subcommand() {
        Some(("extract", sub)) => run_extract(&config, sub).await,
        Some(("place", sub)) => run_place(&config, sub),
        Some(("project", sub)) => run_project(sub),
        _ => bail!("Unknown command"),
    }
}
