use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use num_format::Locale;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use wbi_map::display::{PanelView, format_plain};
use wbi_map::{
    CodeResolver, CountryFeature, ExplorerConfig, IndicatorCatalog, InteractionCoordinator,
    Resolution, Settled,
};

#[derive(Parser, Debug)]
#[command(
    name = "wbi-map",
    version,
    about = "Look up World Bank indicators for a country by its map name"
)]
struct Cli {
    /// TOML config file (defaults to <config dir>/wbi-map/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ISO code a map country name resolves to.
    Resolve { name: String },
    /// List the indicators shown in the panel, in display order.
    Catalog,
    /// List every country name the resolver knows.
    Countries,
    /// Resolve a country, fetch its indicators and print the panel.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Country name as it appears on the map (e.g. "France")
    name: String,
    /// Print the dataset as JSON instead of panel text.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Seconds to wait for the API before giving up.
    #[arg(long, default_value_t = 60)]
    wait: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = ExplorerConfig::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Resolve { name } => cmd_resolve(&name),
        Command::Catalog => {
            for (i, (code, label)) in IndicatorCatalog::builtin().iter().enumerate() {
                println!("{:>2}  {:<16} {}", i + 1, code, label);
            }
            Ok(())
        }
        Command::Countries => {
            for name in CodeResolver::builtin().names() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Show(args) => cmd_show(&config, args),
    }
}

fn cmd_resolve(name: &str) -> Result<()> {
    match CodeResolver::builtin().resolve(name) {
        Resolution::Resolved(code) => {
            println!("{}", code);
            Ok(())
        }
        Resolution::Unresolved => anyhow::bail!("unresolved: no country code for {:?}", name),
    }
}

fn cmd_show(config: &ExplorerConfig, args: ShowArgs) -> Result<()> {
    let mut coord = InteractionCoordinator::from_config(config)?;
    let feature = CountryFeature::named(args.name.trim());

    if coord.click(&feature, Instant::now()).is_some() {
        match coord.wait_for_completion(Duration::from_secs(args.wait)) {
            Some(Settled::Applied { .. }) => {}
            Some(_) => {
                if let Some(f) = coord.last_failure() {
                    eprintln!("{}", f);
                }
            }
            None => eprintln!("timed out after {}s", args.wait),
        }
    } else if let Some(f) = coord.last_failure() {
        eprintln!("{}", f);
    }

    if args.json {
        let rows = coord.dataset().map(|ds| ds.to_rows()).unwrap_or_default();
        let out = serde_json::json!({
            "country": feature.name,
            "code": coord.dataset().and_then(|d| d.country()).map(|c| c.to_string()),
            "rows": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    // Raw numbers on the CLI; the GUI groups digits.
    match coord.dataset() {
        Some(ds) if !ds.is_empty() => {
            println!("{}", feature.name);
            for (label, value) in ds.rows() {
                println!("{}: {}", label, format_plain(value));
            }
        }
        _ => {
            for line in PanelView::from_coordinator(&coord, &Locale::en).lines() {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
