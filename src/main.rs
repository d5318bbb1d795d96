use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use hourspot::args::{self, CliAction, ParsedArgs};
use hourspot::catalog::Catalog;
use hourspot::config::Config;
use hourspot::constants::EXIT_FAILURE;
use hourspot::logger::Log;
use hourspot::store::CityStore;
use hourspot::{gazetteer, resolver, round_robin, sampler};

fn main() {
    let parsed = ParsedArgs::parse(std::env::args());

    let result = match parsed.action {
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            args::display_version();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        action => run(action),
    };

    if let Err(e) = result {
        Log::log_error(&format!("{:#}", e));
        Log::log_end();
        std::process::exit(EXIT_FAILURE);
    }
}

/// Load the configuration and catalog, build the store, and run the
/// requested query.
fn run(action: CliAction) -> Result<()> {
    Log::log_version();

    let config = Config::load()?;

    if let CliAction::All {
        target_hour: Some(hour),
        ..
    }
    | CliAction::Random {
        target_hour: Some(hour),
        ..
    } = action
    {
        if hour > hourspot::constants::MAXIMUM_TARGET_HOUR {
            anyhow::bail!(
                "--hour must be between 0 and {}, got {}",
                hourspot::constants::MAXIMUM_TARGET_HOUR,
                hour
            );
        }
    }

    let (store, freshly_built) = build_store(&config)?;
    let now = Utc::now();

    match action {
        CliAction::All {
            target_hour,
            min_population,
            limit,
        } => {
            let hour = target_hour.unwrap_or_else(|| config.target_hour());
            let floor = min_population.unwrap_or_else(|| config.min_population());
            let (cities, floor_used) = resolver::resolve_with_floor(
                &store,
                now,
                hour,
                floor,
                config.hard_floor(),
                config.floor_decay(),
            )
            .context("Failed to resolve cities")?;

            Log::log_block_start(&format!(
                "{} cities at hour {} (floor {} -> {})",
                cities.len(),
                hour,
                floor,
                floor_used
            ));

            let mut cities =
                round_robin::interleave(cities, |city| city.country_code.clone());
            if let Some(limit) = limit {
                cities.truncate(limit);
            }

            print_json(&json!({
                "count": cities.len(),
                "target_hour": hour,
                "requested_floor": floor,
                "floor_used": floor_used,
                "cities": cities,
            }))?;
        }
        CliAction::Random {
            target_hour,
            min_population,
        } => {
            let hour = target_hour.unwrap_or_else(|| config.target_hour());
            let floor = min_population.unwrap_or_else(|| config.min_population());
            let mut rng = rand::rng();
            let (city, floor_used) = sampler::pick_random(
                &store,
                now,
                hour,
                floor,
                config.hard_floor(),
                config.floor_decay(),
                &mut rng,
            )
            .context("Failed to sample a city")?;

            match &city {
                Some(city) => Log::log_block_start(&format!(
                    "Picked {} ({}) at floor {}",
                    city.name, city.timezone, floor_used
                )),
                None => Log::log_block_start(&format!(
                    "No city found even after relaxing the floor to {}",
                    floor_used
                )),
            }

            print_json(&json!({
                "target_hour": hour,
                "requested_floor": floor,
                "floor_used": floor_used,
                "city": city,
            }))?;
        }
        CliAction::Rebuild { force } => {
            // build_store already built every missing partition, so without
            // force the initial build count is the whole story
            let rebuilt = if force {
                store.rebuild_all(true)
            } else {
                freshly_built
            };
            Log::log_block_start(&format!(
                "Partition rebuild complete ({} rebuilt, force={})",
                rebuilt, force
            ));
        }
        CliAction::ShowHelp | CliAction::ShowVersion | CliAction::ShowHelpDueToError => {
            unreachable!("handled before run()")
        }
    }

    Log::log_end();
    Ok(())
}

/// Import the gazetteer and build a fully partitioned store.
///
/// # Returns
/// The store and the number of partitions built during initialization.
fn build_store(config: &Config) -> Result<(CityStore, usize)> {
    let data_dir = config.data_dir()?;
    let records = gazetteer::load_from_dir(&data_dir).with_context(|| {
        format!(
            "Failed to import the GeoNames dump from {} (download the files listed in the config first)",
            data_dir.display()
        )
    })?;

    let catalog = Catalog::from_records(records);
    Log::log_decorated(&format!(
        "Catalog ready: {} cities across {} timezones",
        catalog.cities().len(),
        catalog.timezones().len()
    ));

    let store = CityStore::new();
    store.install_catalog(catalog);
    let built = store.rebuild_all(false);
    Ok((store, built))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", rendered);
    Ok(())
}
