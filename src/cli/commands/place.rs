use crate::cli::commands::open_pool;
use crate::cli::parser::{Commands, PlaceAction};
use crate::config::Config;
use crate::core::places::PlaceLogic;
use crate::errors::{AppError, AppResult};
use crate::models::place::PlaceCategory;
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREY, RESET};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Place { action } = cmd else {
        return Ok(());
    };

    let pool = open_pool(cfg)?;

    match action {
        PlaceAction::Add {
            name,
            category,
            lat,
            lon,
            address,
        } => {
            let cat = PlaceCategory::from_code(category)
                .ok_or_else(|| AppError::InvalidCategory(category.clone()))?;
            let place = PlaceLogic::add(&pool, &cfg.user_id, name, cat, *lat, *lon, address)?;
            success(format!("Saved place #{} '{}'", place.id, place.name));
        }

        PlaceAction::List => {
            let places = PlaceLogic::list(&pool, &cfg.user_id)?;
            if places.is_empty() {
                info("No saved places.");
                return Ok(());
            }

            let name_w = places.iter().map(|p| p.name.chars().count()).max().unwrap_or(4);
            for p in places {
                let address = if p.address.is_empty() {
                    format!("{GREY}--{RESET}")
                } else {
                    p.address.clone()
                };
                println!(
                    "{:>4}  {:<name_w$}  {:<7}  {:>10.5}, {:>10.5}  {}",
                    p.id,
                    p.name,
                    p.category.code(),
                    p.latitude,
                    p.longitude,
                    address,
                    name_w = name_w
                );
            }
        }

        PlaceAction::Del { id } => {
            let place = PlaceLogic::delete(&pool, &cfg.user_id, *id)?;
            success(format!("Deleted place #{} '{}'", place.id, place.name));
        }
    }

    Ok(())
}
