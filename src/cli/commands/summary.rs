use crate::ai::generator_from_config;
use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::visits::VisitService;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::heading;
use crate::utils::colors::{GREY, RESET};
use crate::utils::date::{parse_date, today};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Summary { date, force } = cmd else {
        return Ok(());
    };

    let day = match date {
        Some(s) => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?,
        None => today(),
    };

    let mut service = VisitService::new(open_pool(cfg)?, cfg);
    let generator = generator_from_config(&cfg.ai);

    let outcome = service.summarize_day(day, generator.as_deref(), &cfg.ai, *force)?;

    heading(day);
    println!("{}", outcome.text);
    println!("{}({}, hash {}){}", GREY, outcome.source.label(), outcome.visits_hash, RESET);

    Ok(())
}
