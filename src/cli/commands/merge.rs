use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::visits::VisitService;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Merge { ids } = cmd else {
        return Ok(());
    };

    let mut service = VisitService::new(open_pool(cfg)?, cfg);
    let v = service.merge(ids)?;

    let exit = v
        .exit
        .map(|x| x.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "open".to_string());
    success(format!(
        "Merged into visit #{} ({} – {})",
        v.id,
        v.entry.format("%Y-%m-%d %H:%M"),
        exit
    ));

    Ok(())
}
