use crate::cli::commands::{ask_confirmation, open_pool};
use crate::cli::parser::{Commands, VisitAction};
use crate::config::Config;
use crate::core::visits::VisitService;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use crate::utils::date::today;
use crate::utils::time::{parse_datetime, parse_moment, parse_optional_moment};
use chrono::{Local, NaiveDateTime, Timelike};

fn now_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Visit { action } = cmd else {
        return Ok(());
    };

    let mut service = VisitService::new(open_pool(cfg)?, cfg);

    match action {
        VisitAction::Enter { place, at } => {
            let at = match at {
                Some(s) => parse_moment(s, today())?,
                None => now_minute(),
            };
            let v = service.enter(*place, at)?;
            success(format!(
                "Visit #{} opened at place #{} ({})",
                v.id,
                place,
                v.entry.format("%Y-%m-%d %H:%M")
            ));
        }

        VisitAction::Exit { place, at } => {
            let at = match at {
                Some(s) => parse_moment(s, today())?,
                None => now_minute(),
            };
            let v = service.exit(*place, at)?;
            success(format!(
                "Visit #{} closed ({} min)",
                v.id,
                v.duration_minutes().unwrap_or(0)
            ));
        }

        VisitAction::Add {
            place,
            entry,
            exit,
            notes,
        } => {
            let entry =
                parse_datetime(entry).ok_or_else(|| AppError::InvalidTime(entry.clone()))?;
            let exit = parse_optional_moment(exit.as_ref(), entry.date())?;
            let v = service.add(*place, entry, exit, notes.clone())?;
            success(format!("Visit #{} recorded at place #{}", v.id, place));
        }

        VisitAction::Note { id, text } => {
            let v = service.set_notes(*id, text)?;
            if v.notes_text().is_some() {
                success(format!("Notes of visit #{} updated", id));
            } else {
                success(format!("Notes of visit #{} cleared", id));
            }
        }

        VisitAction::Del { id, yes } => {
            let v = service.visit(*id)?;
            let prompt = format!(
                "Delete visit #{} ({})? This action is irreversible.",
                v.id,
                v.entry.format("%Y-%m-%d %H:%M")
            );
            if !*yes && !ask_confirmation(&prompt) {
                info("Operation cancelled.");
                return Ok(());
            }
            service.delete(*id)?;
            success(format!("Visit #{} has been deleted.", id));
        }
    }

    Ok(())
}
