use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::timeline::MonthView;
use crate::core::visits::VisitService;
use crate::errors::{AppError, AppResult};
use crate::models::visit::VisitSegment;
use crate::ui::messages::heading;
use crate::utils::colors::{GREY, RESET, color_for_open};
use crate::utils::date::{parse_date, parse_month, today};
use crate::utils::formatting::truncate;
use crate::utils::mins2readable;
use chrono::NaiveDate;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::List { date, month, json } = cmd else {
        return Ok(());
    };

    let mut service = VisitService::new(open_pool(cfg)?, cfg);

    if let Some(m) = month {
        let (year, month) = parse_month(m).ok_or_else(|| AppError::InvalidMonth(m.clone()))?;
        let view = service.fetch_month(year, month)?;
        if *json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_month(&view);
        }
        return Ok(());
    }

    let day = match date {
        Some(s) => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?,
        None => today(),
    };

    let segments = service.fetch_day(day)?;
    if *json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else {
        print_day(day, &segments);
    }

    Ok(())
}

fn print_day(day: NaiveDate, segments: &[VisitSegment]) {
    heading(day.format("%A %Y-%m-%d"));

    if segments.is_empty() {
        println!("No visits for {}", day);
        return;
    }

    let name_w = segments
        .iter()
        .map(|s| s.place_name.chars().count())
        .max()
        .unwrap_or(5);

    for s in segments {
        let end = if s.open {
            "now".to_string()
        } else {
            s.end.format("%H:%M").to_string()
        };
        let marker = if s.continued { "↔" } else { " " };
        let notes = s
            .notes
            .as_deref()
            .map(|n| truncate(&n.replace('\n', " / "), 60))
            .unwrap_or_else(|| format!("{GREY}--{RESET}"));

        println!(
            "{:>5}  {}{} – {:<5}{} {} {:<name_w$}  {:>8}  {}",
            format!("#{}", s.visit_id),
            color_for_open(s.open),
            s.start.format("%H:%M"),
            end,
            RESET,
            marker,
            s.place_name,
            mins2readable(s.duration_minutes(), false, false),
            notes,
            name_w = name_w
        );
    }

    let total: i64 = segments.iter().map(VisitSegment::duration_minutes).sum();
    println!(
        "\nVisits: {} | Time at places: {}",
        segments.len(),
        mins2readable(total, false, false)
    );
}

fn print_month(view: &MonthView) {
    heading(format!("{:04}-{:02}", view.year, view.month));

    let mut any = false;
    for d in view.active_days() {
        any = true;
        println!(
            "{}  {:>2} visit(s)  {:>8}  {}",
            d.date.format("%Y-%m-%d %a"),
            d.visit_count,
            mins2readable(d.total_minutes, false, false),
            d.places.join(", ")
        );
    }

    if !any {
        println!("No visits in {:04}-{:02}", view.year, view.month);
    }
}
