pub mod catalog;
pub mod error;
pub mod export;
pub mod planner;
pub mod services;
pub mod state;
pub mod store;
pub mod types;
pub mod week;

use state::AppState;
use store::WeekPlanStore;
use types::{MealType, WeekDay};
use week::CalendarWeek;

/// Resolve the week to show from command line arguments.
///
/// No arguments selects the current week, `<year> <week>` a specific one.
pub fn parse_week_args(args: &[String]) -> Result<CalendarWeek, String> {
    match args {
        [] => Ok(week::current_week()),
        [year, week] => {
            let year: i32 = year
                .parse()
                .map_err(|_| format!("Invalid year: {}", year))?;
            let week: u32 = week
                .parse()
                .map_err(|_| format!("Invalid week: {}", week))?;
            CalendarWeek::new(year, week).map_err(|e| e.to_string())
        }
        _ => Err("Usage: speiseplan [<year> <week>]".to_string()),
    }
}

/// Text overview of one week: the KW label, then one line per weekday with
/// its date, special-day label or meal counts.
pub fn week_overview(state: &AppState, week: CalendarWeek) -> Result<String, String> {
    let plan = state
        .store
        .get_week_plan(week)
        .map_err(|e| e.to_string())?;

    let mut lines = vec![week.to_string()];
    for (day, date) in WeekDay::ALL.iter().zip(week.days()) {
        let mut line = format!("{:<10} {}", day.display_name(), date.format("%d.%m.%Y"));
        if let Some(plan) = &plan {
            match plan.special_day(*day) {
                Some(special) => {
                    line.push_str(&format!("  {}", special.display_label()));
                }
                None => {
                    for meal in MealType::ALL {
                        line.push_str(&format!(
                            "  {}: {}",
                            meal.display_name(),
                            plan.entries_for(*day, meal).len()
                        ));
                    }
                }
            }
        }
        lines.push(line);
    }
    if plan.is_none() {
        lines.push("Kein Speiseplan angelegt".to_string());
    }
    Ok(lines.join("\n"))
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let week = match parse_week_args(&args) {
        Ok(week) => week,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let state = AppState::new();
    match week_overview(&state, week) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            log::error!("Failed to show {}: {}", week, e);
            std::process::exit(1);
        }
    }
}
