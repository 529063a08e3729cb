use line_planner::{
    DayLabel, LineId, PlanFilter, PlannerConfig, PlanningSession, RowStatus, load_config_from_json,
    load_demand_from_path, save_config_to_json, save_workbook_to_csv_dir, save_workbook_to_json,
    save_workbook_to_xlsx,
};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| match col.get(row_idx) {
                Ok(AnyValue::Null) | Err(_) => String::new(),
                Ok(AnyValue::String(s)) => s.to_string(),
                Ok(av) => av.to_string(),
            })
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut out = String::from("|");
        for (i, value) in values.iter().enumerate() {
            let pad = widths[i].saturating_sub(value.chars().count());
            out.push(' ');
            out.push_str(value);
            out.push_str(&" ".repeat(pad));
            out.push_str(" |");
        }
        out
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <xlsx|csv path>               Load weekly demand and plan it\n  show                               Show the filtered plan\n  filter day <Lunes,Martes,...>      Restrict the view to days\n  filter line <1,3,...>              Restrict the view to lines\n  filter brand <MILKA,...>           Restrict the view to brands\n  filter clear                       Show the whole plan\n  filter show                        Show the active filter and options\n  metrics                            Active lines, headcount, total boxes\n  daily                              Boxes per day for the filtered plan\n  outcomes                           Per-row scheduled vs requested\n  export xlsx <path>                 Save full plan + filtered view as a workbook\n  export json <path>                 Save full plan + filtered view as JSON\n  export csv <dir>                   Save full plan + filtered view as two CSVs\n  config show                        Show planner configuration\n  config load <json_path>            Load configuration and re-plan\n  config save <json_path>            Save configuration to JSON\n  quit|exit                          Exit"
    );
}

fn print_config(config: &PlannerConfig) {
    let automatic = config
        .automatic_lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Week start         : {}", config.week_start);
    println!(
        "Shift              : {:02}:00-{:02}:00",
        config.start_hour, config.end_hour
    );
    println!("Setup minutes      : {}", config.setup_minutes);
    println!("Lines              : {}", config.line_count);
    println!("Automatic lines    : {}", automatic);
    println!(
        "Automatic keywords : {}",
        config.automatic_keywords.join(", ")
    );
    println!("Crew per line      : {}", config.crew_per_line);
}

fn print_filter(session: &PlanningSession) {
    let filter = session.filter();
    let join = |values: Vec<String>| {
        if values.is_empty() {
            "(all)".to_string()
        } else {
            values.join(", ")
        }
    };
    println!(
        "Days   : {}",
        join(filter.days.iter().map(ToString::to_string).collect())
    );
    println!(
        "Lines  : {}",
        join(filter.lines.iter().map(ToString::to_string).collect())
    );
    println!("Brands : {}", join(filter.brands.clone()));
    if let Some(plan) = session.plan() {
        println!(
            "Options: days [{}] lines [{}] brands [{}]",
            plan.days()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            plan.lines()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            plan.brands().join(", ")
        );
    }
}

fn print_view(session: &PlanningSession) {
    match session.view() {
        Some(view) if view.is_empty() => println!("No segments match the current filter."),
        Some(view) => match view.to_dataframe() {
            Ok(df) => println!("{}", render_df_as_text_table(&df)),
            Err(e) => println!("Error rendering plan: {}", e),
        },
        None => print_no_plan(),
    }
}

fn print_no_plan() {
    println!("No plan loaded. Use 'load <csv_path>' first.");
}

fn print_plan_summary(session: &PlanningSession) {
    let Some(plan) = session.plan() else {
        print_no_plan();
        return;
    };
    println!(
        "Loaded {} demand rows; {} segments scheduled.",
        session.demand().len(),
        plan.segments().len()
    );
    if plan.is_empty() {
        println!("No segments scheduled.");
    }
    for outcome in plan.truncated_rows() {
        let reason = match outcome.status {
            RowStatus::Truncated { reason } => format!("{reason:?}"),
            RowStatus::Completed => continue,
        };
        println!(
            "Warning: row {} ({}) truncated: {}/{} boxes scheduled ({}).",
            outcome.row_index, outcome.product, outcome.scheduled, outcome.requested, reason
        );
    }
}

fn split_csv(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn apply_filter(session: &mut PlanningSession, dimension: Option<&str>, rest: &str) {
    let mut filter: PlanFilter = session.filter().clone();
    match dimension {
        Some("day") => {
            let mut days = Vec::new();
            for value in split_csv(rest) {
                match value.parse::<DayLabel>() {
                    Ok(day) => days.push(day),
                    Err(e) => {
                        println!("{}", e);
                        return;
                    }
                }
            }
            filter.days = days;
        }
        Some("line") => {
            let mut lines = Vec::new();
            for value in split_csv(rest) {
                match value.parse::<LineId>() {
                    Ok(line) => lines.push(line),
                    Err(_) => {
                        println!("Invalid line '{}'", value);
                        return;
                    }
                }
            }
            filter.lines = lines;
        }
        Some("brand") => filter.brands = split_csv(rest),
        Some("clear") => {
            session.clear_filter();
            println!("Filter cleared.");
            return;
        }
        Some("show") | None => {
            print_filter(session);
            return;
        }
        Some(other) => {
            println!("Unknown filter '{}'.", other);
            println!("Usage: filter day|line|brand <csv> | filter clear | filter show");
            return;
        }
    }
    session.set_filter(filter);
    println!("Filter updated.");
    print_view(session);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut session = PlanningSession::default();

    println!("Line Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                println!("Error reading input: {}", e);
                break;
            }
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_view(&session),
            "load" => match parts.next() {
                Some(path) => match load_demand_from_path(path) {
                    Ok(demand) => match session.plan_demand(demand) {
                        Ok(_) => print_plan_summary(&session),
                        Err(e) => println!("Error planning demand: {}", e),
                    },
                    Err(e) => println!("Error loading demand: {}", e),
                },
                None => println!("Usage: load <xlsx|csv path>"),
            },
            "filter" => {
                let dimension = parts.next();
                let rest = parts.collect::<Vec<_>>().join(" ");
                apply_filter(&mut session, dimension, &rest);
            }
            "metrics" => match session.metrics() {
                Some(metrics) => {
                    println!("Active lines : {}", metrics.active_lines);
                    println!("Headcount    : {}", metrics.headcount);
                    println!("Total boxes  : {}", metrics.total_boxes);
                }
                None => print_no_plan(),
            },
            "daily" => match session.load_by_day() {
                Some(load) => {
                    for entry in load {
                        println!("{:<10} : {}", entry.day.as_str(), entry.quantity);
                    }
                }
                None => print_no_plan(),
            },
            "outcomes" => match session.plan() {
                Some(plan) => {
                    for outcome in plan.outcomes() {
                        let status = match outcome.status {
                            RowStatus::Completed => "completed".to_string(),
                            RowStatus::Truncated { reason } => format!("truncated ({reason:?})"),
                        };
                        println!(
                            "#{:<3} {:<24} {:<12} {:<10} {}/{} {}",
                            outcome.row_index,
                            outcome.product,
                            outcome.brand,
                            outcome.modality.as_str(),
                            outcome.scheduled,
                            outcome.requested,
                            status
                        );
                    }
                }
                None => print_no_plan(),
            },
            "export" => {
                let fmt = parts.next();
                let path = parts.next();
                let Some(workbook) = session.workbook() else {
                    print_no_plan();
                    continue;
                };
                match (fmt, path) {
                    (Some("xlsx"), Some(path)) => match save_workbook_to_xlsx(&workbook, path) {
                        Ok(_) => println!("Workbook saved to {}.", path),
                        Err(e) => println!("Error exporting plan: {}", e),
                    },
                    (Some("json"), Some(path)) => match save_workbook_to_json(&workbook, path) {
                        Ok(_) => println!("Workbook saved to {}.", path),
                        Err(e) => println!("Error exporting plan: {}", e),
                    },
                    (Some("csv"), Some(dir)) => match save_workbook_to_csv_dir(&workbook, dir) {
                        Ok((full, filtered)) => println!(
                            "Workbook saved to {} and {}.",
                            full.display(),
                            filtered.display()
                        ),
                        Err(e) => println!("Error exporting plan: {}", e),
                    },
                    _ => println!("Usage: export <xlsx|json|csv> <path>"),
                }
            }
            "config" => match parts.next() {
                Some("show") | None => print_config(session.config()),
                Some("load") => match parts.next() {
                    Some(path) => match load_config_from_json(path) {
                        Ok(config) => match session.set_config(config) {
                            Ok(_) => {
                                println!("Config loaded from {}.", path);
                                print_config(session.config());
                                if session.plan().is_some() {
                                    print_plan_summary(&session);
                                }
                            }
                            Err(e) => println!("Error applying config: {}", e),
                        },
                        Err(e) => println!("Error loading config: {}", e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match save_config_to_json(session.config(), path) {
                        Ok(_) => println!("Config saved to {}.", path),
                        Err(e) => println!("Error saving config: {}", e),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>|save <json_path>");
                }
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
