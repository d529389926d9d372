use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, NaiveDate};
use sprint_insight::aggregation::{
    self, compute_milestones, compute_project_timelines, compute_sprint_project_progress,
};
use sprint_insight::dashboard::parse_date_arg;
use sprint_insight::{
    Dashboard, Delimiter, JsonFilePreferenceStore, PreferenceStore, load_preferences, logging,
    save_preferences,
};

const PREFS_ENV: &str = "SPRINT_INSIGHT_PREFS";
const DEFAULT_PREFS_FILE: &str = "sprint-insight.prefs.json";

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (i, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[i] - cell.chars().count()));
        line.push_str(" |");
    }
    line
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn sp(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn print_help() {
    println!("Commands:");
    println!("  load <path>                     Load a .csv/.tsv/.txt export");
    println!("  sprint [name|all]               Show sprints or filter by sprint");
    println!("  assignee [name|all]             Show assignees or filter by assignee");
    println!("  reset                           Clear both filters");
    println!("  show                            Summary of the current view");
    println!("  stats                           Capacity per assignee");
    println!("  risks                           Risk register");
    println!("  milestones                      Project milestones per sprint");
    println!("  projects                        Project delivery timelines");
    println!("  progress [sprint]               Project progress for a sprint");
    println!("  timeline                        Elapsed days of the selected sprint");
    println!("  suggest                         Rebalancing suggestions");
    println!("  whatif <multiplier>             Completion with scaled capacity");
    println!("  cap <assignee> <sp>             Set an assignee's sprint capacity");
    println!("  days <sprint> <n>               Set a sprint's length (0 clears)");
    println!("  program <YYYY-MM-DD|clear>      Set the program end date");
    println!("  target <project> <YYYY-MM-DD|clear>  Set a project's target end");
    println!("  export <path>                   Write the filtered rows");
    println!("  help                            Show this help");
    println!("  quit | exit                     Leave");
}

fn persist(store: &dyn PreferenceStore, dashboard: &Dashboard) {
    if let Err(e) = save_preferences(store, dashboard.preferences()) {
        println!("Could not save preferences: {}", e);
    }
}

/// Splits `name... value` where the name may contain spaces.
fn split_last<'a>(parts: &[&'a str]) -> Option<(String, &'a str)> {
    let (value, name) = parts.split_last()?;
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), *value))
}

fn parse_optional_date(input: &str) -> Result<Option<NaiveDate>, String> {
    if input.eq_ignore_ascii_case("clear") {
        return Ok(None);
    }
    parse_date_arg(input).map(Some).map_err(|e| e.to_string())
}

fn show(dashboard: &Dashboard, today: NaiveDate) {
    let views = dashboard.views(today);
    let filters = dashboard.filters();
    println!(
        "Rows: {} (filtered {})  sprint={}  assignee={}",
        dashboard.export().rows.len(),
        views.filtered_rows,
        filters.sprint,
        filters.assignee
    );
    let s = &views.summary;
    println!(
        "Total SP: {}  Completed: {} ({}%)  Awaiting testing: {}  Available: {}",
        sp(s.total_sp),
        sp(s.completed_sp),
        s.completion_rate,
        sp(s.awaiting_testing_sp),
        sp(s.available_sp)
    );
    println!(
        "High risks: {}  Over-allocated assignees: {}",
        s.high_risks, s.overloaded_count
    );
}

fn main() {
    logging::init();

    let prefs_path = std::env::var(PREFS_ENV).unwrap_or_else(|_| DEFAULT_PREFS_FILE.to_string());
    let store = JsonFilePreferenceStore::new(&prefs_path);
    let mut dashboard = Dashboard::new(load_preferences(&store));
    let today = Local::now().date_naive();

    println!("Sprint Insight (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0];
        let args = &parts[1..];
        let rest = args.join(" ");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => {
                if rest.is_empty() {
                    println!("Usage: load <path>");
                    continue;
                }
                match dashboard.load_file(&rest) {
                    Ok(0) => println!("No rows parsed from {rest}."),
                    Ok(n) => println!("Loaded {n} rows from {rest}."),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "sprint" => {
                if rest.is_empty() {
                    let sprints = aggregation::sprint_names(&dashboard.export().rows);
                    println!("Sprints: {}", sprints.join(", "));
                } else {
                    dashboard.set_sprint_filter(rest.as_str());
                    println!("Sprint filter: {rest}");
                }
            }
            "assignee" => {
                if rest.is_empty() {
                    let assignees = aggregation::assignee_names(&dashboard.export().rows);
                    println!("Assignees: {}", assignees.join(", "));
                } else {
                    dashboard.set_assignee_filter(rest.as_str());
                    println!("Assignee filter: {rest}");
                }
            }
            "reset" => {
                dashboard.reset_filters();
                println!("Filters reset.");
            }
            "show" => show(&dashboard, today),
            "stats" => {
                let stats = dashboard.stats(today);
                if stats.is_empty() {
                    println!("No data.");
                    continue;
                }
                let rows: Vec<Vec<String>> = stats
                    .iter()
                    .map(|(name, s)| {
                        vec![
                            name.clone(),
                            sp(s.sprint_capacity),
                            sp(s.capacity_used),
                            sp(s.capacity_remaining),
                            format!("{:.0}%", s.utilization_percent()),
                            s.allocation_status.as_str().to_string(),
                            sp(s.total_story_points),
                            sp(s.completed_story_points),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(
                        &["assignee", "capacity", "used", "remaining", "util", "status", "total", "done"],
                        &rows
                    )
                );
            }
            "risks" => {
                let risks = dashboard.views(today).risks;
                if risks.is_empty() {
                    println!("No risks.");
                    continue;
                }
                let rows: Vec<Vec<String>> = risks
                    .iter()
                    .map(|r| {
                        vec![
                            r.risk_level.as_str().to_string(),
                            r.issue_key.clone(),
                            r.assignee.clone(),
                            r.project.clone(),
                            r.reason.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["level", "issue", "assignee", "project", "reason"], &rows)
                );
            }
            "milestones" => {
                let export = dashboard.export();
                let milestones = compute_milestones(&export.rows, &export.sprint_dates, today);
                if milestones.is_empty() {
                    println!("No milestones.");
                    continue;
                }
                let rows: Vec<Vec<String>> = milestones
                    .iter()
                    .map(|m| {
                        vec![
                            m.project.clone(),
                            m.sprint.clone(),
                            m.target_end.clone().unwrap_or_default(),
                            format!("{}%", m.percent_complete),
                            m.days_remaining.map(|d| d.to_string()).unwrap_or_default(),
                            m.status.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["project", "sprint", "target", "done", "days left", "status"], &rows)
                );
            }
            "projects" => {
                let export = dashboard.export();
                let timelines = compute_project_timelines(
                    &export.rows,
                    &export.sprint_dates,
                    dashboard.preferences(),
                    today,
                );
                if timelines.is_empty() {
                    println!("No dated projects.");
                    continue;
                }
                let rows: Vec<Vec<String>> = timelines
                    .iter()
                    .map(|t| {
                        let mut status = t.status.as_str().to_string();
                        if t.past_program_end == Some(true) {
                            status.push_str(" (past program end)");
                        }
                        vec![
                            t.project.clone(),
                            t.start_date.to_string(),
                            t.target_end_date.to_string(),
                            format!("{}%", t.percent_complete),
                            t.days_to_target.to_string(),
                            status,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["project", "start", "target", "done", "days", "status"], &rows)
                );
            }
            "progress" => {
                let sprint = if rest.is_empty() {
                    dashboard.filters().sprint.clone()
                } else {
                    rest.clone()
                };
                let groups = compute_sprint_project_progress(&dashboard.export().rows, &sprint);
                if groups.is_empty() {
                    println!("No parent issues for sprint {sprint}.");
                    continue;
                }
                let rows: Vec<Vec<String>> = groups
                    .iter()
                    .map(|g| {
                        vec![
                            g.project.clone(),
                            format!("{}/{}", g.done_items, g.total_items),
                            sp(g.completed_sp),
                            sp(g.total_sp),
                            format!("{:.0}%", g.percent()),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["project", "items", "done SP", "total SP", "percent"], &rows)
                );
            }
            "timeline" => match dashboard.views(today).sprint_timeline {
                Some(t) => println!(
                    "{} - {}: day {} of {} ({}% elapsed, {} remaining){}",
                    t.start_date,
                    t.end_date,
                    t.elapsed_days,
                    t.total_days,
                    t.percent_time_elapsed,
                    t.days_remaining,
                    if t.is_configured { " [configured]" } else { "" }
                ),
                None => println!("Select a sprint with dates in its name first."),
            },
            "suggest" => {
                let plan = dashboard.rebalance(today);
                if plan.suggestions.is_empty() {
                    println!("No suggestions.");
                } else {
                    for s in &plan.suggestions {
                        println!("Move {} ({} SP) from {} to {}: {}", s.id, sp(s.sp), s.from, s.to, s.summary);
                    }
                }
                for r in &plan.rejections {
                    println!("Kept {} ({} SP) with {}: {}", r.id, sp(r.sp), r.from, r.reason);
                }
            }
            "whatif" => match args.first().map(|m| m.parse::<f64>()) {
                Some(Ok(multiplier)) if multiplier.is_finite() && multiplier >= 0.0 => {
                    let p = dashboard.what_if(today, multiplier);
                    println!(
                        "Capacity {} -> {}; projected completion {:.1}% of {} SP ({} done)",
                        sp(p.current_capacity),
                        sp(p.projected_capacity),
                        p.projected_completion,
                        sp(p.total_sp),
                        sp(p.completed_sp)
                    );
                }
                Some(_) => println!("Invalid multiplier"),
                None => println!("Usage: whatif <multiplier>"),
            },
            "cap" => match split_last(args) {
                Some((assignee, value)) => match value.parse::<f64>() {
                    Ok(points) if points.is_finite() && points >= 0.0 => {
                        dashboard.set_capacity(assignee.as_str(), points);
                        persist(&store, &dashboard);
                        println!("Capacity for {assignee}: {}", sp(points));
                    }
                    _ => println!("Invalid story points"),
                },
                None => println!("Usage: cap <assignee> <sp>"),
            },
            "days" => match split_last(args) {
                Some((sprint, value)) => match value.parse::<u32>() {
                    Ok(days) => {
                        dashboard.set_sprint_days(sprint.as_str(), days);
                        persist(&store, &dashboard);
                        if days == 0 {
                            println!("Cleared day count for {sprint}.");
                        } else {
                            println!("Sprint {sprint}: {days} days");
                        }
                    }
                    Err(_) => println!("Invalid day count"),
                },
                None => println!("Usage: days <sprint> <n>"),
            },
            "program" => match args.first() {
                Some(value) => match parse_optional_date(value) {
                    Ok(date) => {
                        dashboard.set_program_end_date(date);
                        persist(&store, &dashboard);
                        match date {
                            Some(date) => println!("Program end date: {date}"),
                            None => println!("Program end date cleared."),
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => match dashboard.preferences().program_end_date {
                    Some(date) => println!("Program end date: {date}"),
                    None => println!("Usage: program <YYYY-MM-DD|clear>"),
                },
            },
            "target" => match split_last(args) {
                Some((project, value)) => match parse_optional_date(value) {
                    Ok(date) => {
                        dashboard.set_project_target(project.as_str(), date);
                        persist(&store, &dashboard);
                        match date {
                            Some(date) => println!("Target for {project}: {date}"),
                            None => println!("Target for {project} cleared."),
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: target <project> <YYYY-MM-DD|clear>"),
            },
            "export" => {
                if rest.is_empty() {
                    println!("Usage: export <path>");
                    continue;
                }
                let delimiter = Path::new(&rest)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(|ext| ext.parse::<Delimiter>().ok())
                    .or(dashboard.export().delimiter)
                    .unwrap_or(Delimiter::Comma);
                match dashboard.export_rows(&rest, delimiter) {
                    Ok(n) => println!("Wrote {n} rows to {rest}."),
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ => println!("Unknown command: {cmd} (type 'help')"),
        }
    }
}
