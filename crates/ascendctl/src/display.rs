//! Display helpers for ascendctl output.
//!
//! Every renderer returns a `String`; `main` decides where it goes.

use ascend_common::catalog::SimulationView;
use ascend_common::checkpoints::CheckpointBook;
use ascend_common::feed::FeedItem;
use ascend_common::graduation::GraduationReport;
use ascend_common::progression::{progress_percent, xp_to_next_level};
use ascend_common::{LearnerState, ProgressionEvent};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::fmt::Write;

const HR: &str = "────────────────────────────────────────";
const KEY_WIDTH: usize = 14;
const BAR_WIDTH: usize = 20;

/// Color on/off switch, decided once per invocation
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn header(&self, text: &str) -> String {
        if self.enabled {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn ok(&self, text: &str) -> String {
        if self.enabled {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn warn(&self, text: &str) -> String {
        if self.enabled {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.enabled {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Format a progress bar
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent.min(100) as usize * width) / 100;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Journal timestamp, or "never" for an empty journal
pub fn format_timestamp(at: Option<&DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    }
}

fn kv(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{:width$} {}", key, value, width = KEY_WIDTH);
}

fn title(out: &mut String, palette: Palette, text: &str) {
    let _ = writeln!(out, "{}", palette.header(text));
    let _ = writeln!(out, "{}", palette.dim(HR));
}

pub fn render_status(state: &LearnerState, palette: Palette) -> String {
    let mut out = String::new();
    title(&mut out, palette, &format!("ascendctl v{}", env!("CARGO_PKG_VERSION")));

    let identity = state.identity();
    kv(&mut out, "learner", &format!("{} ({})", identity.display_name, identity.id));
    kv(&mut out, "level", &palette.ok(state.level().title()));

    let xp = state.xp();
    let next = match state.level().next() {
        Some(next) => format!("{} XP to {}", xp_to_next_level(xp), next.title()),
        None => "top level".to_string(),
    };
    kv(
        &mut out,
        "xp",
        &format!(
            "{} {} {}%  ({})",
            xp,
            progress_bar(progress_percent(xp), BAR_WIDTH),
            progress_percent(xp),
            next
        ),
    );
    kv(
        &mut out,
        "streak",
        &format!("{} days (best {})", state.streak(), state.best_streak()),
    );
    kv(&mut out, "tasks", &state.completed_tasks().len().to_string());
    kv(&mut out, "lessons", &state.completed_lessons().len().to_string());
    kv(&mut out, "simulations", &state.completed_simulations().len().to_string());

    match state.active_run() {
        Some(run) => kv(
            &mut out,
            "active_sim",
            &format!(
                "{} step {}/{} score {}",
                run.scenario_id(),
                run.current_step_index() + 1,
                run.total_steps(),
                run.score()
            ),
        ),
        None => kv(&mut out, "active_sim", &palette.dim("none")),
    }

    out
}

/// One line per event produced by a command
pub fn render_events(events: &[ProgressionEvent], palette: Palette) -> String {
    if events.is_empty() {
        return palette.dim("No change.");
    }

    events
        .iter()
        .map(|event| {
            let item = ascend_common::feed::render_event(event);
            if event.kind.is_level_up() {
                format!("{} {}", palette.ok(&item.title), item.message)
            } else {
                format!("{} {}", palette.header(&item.title), item.message)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_simulation(view: &SimulationView<'_>, palette: Palette) -> String {
    let mut out = String::new();
    let heading = if view.scenario.title.is_empty() {
        view.scenario.id.clone()
    } else {
        view.scenario.title.clone()
    };
    title(&mut out, palette, &heading);
    kv(
        &mut out,
        "step",
        &format!("{}/{}", view.step_index + 1, view.scenario.steps.len()),
    );
    kv(&mut out, "score", &view.score.to_string());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", view.step.prompt);

    if view.choice_recorded {
        let hint = if view.is_final_step {
            "Choice recorded. Run `ascendctl sim complete` to finish."
        } else {
            "Choice recorded. Run `ascendctl sim advance` to continue."
        };
        let _ = writeln!(out, "{}", palette.dim(hint));
    } else {
        for option in &view.step.options {
            let _ = writeln!(out, "  {:12} {}", option.id, option.label);
        }
    }

    out.trim_end().to_string()
}

pub fn render_graduation(report: &GraduationReport, palette: Palette) -> String {
    let mut out = String::new();
    title(&mut out, palette, "Graduation checklist");

    for criterion in &report.criteria {
        let mark = if criterion.is_complete {
            palette.ok("[x]")
        } else {
            palette.warn("[ ]")
        };
        let _ = writeln!(out, "{} {}", mark, criterion.label);
    }

    let _ = writeln!(out);
    if report.eligible {
        let _ = write!(out, "{}", palette.ok("Eligible to graduate."));
    } else {
        let _ = write!(
            out,
            "{}",
            palette.warn(&format!(
                "{}/{} criteria complete.",
                report.completed,
                report.criteria.len()
            ))
        );
    }
    out
}

pub fn render_feed(items: &[FeedItem], palette: Palette) -> String {
    if items.is_empty() {
        return palette.dim("Nothing to show yet.");
    }

    items
        .iter()
        .map(|item| {
            format!(
                "{} {}\n    {}",
                palette.dim(&format!("#{:<4}", item.seq)),
                palette.header(&item.title),
                item.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_checkpoints(book: &CheckpointBook, palette: Palette) -> String {
    let mut out = String::new();
    title(&mut out, palette, "Checkpoints");
    for checkpoint in book.iter() {
        let _ = writeln!(
            out,
            "  {:14} {:>6} XP  {:12} {}",
            checkpoint.id,
            checkpoint.xp,
            checkpoint.level().title(),
            checkpoint.label
        );
    }
    out.trim_end().to_string()
}
