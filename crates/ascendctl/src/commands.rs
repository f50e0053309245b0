//! Command handlers for ascendctl.
//!
//! Every handler loads the learner snapshot, runs one command through the
//! reducer, and on success appends to the journal before replacing the
//! snapshot. Handlers return the text to print.

use crate::cli::{Cli, Commands, SimCommands};
use crate::display::{self, Palette};
use anyhow::{bail, Context, Result};
use ascend_common::catalog::{ContentCatalog, SimulationView, StaticCatalog};
use ascend_common::checkpoints::CheckpointBook;
use ascend_common::feed::{synthesize, FeedItem};
use ascend_common::graduation::GraduationReport;
use ascend_common::persistence::{CommandJournal, JournalEntry, SnapshotFile};
use ascend_common::{
    AscendConfig, Command, LearnerIdentity, LearnerState, LearnerStore, Level, ProgressionEvent,
    Reducer,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Loaded config, catalog and file handles for one invocation
pub struct Session {
    pub config: AscendConfig,
    pub catalog: StaticCatalog,
    pub palette: Palette,
    pub json: bool,
    snapshot: SnapshotFile,
    journal: CommandJournal,
}

impl Session {
    pub fn open(config: AscendConfig, palette: Palette, json: bool) -> Result<Self> {
        let catalog = match &config.paths.catalog_file {
            Some(path) => StaticCatalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
            None => {
                debug!("No catalog configured; using an empty one");
                StaticCatalog::default()
            }
        };

        Ok(Self {
            snapshot: SnapshotFile::new(&config.paths.state_file),
            journal: CommandJournal::new(&config.paths.journal_file),
            catalog,
            palette,
            json,
            config,
        })
    }

    /// Built-in checkpoints overlaid with the catalog's
    pub fn checkpoint_book(&self) -> CheckpointBook {
        let mut book = CheckpointBook::builtin();
        book.extend(self.catalog.checkpoints());
        book
    }

    pub fn reducer(&self) -> Reducer {
        Reducer::new()
            .with_milestones(self.config.streaks.milestones.clone())
            .with_checkpoints(self.checkpoint_book())
    }

    fn load_state(&self) -> Result<LearnerState> {
        match self
            .snapshot
            .load()
            .with_context(|| format!("Failed to read {}", self.snapshot.path().display()))?
        {
            Some(state) => Ok(state),
            None => bail!("No learner found. Run `ascendctl init --name <NAME>` first."),
        }
    }

    /// Apply a command and persist the result
    pub fn execute(&self, command: Command) -> Result<(LearnerState, Vec<ProgressionEvent>)> {
        let mut store = LearnerStore::from_snapshot(self.load_state()?, self.reducer());
        let events = store.apply(&command)?;

        self.journal
            .append(&JournalEntry::now(command))
            .with_context(|| format!("Failed to append to {}", self.journal.path().display()))?;
        self.snapshot
            .save(store.state())
            .with_context(|| format!("Failed to write {}", self.snapshot.path().display()))?;

        Ok((store.into_state(), events))
    }

    fn events_output(&self, events: &[ProgressionEvent]) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(events)?);
        }
        Ok(display::render_events(events, self.palette))
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli, config: AscendConfig, palette: Palette) -> Result<String> {
    let session = Session::open(config, palette, cli.json)?;

    match cli.command {
        Commands::Init { id, name, force } => init(&session, id, &name, force),
        Commands::Status => status(&session),
        Commands::SubmitTask { task_id } => submit_task(&session, &task_id),
        Commands::CompleteLesson { lesson_id } => complete_lesson(&session, &lesson_id),
        Commands::Sim { action } => sim(&session, action),
        Commands::Streak {
            active, same_day, ..
        } => streak(&session, active, !same_day),
        Commands::Checkpoint { checkpoint_id } => checkpoint(&session, checkpoint_id.as_deref()),
        Commands::Graduation => graduation(&session),
        Commands::Feed {
            limit,
            oldest_first,
        } => feed(&session, limit, oldest_first),
        Commands::Replay { write } => replay(&session, write),
    }
}

pub fn init(session: &Session, id: Option<String>, name: &str, force: bool) -> Result<String> {
    if session.snapshot.exists() && !force {
        bail!(
            "A learner already exists at {}. Use --force to replace it.",
            session.snapshot.path().display()
        );
    }

    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let state = LearnerState::new(LearnerIdentity::new(id.clone(), name));
    session.snapshot.save(&state)?;
    session.journal.reset()?;
    info!("Created learner {} ({})", name, id);

    Ok(format!("Created learner '{}' ({}).", name, id))
}

#[derive(Serialize)]
struct StatusReport<'a> {
    id: &'a str,
    name: &'a str,
    level: Level,
    xp: u64,
    xp_to_next: u64,
    streak: u32,
    best_streak: u32,
    completed_tasks: usize,
    completed_lessons: usize,
    completed_simulations: usize,
    active_simulation: Option<&'a str>,
}

pub fn status(session: &Session) -> Result<String> {
    let state = session.load_state()?;
    if session.json {
        let report = StatusReport {
            id: &state.identity().id,
            name: &state.identity().display_name,
            level: state.level(),
            xp: state.xp(),
            xp_to_next: ascend_common::progression::xp_to_next_level(state.xp()),
            streak: state.streak(),
            best_streak: state.best_streak(),
            completed_tasks: state.completed_tasks().len(),
            completed_lessons: state.completed_lessons().len(),
            completed_simulations: state.completed_simulations().len(),
            active_simulation: state.active_run().map(|run| run.scenario_id()),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }
    Ok(display::render_status(&state, session.palette))
}

pub fn submit_task(session: &Session, task_id: &str) -> Result<String> {
    let command = session.catalog.resolve_submit_task(task_id)?;
    let (_, events) = session.execute(command)?;
    session.events_output(&events)
}

pub fn complete_lesson(session: &Session, lesson_id: &str) -> Result<String> {
    let command = session.catalog.resolve_complete_lesson(lesson_id)?;
    let (_, events) = session.execute(command)?;
    session.events_output(&events)
}

pub fn sim(session: &Session, action: SimCommands) -> Result<String> {
    match action {
        SimCommands::Start { scenario_id } => {
            let command = session.catalog.resolve_start_simulation(&scenario_id)?;
            let (state, events) = session.execute(command)?;
            let mut out = session.events_output(&events)?;
            if !session.json {
                if let Some(view) = SimulationView::of(&session.catalog, &state)? {
                    out.push_str("\n\n");
                    out.push_str(&display::render_simulation(&view, session.palette));
                }
            }
            Ok(out)
        }
        SimCommands::Choose { option_id } => {
            let state = session.load_state()?;
            let (command, feedback) = {
                let view = SimulationView::of(&session.catalog, &state)?
                    .context("No simulation is in progress")?;
                let (command, option) = view.choose(&option_id)?;
                (command, option.feedback.clone())
            };
            let (state, events) = session.execute(command)?;
            if session.json {
                return session.events_output(&events);
            }
            let score = state.active_run().map(|run| run.score()).unwrap_or_default();
            let mut out = format!("Score is now {}.", score);
            if !feedback.is_empty() {
                out = format!("{}\n{}", feedback, out);
            }
            Ok(out)
        }
        SimCommands::Advance => {
            let (state, _) = session.execute(Command::AdvanceSimulationStep)?;
            match SimulationView::of(&session.catalog, &state)? {
                Some(view) if session.json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "scenario_id": view.scenario.id,
                    "step": view.step_index,
                    "score": view.score,
                }))?),
                Some(view) => Ok(display::render_simulation(&view, session.palette)),
                None => Ok(String::new()),
            }
        }
        SimCommands::Complete => {
            let state = session.load_state()?;
            let command = SimulationView::of(&session.catalog, &state)?
                .context("No simulation is in progress")?
                .complete();
            let (_, events) = session.execute(command)?;
            session.events_output(&events)
        }
        SimCommands::Show => {
            let state = session.load_state()?;
            match SimulationView::of(&session.catalog, &state)? {
                Some(view) => Ok(display::render_simulation(&view, session.palette)),
                None => Ok("No simulation is in progress.".to_string()),
            }
        }
    }
}

pub fn streak(session: &Session, active: bool, day_boundary_crossed: bool) -> Result<String> {
    let (state, events) = session.execute(Command::advance_streak(active, day_boundary_crossed))?;
    if session.json || !events.is_empty() {
        return session.events_output(&events);
    }
    Ok(format!("Streak: {} days.", state.streak()))
}

pub fn checkpoint(session: &Session, checkpoint_id: Option<&str>) -> Result<String> {
    let Some(checkpoint_id) = checkpoint_id else {
        return Ok(display::render_checkpoints(&session.checkpoint_book(), session.palette));
    };

    warn!("Jumping learner to checkpoint '{}'", checkpoint_id);
    let (_, events) = session.execute(Command::jump_to_checkpoint(checkpoint_id))?;
    session.events_output(&events)
}

pub fn graduation(session: &Session) -> Result<String> {
    let state = session.load_state()?;
    let report = GraduationReport::evaluate(&state, &session.catalog.criteria());
    if session.json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }
    Ok(display::render_graduation(&report, session.palette))
}

pub fn feed(session: &Session, limit: usize, oldest_first: bool) -> Result<String> {
    let state = session.load_state()?;
    let feed = synthesize(state.events());
    let items: Vec<FeedItem> = if oldest_first {
        feed.chronological().take(limit).collect()
    } else {
        feed.take(limit).collect()
    };

    if session.json {
        return Ok(serde_json::to_string_pretty(&items)?);
    }
    Ok(display::render_feed(&items, session.palette))
}

pub fn replay(session: &Session, write: bool) -> Result<String> {
    let snapshot = session.load_state()?;
    let entries = session
        .journal
        .read_all()
        .with_context(|| format!("Failed to read {}", session.journal.path().display()))?;

    let replayed =
        LearnerStore::replay_entries(snapshot.identity().clone(), session.reducer(), &entries)
            .context("Journal could not be replayed")?
            .into_state();

    let last = display::format_timestamp(entries.last().map(|e| &e.at));

    if replayed == snapshot {
        return Ok(format!(
            "Replayed {} commands (last at {}); snapshot matches.",
            entries.len(),
            last
        ));
    }

    if write {
        session.snapshot.save(&replayed)?;
        warn!("Snapshot replaced from journal");
        return Ok(format!(
            "Replayed {} commands; snapshot rewritten ({} XP, {}).",
            entries.len(),
            replayed.xp(),
            replayed.level()
        ));
    }

    bail!(
        "Snapshot differs from journal replay: snapshot has {} XP ({}), replay has {} XP ({}). Use --write to rebuild.",
        snapshot.xp(),
        snapshot.level(),
        replayed.xp(),
        replayed.level()
    )
}
