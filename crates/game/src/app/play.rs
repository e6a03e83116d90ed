use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine::{
    render_solution_report, report_progress, resolve_app_paths, Campaign, JsonProgressStore,
    Level, LevelResult, Program, RunDriver, RunEvent, RunOutcome, RunSession,
};
use tracing::{info, warn};

use super::bootstrap::LoopConfig;
use super::cli::{LevelSource, PlayOptions, ProgramSource};
use super::level_file::{load_level_definitions, ReplyFileGenerator};
use super::loop_runner::{run_program, FramePacer};
use super::render::{describe_event, render_board};

pub(crate) type PlayResult<T> = Result<T, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaySummary {
    pub(crate) outcome: RunOutcome,
    pub(crate) progress_saved: bool,
}

pub(crate) fn play(
    options: &PlayOptions,
    config: &LoopConfig,
    pacer: &mut dyn FramePacer,
    out: &mut dyn Write,
) -> PlayResult<PlaySummary> {
    let progress_path = progress_file_path(options.progress_file.as_deref())?;
    let mut store = open_progress_store(&progress_path);
    let mut campaign = Campaign::builtin().map_err(|error| error.to_string())?;
    if let Some(store) = &store {
        campaign.restore_earned(store.earned().iter().cloned());
    }

    let level = select_level(&mut campaign, &options.level, out)?;
    let program = load_program(&options.program)?;

    write_header(out, &level, &program).map_err(write_error)?;

    let goal_count = level.goal_count();
    let mut driver = RunDriver::new(RunSession::new(level.clone(), config.timing));
    let mut output_error = None;
    let outcome = run_program(
        &mut driver,
        &program.instructions(),
        config,
        pacer,
        &mut |event| {
            if output_error.is_some() {
                return;
            }
            if let Err(error) = write_event(out, &level, event, goal_count, options.show_board) {
                output_error = Some(error);
            }
        },
    );
    if let Some(error) = output_error {
        return Err(write_error(error));
    }

    let mut progress_saved = false;
    if outcome.is_won() {
        campaign.record_outcome(level.id(), &outcome);
        if let Some(store) = store.as_mut() {
            progress_saved = report_progress(store, &LevelResult::new(&level, &program));
        }

        let report = render_solution_report(&level, &program, outcome.status);
        if let Some(path) = &options.save_solution {
            // The win stands even when the export cannot be written.
            match fs::write(path, &report) {
                Ok(()) => info!(path = %path.display(), "solution_saved"),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "solution_save_failed");
                    writeln!(out, "Could not save solution to {}: {error}", path.display())
                        .map_err(write_error)?;
                }
            }
        }
        write_win_footer(out, &campaign, &level, &report).map_err(write_error)?;
    }

    Ok(PlaySummary {
        outcome,
        progress_saved,
    })
}

pub(crate) fn list_levels(progress_file: Option<&Path>, out: &mut dyn Write) -> PlayResult<()> {
    let progress_path = progress_file_path(progress_file)?;
    let mut campaign = Campaign::builtin().map_err(|error| error.to_string())?;
    if let Some(store) = open_progress_store(&progress_path) {
        campaign.restore_earned(store.earned().iter().cloned());
    }

    for (index, level) in campaign.levels().iter().enumerate() {
        let state = if campaign.is_earned(level.id()) {
            "done"
        } else if campaign.is_unlocked(index) {
            "open"
        } else {
            "locked"
        };
        writeln!(
            out,
            "{:>2}. [{state:<6}] {} (par {})",
            index + 1,
            level.name(),
            level.par()
        )
        .map_err(write_error)?;
    }
    Ok(())
}

fn progress_file_path(explicit: Option<&Path>) -> PlayResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => resolve_app_paths()
            .map(|paths| paths.progress_file)
            .map_err(|error| error.to_string()),
    }
}

fn open_progress_store(path: &Path) -> Option<JsonProgressStore> {
    match JsonProgressStore::open(path) {
        Ok(store) => Some(store),
        Err(error) => {
            warn!(error = %error, "progress_load_failed");
            None
        }
    }
}

fn select_level(
    campaign: &mut Campaign,
    source: &LevelSource,
    out: &mut dyn Write,
) -> PlayResult<Level> {
    match source {
        LevelSource::Campaign(number) => campaign
            .select(number - 1)
            .cloned()
            .map_err(|error| error.to_string()),
        LevelSource::File { path, index } => {
            let definitions = load_level_definitions(path)?;
            let count = definitions.len();
            let definition = definitions
                .into_iter()
                .nth(index - 1)
                .ok_or_else(|| {
                    format!(
                        "level file {} has {count} level(s), no level {index}",
                        path.display()
                    )
                })?;
            let added = campaign
                .add_level(definition)
                .map_err(|error| format!("level file {}: {error}", path.display()))?;
            campaign
                .level(added)
                .cloned()
                .map_err(|error| error.to_string())
        }
        LevelSource::GeneratedReply { path, prompt } => {
            let mut generator = ReplyFileGenerator::new(path);
            let generated = campaign
                .generate_level(&mut generator, prompt)
                .map(Clone::clone);
            match generated {
                Ok(level) => Ok(level),
                Err(error) => {
                    let current = campaign.current_level().clone();
                    writeln!(
                        out,
                        "Level generation failed ({error}); playing {} instead.",
                        current.name()
                    )
                    .map_err(write_error)?;
                    Ok(current)
                }
            }
        }
    }
}

fn load_program(source: &ProgramSource) -> PlayResult<Program> {
    let text = match source {
        ProgramSource::Inline(text) => text.clone(),
        ProgramSource::File(path) => fs::read_to_string(path)
            .map_err(|error| format!("read program {}: {error}", path.display()))?,
    };
    Program::parse(&text).map_err(|error| error.to_string())
}

fn write_header(out: &mut dyn Write, level: &Level, program: &Program) -> io::Result<()> {
    writeln!(
        out,
        "{} ({} blocks, par {})",
        level.name(),
        program.len(),
        level.par()
    )?;
    if !level.description().is_empty() {
        writeln!(out, "{}", level.description())?;
    }
    Ok(())
}

fn write_event(
    out: &mut dyn Write,
    level: &Level,
    event: &RunEvent,
    goal_count: usize,
    show_board: bool,
) -> io::Result<()> {
    let Some(line) = describe_event(event, goal_count) else {
        return Ok(());
    };
    writeln!(out, "{line}")?;
    if show_board && matches!(event, RunEvent::Started(_) | RunEvent::Committed { .. }) {
        write!(out, "{}", render_board(level, event.snapshot()))?;
    }
    out.flush()
}

fn write_win_footer(
    out: &mut dyn Write,
    campaign: &Campaign,
    level: &Level,
    report: &str,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{report}")?;
    if campaign.is_complete() {
        writeln!(out, "All modules complete!")?;
    } else if let Some(index) = campaign.index_of(level.id()) {
        let next = index + 1;
        if let Ok(next_level) = campaign.level(next) {
            if campaign.is_unlocked(next) {
                writeln!(out, "Unlocked: {} (--level {})", next_level.name(), next + 1)?;
            }
        }
    }
    Ok(())
}

fn write_error(error: io::Error) -> String {
    format!("write output: {error}")
}
