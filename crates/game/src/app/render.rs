use engine::{CellType, GridPos, Level, RunEvent, RunOutcome, RunStatus, Snapshot};

const VOID_GLYPH: char = ' ';
const PATH_GLYPH: char = '.';
const START_GLYPH: char = 'S';
const GOAL_GLYPH: char = '*';
const COLLECTED_GLYPH: char = 'o';
const WALL_GLYPH: char = '#';

/// Draws the level with the bot as an arrow. Collected goals turn into `o`.
pub(crate) fn render_board(level: &Level, snapshot: &Snapshot) -> String {
    let grid = level.grid();
    let mut output = String::new();
    for z in 0..grid.depth() as i32 {
        let row = (0..grid.width() as i32)
            .map(|x| {
                let pos = GridPos::new(x, z);
                if pos == snapshot.position {
                    return snapshot.direction.arrow();
                }
                match grid.get(pos) {
                    Some(CellType::Path) => PATH_GLYPH,
                    Some(CellType::Start) => START_GLYPH,
                    Some(CellType::Goal) if snapshot.collected.contains(&pos) => COLLECTED_GLYPH,
                    Some(CellType::Goal) => GOAL_GLYPH,
                    Some(CellType::Wall) => WALL_GLYPH,
                    Some(CellType::Void) | None => VOID_GLYPH,
                }
            })
            .collect::<String>();
        output.push_str(row.trim_end());
        output.push('\n');
    }
    output
}

/// One status line per event; `None` for events with nothing new to say.
pub(crate) fn describe_event(event: &RunEvent, goal_count: usize) -> Option<String> {
    match event {
        RunEvent::Started(snapshot) => Some(format!(
            "run {} started at {} facing {}",
            snapshot.run_id.0, snapshot.position, snapshot.direction
        )),
        RunEvent::Committed {
            index,
            instruction,
            snapshot,
        } => {
            let mut line = format!(
                "{:>2}. {:<10} -> {} facing {}",
                index + 1,
                instruction.token(),
                snapshot.position,
                snapshot.direction
            );
            if snapshot.is_jumping {
                line.push_str(" (airborne)");
            }
            Some(line)
        }
        RunEvent::Settled {
            collected: Some(pos),
            snapshot,
            ..
        } => Some(format!(
            "    goal collected at {pos} ({}/{goal_count})",
            snapshot.collected.len()
        )),
        RunEvent::Settled {
            collected: None, ..
        }
        | RunEvent::Completed(_) => None,
        RunEvent::Finished { outcome, .. } => Some(describe_outcome(outcome)),
    }
}

pub(crate) fn describe_outcome(outcome: &RunOutcome) -> String {
    let label = match outcome.status {
        RunStatus::Won => "WON",
        RunStatus::Lost => "LOST",
        RunStatus::Running => "RUNNING",
        RunStatus::Idle => "IDLE",
    };
    format!("{label}: {}", outcome.message())
}
