use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Levels {
        progress_file: Option<PathBuf>,
    },
    Play(PlayOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LevelSource {
    /// 1-based position in the campaign.
    Campaign(usize),
    File { path: PathBuf, index: usize },
    GeneratedReply { path: PathBuf, prompt: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProgramSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayOptions {
    pub(crate) level: LevelSource,
    pub(crate) program: ProgramSource,
    pub(crate) step_ms: Option<u64>,
    pub(crate) instant: bool,
    pub(crate) show_board: bool,
    pub(crate) save_solution: Option<PathBuf>,
    pub(crate) progress_file: Option<PathBuf>,
}

pub(crate) fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(command) = args.first() else {
        return Err("missing subcommand".to_string());
    };
    let command_args = &args[1..];

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "levels" => parse_levels_args(command_args),
        "play" => parse_play_args(command_args).map(Command::Play),
        other => Err(format!("unknown subcommand '{other}'")),
    }
}

fn parse_levels_args(args: &[String]) -> Result<Command, String> {
    let mut progress_file = None;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--progress-file" => {
                progress_file = Some(PathBuf::from(flag_value(args, index)?));
                index += 2;
            }
            other => return Err(format!("unknown levels argument '{other}'")),
        }
    }
    Ok(Command::Levels { progress_file })
}

fn parse_play_args(args: &[String]) -> Result<PlayOptions, String> {
    let mut level_number = None;
    let mut level_file = None;
    let mut level_index = 1usize;
    let mut generated_reply = None;
    let mut prompt = None;
    let mut program = None;
    let mut step_ms = None;
    let mut instant = false;
    let mut show_board = true;
    let mut save_solution = None;
    let mut progress_file = None;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--level" => {
                let value = flag_value(args, index)?;
                let number = value
                    .parse::<usize>()
                    .ok()
                    .filter(|number| *number > 0)
                    .ok_or_else(|| {
                        format!("invalid --level value '{value}' (expected a level number from 1)")
                    })?;
                level_number = Some(number);
                index += 2;
            }
            "--level-file" => {
                level_file = Some(PathBuf::from(flag_value(args, index)?));
                index += 2;
            }
            "--level-index" => {
                let value = flag_value(args, index)?;
                level_index = value
                    .parse::<usize>()
                    .ok()
                    .filter(|number| *number > 0)
                    .ok_or_else(|| {
                        format!("invalid --level-index value '{value}' (expected 1 or more)")
                    })?;
                index += 2;
            }
            "--generated-reply" => {
                generated_reply = Some(PathBuf::from(flag_value(args, index)?));
                index += 2;
            }
            "--prompt" => {
                prompt = Some(flag_value(args, index)?.to_string());
                index += 2;
            }
            "--program" => {
                set_program(
                    &mut program,
                    ProgramSource::Inline(flag_value(args, index)?.to_string()),
                )?;
                index += 2;
            }
            "--program-file" => {
                set_program(
                    &mut program,
                    ProgramSource::File(PathBuf::from(flag_value(args, index)?)),
                )?;
                index += 2;
            }
            "--step-ms" => {
                let value = flag_value(args, index)?;
                step_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --step-ms value '{value}' (expected u64)"))?,
                );
                index += 2;
            }
            "--instant" => {
                instant = true;
                index += 1;
            }
            "--no-board" => {
                show_board = false;
                index += 1;
            }
            "--save-solution" => {
                save_solution = Some(PathBuf::from(flag_value(args, index)?));
                index += 2;
            }
            "--progress-file" => {
                progress_file = Some(PathBuf::from(flag_value(args, index)?));
                index += 2;
            }
            other => return Err(format!("unknown play argument '{other}'")),
        }
    }

    let level = match (level_number, level_file, generated_reply) {
        (Some(number), None, None) => LevelSource::Campaign(number),
        (None, Some(path), None) => LevelSource::File {
            path,
            index: level_index,
        },
        (None, None, Some(path)) => LevelSource::GeneratedReply {
            path,
            prompt: prompt.unwrap_or_default(),
        },
        (None, None, None) => LevelSource::Campaign(1),
        _ => {
            return Err(
                "--level, --level-file and --generated-reply are mutually exclusive".to_string(),
            )
        }
    };
    let program = program.ok_or_else(|| "play requires --program or --program-file".to_string())?;

    Ok(PlayOptions {
        level,
        program,
        step_ms,
        instant,
        show_board,
        save_solution,
        progress_file,
    })
}

fn set_program(slot: &mut Option<ProgramSource>, source: ProgramSource) -> Result<(), String> {
    if slot.is_some() {
        return Err("--program and --program-file may only be given once".to_string());
    }
    *slot = Some(source);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], index: usize) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {}", args[index]))
}

pub(crate) fn usage_text() -> String {
    [
        "Usage:",
        "  cubebot levels [--progress-file <path>]",
        "  cubebot play (--program \"<blocks>\" | --program-file <path>) [options]",
        "",
        "Level (default --level 1):",
        "  --level <n>                campaign level, must be unlocked",
        "  --level-file <path>        level JSON, or {\"levels\": [...]}",
        "  --level-index <n>          which level of a --level-file pack (default 1)",
        "  --generated-reply <path>   generator reply JSON; invalid replies keep level 1",
        "  --prompt <text>            description passed to the generator",
        "",
        "Options:",
        "  --step-ms <ms>             step duration (default 800, env CUBEBOT_STEP_MS)",
        "  --instant                  no waits between steps",
        "  --no-board                 print event lines only",
        "  --save-solution <path>     write a solution report after a win",
        "  --progress-file <path>     progress JSON (default $CUBEBOT_HOME/progress.json)",
        "",
        "Blocks: MOVE JUMP TURN_LEFT TURN_RIGHT (or M J L R), separated by spaces or commas.",
    ]
    .join("\n")
}
