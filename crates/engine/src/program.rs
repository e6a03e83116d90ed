use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::run::RunStatus;
use crate::world::{Instruction, Level};

/// One instruction block as placed by the author. The id is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Instruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramParseError {
    #[error("unknown instruction '{token}' at block {position}")]
    UnknownToken { position: usize, token: String },
}

/// Ordered, fixed-length instruction script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    blocks: Vec<Block>,
    next_block_id: u64,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instructions(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        let mut program = Self::new();
        for instruction in instructions {
            program.push(instruction);
        }
        program
    }

    /// Parses tokens separated by commas or whitespace. `#` starts a line comment.
    ///
    /// Accepts the block tokens (`MOVE`, `JUMP`, `TURN_LEFT`, `TURN_RIGHT`) in
    /// any case, plus the short forms `M`, `J`, `L`, `R`, `LEFT`, `RIGHT`.
    pub fn parse(text: &str) -> Result<Self, ProgramParseError> {
        let mut program = Self::new();
        for line in text.lines() {
            let code = line.split('#').next().unwrap_or_default();
            for token in code
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|token| !token.is_empty())
            {
                let instruction =
                    parse_token(token).ok_or_else(|| ProgramParseError::UnknownToken {
                        position: program.len() + 1,
                        token: token.to_string(),
                    })?;
                program.push(instruction);
            }
        }
        Ok(program)
    }

    pub fn push(&mut self, instruction: Instruction) -> &Block {
        self.next_block_id = self.next_block_id.saturating_add(1);
        self.blocks.push(Block {
            id: format!("b{}", self.next_block_id),
            kind: instruction,
        });
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn remove(&mut self, index: usize) -> Option<Block> {
        if index < self.blocks.len() {
            Some(self.blocks.remove(index))
        } else {
            None
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        self.blocks.iter().map(|block| block.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn parse_token(token: &str) -> Option<Instruction> {
    let normalized = token.trim().to_ascii_uppercase().replace('-', "_");
    match normalized.as_str() {
        "MOVE" | "M" | "FORWARD" => Some(Instruction::Move),
        "JUMP" | "J" => Some(Instruction::Jump),
        "TURN_LEFT" | "LEFT" | "L" => Some(Instruction::TurnLeft),
        "TURN_RIGHT" | "RIGHT" | "R" => Some(Instruction::TurnRight),
        _ => None,
    }
}

/// Plain-text export of a program written for `level`.
pub fn render_solution_report(level: &Level, program: &Program, status: RunStatus) -> String {
    let status_label = if status == RunStatus::Won {
        "SUCCESS"
    } else {
        "IN PROGRESS"
    };
    let mut output = format!(
        "Level Solved: {}\nStatus: {status_label}\nBlocks: {} (par {})\n\nYour Code:",
        level.name(),
        program.len(),
        level.par()
    );
    for (index, block) in program.blocks().iter().enumerate() {
        output.push('\n');
        output.push_str(&format!(
            "{}. {}",
            index + 1,
            block.kind.token().replace('_', " ")
        ));
    }
    output.push('\n');
    output
}
