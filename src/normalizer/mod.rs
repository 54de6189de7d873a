// src/normalizer/mod.rs
//! Free-form command normalization.
//!
//! Splits raw input into shell words and repairs the two most common
//! mistakes against a [`Vocabulary`]: a misspelled or missing program name,
//! and a misspelled sub-command. Every repair is recorded in the note so the
//! operator can see exactly what will run.

pub mod similarity;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{CLOSE_MATCH_CUTOFF, SIMILARITY_THRESHOLD};
use crate::types::ParseError;
use crate::vocabulary::Vocabulary;

pub const NOTE_UNPARSEABLE: &str = "could not parse; running verbatim.";
pub const NOTE_EMPTY: &str = "empty command; nothing to run.";
pub const NOTE_PREFIX_INSERTED: &str = "inserted missing top-level command prefix.";
pub const NOTE_COMMENT_ONLY: &str = "comment only; running verbatim.";

/// Normalized command plus the audit trail of what was changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub corrected_command: String,
    /// Empty when nothing was corrected
    pub note: String,
}

impl CorrectionResult {
    fn unchanged(raw: &str, note: &str) -> Self {
        Self {
            corrected_command: raw.to_string(),
            note: note.to_string(),
        }
    }

    pub fn was_corrected(&self) -> bool {
        !self.note.is_empty()
    }
}

/// Split raw input into shell words, honouring quotes and escapes
pub fn tokenize(raw: &str) -> Result<Vec<String>, ParseError> {
    shell_words::split(raw).map_err(|e| ParseError {
        input: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Normalize `raw` against `vocabulary`. Pure and deterministic.
pub fn normalize(raw: &str, vocabulary: &Vocabulary) -> CorrectionResult {
    let mut tokens = match tokenize(raw) {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!("{}", e);
            return CorrectionResult::unchanged(raw, NOTE_UNPARSEABLE);
        }
    };

    // A trailing `# ...` is dropped by the splitter; the remote shell
    // ignores it too. A line that is nothing but a comment still runs.
    if tokens.is_empty() {
        let note = if raw.trim().is_empty() {
            NOTE_EMPTY
        } else {
            NOTE_COMMENT_ONLY
        };
        return CorrectionResult::unchanged(raw, note);
    }

    let program = vocabulary.top_level();
    let mut notes: Vec<String> = Vec::new();

    if !vocabulary.is_top_level_command(&tokens[0]) {
        if similarity::ratio(&tokens[0], program) > SIMILARITY_THRESHOLD {
            notes.push(format!("auto-corrected '{}' -> '{}'.", tokens[0], program));
            tokens[0] = program.to_string();
        } else if vocabulary.is_sub_command(&tokens[0]) {
            notes.push(NOTE_PREFIX_INSERTED.to_string());
            tokens.insert(0, program.to_string());
        }
    }

    if tokens.len() >= 2
        && vocabulary.is_top_level_command(&tokens[0])
        && !vocabulary.is_sub_command(&tokens[1])
    {
        let sub = &tokens[1];
        if let Some((candidate, _)) =
            similarity::closest_match(sub, vocabulary.sub_commands(), CLOSE_MATCH_CUTOFF)
        {
            if similarity::ratio(sub, candidate) > SIMILARITY_THRESHOLD {
                notes.push(format!(
                    "auto-corrected sub-command '{}' -> '{}'.",
                    sub, candidate
                ));
                tokens[1] = candidate.to_string();
            }
        }
    }

    let result = CorrectionResult {
        corrected_command: tokens.join(" "),
        note: notes.join("  ").trim_end().to_string(),
    };

    if result.was_corrected() {
        debug!(raw, corrected = %result.corrected_command, "Normalized command: {}", result.note);
    }

    result
}
