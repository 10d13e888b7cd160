//! Templated persona reply used when the model cannot answer.
//!
//! Pure and synchronous. Built from the persona's own instruction text so the
//! reply keeps some of the persona's flavour without any network access.

use crate::persona::Persona;
use crate::prompt::first_paragraph;

/// Greeting used when the persona speaks Hinglish.
pub const HINGLISH_GREETING: &str = "Dekho, ";

/// Greeting used otherwise.
pub const DEFAULT_GREETING: &str = "Hey, ";

/// Generic actionable tip closing every mock reply.
pub const MOCK_TIP: &str =
    "Here's a quick suggestion: start with a small project, iterate, and focus on implementation.";

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Case-insensitive markers of a Hinglish speaking style.
const HINGLISH_MARKERS: &[&str] = &["hinglish"];

/// Whether the instruction text asks for a Hinglish speaking style.
pub fn speaks_hinglish(instruction: &str) -> bool {
    let lower = instruction.to_lowercase();
    HINGLISH_MARKERS.iter().any(|m| lower.contains(m))
}

/// Opening sentence of the instruction's first paragraph, minus a leading
/// "You are". Falls back to the persona's display name when nothing is left.
fn self_description(persona: &Persona) -> String {
    let paragraph = first_paragraph(&persona.system_instruction);
    let sentence = paragraph
        .split(SENTENCE_TERMINATORS)
        .next()
        .map(str::trim)
        .unwrap_or_default();
    let stripped = sentence
        .strip_prefix("You are")
        .map(str::trim_start)
        .unwrap_or(sentence);

    if stripped.is_empty() {
        persona.name.clone()
    } else {
        stripped.to_string()
    }
}

/// Build the deterministic fallback reply for `persona`.
pub fn mock_reply(persona: &Persona) -> String {
    let greeting = if speaks_hinglish(&persona.system_instruction) {
        HINGLISH_GREETING
    } else {
        DEFAULT_GREETING
    };
    format!("{greeting}{}. {MOCK_TIP}", self_description(persona))
}
