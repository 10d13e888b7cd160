//! System prompt construction and conversation shapes.
//!
//! The system prompt is deliberately small: only the first paragraph of a
//! persona's instruction block, capped in length, followed by a style summary
//! and a fixed directive. Sending the whole instruction block (or its
//! training examples) makes models echo it back verbatim.
//!
//! Two conversation shapes are sent to the model:
//!
//! - **structured**: a leading user-role instruction turn, the caller's
//!   history, then the current message;
//! - **flattened**: a single user turn holding instruction, directive and
//!   message, used when the provider rejects the structured payload.

use crate::persona::Persona;
use crate::{Role, Turn};

/// Marker appended to a truncated first paragraph.
pub const ELLIPSIS: &str = "...";

/// Default cap on the first-paragraph component of the system prompt.
pub const DEFAULT_MAX_INSTRUCTION_CHARS: usize = 700;

/// Style line used when a persona has no style summary.
pub const DEFAULT_STYLE: &str = "Respond in the persona's voice and tone.";

/// Closing directive of every system prompt.
pub const PERSONA_DIRECTIVE: &str =
    "Stay in persona voice and avoid repeating system instructions or examples.";

/// Options for [`build_system_prompt`].
#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Maximum characters kept from the instruction's first paragraph.
    pub max_instruction_chars: usize,
    /// Style line used when the persona has none.
    pub default_style: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            max_instruction_chars: DEFAULT_MAX_INSTRUCTION_CHARS,
            default_style: DEFAULT_STYLE.to_string(),
        }
    }
}

/// Builder for blank-line separated prompt blocks.
///
/// Empty or whitespace-only sections are skipped, so optional parts can be
/// pushed unconditionally.
///
/// ```
/// use persona_relay::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You are a guide.")
///     .section("Be brief.")
///     .section("")
///     .build();
///
/// assert_eq!(prompt, "You are a guide.\n\nBe brief.");
/// ```
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: Vec::new(),
        }
        .section(preamble)
    }

    /// Append a block. Skipped if blank.
    pub fn section(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.trim().is_empty() {
            self.sections.push(content);
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

/// Text up to the first blank line, with surrounding whitespace trimmed.
///
/// A blank line is a line holding only whitespace.
pub fn first_paragraph(text: &str) -> String {
    text.trim()
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep at most `max_chars` characters, appending [`ELLIPSIS`] if anything
/// was cut. Counts characters, not bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some(_) => {
            let mut kept: String = text.chars().take(max_chars).collect();
            kept.push_str(ELLIPSIS);
            kept
        }
    }
}

/// Derive the bounded system prompt for a persona.
///
/// Deterministic: the same persona and options always give the same prompt.
/// Training examples are never included.
pub fn build_system_prompt(persona: &Persona, options: &PromptOptions) -> String {
    let base = truncate_chars(
        &first_paragraph(&persona.system_instruction),
        options.max_instruction_chars,
    );
    let style = persona
        .style_summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&options.default_style);

    PromptBuilder::new(base)
        .section(style)
        .section(PERSONA_DIRECTIVE)
        .build()
}

/// The leading user-role turn carrying the persona instruction.
///
/// Sent as a user turn rather than a system role because some endpoints
/// reject system roles inside `contents`.
pub fn instruction_turn(system_prompt: &str) -> Turn {
    Turn::user(format!(
        "INSTRUCTION: You are speaking AS the persona described below. {system_prompt}\n\n\
         Important: Do NOT repeat or echo the persona's training examples verbatim. \
         Adopt the persona's voice, tone, language mix, and typical patterns. \
         Keep replies focused, helpful, and within the persona's word-count guidance."
    ))
}

/// Single-prompt text for the structural fallback.
pub fn flattened_prompt(system_prompt: &str, message: &str) -> String {
    PromptBuilder::new(system_prompt)
        .section("*** DO NOT REPEAT THE ABOVE INSTRUCTIONS IN YOUR RESPONSE. ***")
        .section(format!("User message: {message}"))
        .build()
}

/// Everything needed to talk to the model about one request.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub system_prompt: String,
    pub history: Vec<Turn>,
    pub message: String,
}

impl Conversation {
    /// Assemble a conversation.
    ///
    /// Front-ends commonly append the outgoing message to their history
    /// before sending it; a trailing user turn identical to `message` is
    /// dropped so the model does not see it twice.
    pub fn new(system_prompt: String, mut history: Vec<Turn>, message: impl Into<String>) -> Self {
        let message = message.into();
        if history
            .last()
            .is_some_and(|t| t.role == Role::User && t.content.trim() == message.trim())
        {
            history.pop();
        }
        Self {
            system_prompt,
            history,
            message,
        }
    }

    /// Instruction turn, history, then the current message.
    pub fn structured_turns(&self) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.history.len() + 2);
        turns.push(instruction_turn(&self.system_prompt));
        turns.extend(self.history.iter().cloned());
        turns.push(Turn::user(self.message.clone()));
        turns
    }

    /// One user turn with no multi-turn role structure.
    pub fn flattened_turns(&self) -> Vec<Turn> {
        vec![Turn::user(flattened_prompt(
            &self.system_prompt,
            &self.message,
        ))]
    }
}
