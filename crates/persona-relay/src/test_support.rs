//! Scripted generator shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProviderError;
use crate::generator::{GenerateFuture, TextGenerator};
use crate::Turn;

/// One scripted provider answer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Reply(&'static str),
    Status(u16),
}

/// Plays back a script of answers; the last step repeats forever.
pub(crate) struct ScriptedGenerator {
    script: Vec<Step>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        assert!(!script.is_empty(), "script needs at least one step");
        Self {
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Turns received by each call, in order.
    pub(crate) fn seen(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(&'a self, turns: &'a [Turn]) -> GenerateFuture<'a> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(turns.to_vec());
        let step = self.script[n.min(self.script.len() - 1)];
        Box::pin(async move {
            match step {
                Step::Reply(text) => Ok(text.to_string()),
                Step::Status(status) => Err(ProviderError::Http {
                    status,
                    body: format!("scripted {status}"),
                }),
            }
        })
    }
}
