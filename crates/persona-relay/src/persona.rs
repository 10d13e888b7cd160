//! Persona records and the immutable persona registry.
//!
//! A persona is loaded once at startup and never mutated. The registry keeps
//! insertion order so `/api/personas` lists personas in a stable order.
//!
//! Definitions are JSON documents:
//!
//! ```json
//! {
//!   "id": "hitesh",
//!   "name": "Hitesh Choudhary",
//!   "system_instruction": "You are Hitesh Choudhary, ...",
//!   "style_summary": "Warm Hinglish, chai references, ...",
//!   "training_examples": [
//!     { "user_input": "How do I start?", "expected_response": "Haanji! ..." }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersonaError;

const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("hitesh.json", include_str!("../personas/hitesh.json")),
    ("piyush.json", include_str!("../personas/piyush.json")),
];

/// A named behavioural profile the relay impersonates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Persona {
    pub id: String,
    /// Display name shown by persona pickers.
    pub name: String,
    /// Free-text instruction block. Only its first paragraph reaches the model.
    pub system_instruction: String,
    #[serde(default)]
    pub style_summary: Option<String>,
    #[serde(default)]
    pub training_examples: Vec<TrainingExample>,
}

/// A (user input, expected response) pair illustrating the persona's voice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingExample {
    pub user_input: String,
    pub expected_response: String,
}

/// The `{id, name}` pair served by the persona listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
}

/// Ordered, read-only set of personas keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
    index: HashMap<String, usize>,
}

impl PersonaRegistry {
    /// Build a registry from already-parsed personas.
    ///
    /// Fails on duplicate ids and on personas without an id or name.
    pub fn new(personas: Vec<Persona>) -> Result<Self, PersonaError> {
        let mut index = HashMap::with_capacity(personas.len());
        for (i, persona) in personas.iter().enumerate() {
            if persona.id.trim().is_empty() {
                return Err(PersonaError::Invalid("persona id must not be empty".into()));
            }
            if persona.name.trim().is_empty() {
                return Err(PersonaError::Invalid(format!(
                    "persona '{}' has no display name",
                    persona.id
                )));
            }
            if index.insert(persona.id.clone(), i).is_some() {
                return Err(PersonaError::Duplicate(persona.id.clone()));
            }
        }
        Ok(Self { personas, index })
    }

    /// The personas shipped with the crate (`hitesh`, `piyush`).
    pub fn builtin() -> Result<Self, PersonaError> {
        Self::from_definitions(BUILTIN_DEFINITIONS.iter().copied())
    }

    /// Parse `(origin, json)` pairs in order. `origin` only appears in errors.
    pub fn from_definitions<'a>(
        definitions: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, PersonaError> {
        let personas = definitions
            .into_iter()
            .map(|(origin, json)| {
                serde_json::from_str::<Persona>(json).map_err(|source| PersonaError::Parse {
                    origin: origin.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(personas)
    }

    /// Load every `*.json` file in `dir`, ordered by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PersonaError> {
        let dir = dir.as_ref();
        let io_err = |source| PersonaError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let json = std::fs::read_to_string(&path).map_err(|source| PersonaError::Io {
                path: path.clone(),
                source,
            })?;
            sources.push((path.display().to_string(), json));
        }
        debug!("Loaded {} persona file(s) from {}", sources.len(), dir.display());

        Self::from_definitions(sources.iter().map(|(o, j)| (o.as_str(), j.as_str())))
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.index.get(id).map(|&i| &self.personas[i])
    }

    /// `{id, name}` pairs in registration order.
    pub fn list(&self) -> Vec<PersonaSummary> {
        self.personas
            .iter()
            .map(|p| PersonaSummary {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
