//! Program tags: the categorical label, value and color every shop can be
//! assigned, plus the lookups the map and list views use to resolve them.
//!
//! A bare `-` counts as an unknown program even though its normalized key
//! is empty; older map pages left such shops unlabeled instead.

use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;
use crate::shop::Shop;

pub const DEFAULT_PROGRAM_COLOR: &str = "#64748b";
/// Map color of shops that are unused or have no program.
pub const UNUSED_COLOR: &str = "#fbbf24";
pub const ATLAS_COLOR: &str = "#10b981";
/// Map color of shops whose program is not in the registry.
pub const UNREGISTERED_COLOR: &str = "#ef4444";
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Program values staff use to mean "we don't know".
const UNKNOWN_KEYS: [&str; 6] = ["bilinmiyor", "bilinmeyen", "unknown", "-", "null", "none"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub label: String,
    pub value: String,
    pub color: String,
}

/// Lowercases with Turkish casing rules (`I` -> `ı`, `İ` -> `i`) and trims.
pub fn tr_lower(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(|c| match c {
            'I' => vec!['ı'],
            'İ' => vec!['i'],
            c => c.to_lowercase().collect(),
        })
        .collect()
}

/// Comparison key for program values and labels: Turkish-lowercased with
/// whitespace, dashes and underscores removed.
pub fn normalize_key(s: &str) -> String {
    tr_lower(s)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect()
}

/// True for an empty program or one of the "unknown" placeholder values.
pub fn is_unknown_program(program: &str) -> bool {
    let program = program.trim();
    if program.is_empty() {
        return true;
    }
    // Match on the lowered value, so a bare "-" survives
    let key = tr_lower(program);
    UNKNOWN_KEYS.contains(&key.as_str()) || UNKNOWN_KEYS.contains(&normalize_key(program).as_str())
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        default
    } else {
        value
    }
}


// --------------------------------------------------------------------------
// ProgramRegistry

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramRegistry {
    programs: Vec<Program>,
}

impl ProgramRegistry {
    /// Builds a registry from stored programs, dropping entries without a
    /// value and filling in missing labels and colors.
    pub fn new(programs: Vec<Program>) -> Self {
        let programs = programs
            .into_iter()
            .filter(|p| !p.value.trim().is_empty())
            .map(|p| Program {
                label: or_default(&p.label, &p.value).to_string(),
                color: or_default(&p.color, DEFAULT_PROGRAM_COLOR).to_string(),
                value: p.value,
            })
            .collect();
        Self { programs }
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn get(&self, value: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.value == value)
    }

    /// Adds a program in front of the existing ones.
    pub fn add(&mut self, label: &str, value: &str, color: &str) -> Result<&Program, InvalidInputError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(InvalidInputError::EmptyProgramValue);
        }
        if self.get(value).is_some() {
            return Err(InvalidInputError::DuplicateProgram(value.to_string()));
        }
        self.programs.insert(
            0,
            Program {
                label: or_default(label, value).to_string(),
                value: value.to_string(),
                color: or_default(color, DEFAULT_PROGRAM_COLOR).to_string(),
            },
        );
        Ok(&self.programs[0])
    }

    /// Relabels or recolors a program. The value is the key and never changes.
    pub fn edit(&mut self, value: &str, label: &str, color: &str) -> Result<&Program, InvalidInputError> {
        let idx = self
            .programs
            .iter()
            .position(|p| p.value == value.trim())
            .ok_or_else(|| InvalidInputError::UnknownProgram(value.to_string()))?;
        let p = &mut self.programs[idx];
        p.label = or_default(label, &p.value).to_string();
        p.color = or_default(color, DEFAULT_PROGRAM_COLOR).to_string();
        Ok(&self.programs[idx])
    }

    /// Removes a program unless a shop still uses it.
    pub fn remove(&mut self, value: &str, shops: &[Shop]) -> Result<Program, InvalidInputError> {
        let value = value.trim();
        let idx = self
            .programs
            .iter()
            .position(|p| p.value == value)
            .ok_or_else(|| InvalidInputError::UnknownProgram(value.to_string()))?;
        if shops.iter().any(|s| s.program == value) {
            return Err(InvalidInputError::ProgramInUse(value.to_string()));
        }
        Ok(self.programs.remove(idx))
    }

    /// Finds a program by normalized value first, then by normalized label.
    pub fn resolve(&self, program: &str) -> Option<&Program> {
        let key = normalize_key(program);
        if key.is_empty() {
            return None;
        }
        self.programs
            .iter()
            .find(|p| normalize_key(&p.value) == key)
            .or_else(|| self.programs.iter().find(|p| normalize_key(&p.label) == key))
    }

    /// Human-readable program name for a shop.
    pub fn label_of<'a>(&'a self, shop: &'a Shop) -> &'a str {
        if is_unknown_program(&shop.program) {
            return UNKNOWN_LABEL;
        }
        match self.resolve(&shop.program) {
            Some(p) => &p.label,
            None => shop.program.trim(),
        }
    }

    /// Fill color of a shop on the map.
    pub fn color_of<'a>(&'a self, shop: &Shop) -> &'a str {
        let program = shop.program.trim();
        if shop.inactive || program.is_empty() {
            return UNUSED_COLOR;
        }
        if program.to_lowercase() == "atlas" {
            return ATLAS_COLOR;
        }
        match self.resolve(program) {
            Some(p) => &p.color,
            None => UNREGISTERED_COLOR,
        }
    }
}
