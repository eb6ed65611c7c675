//! Phase layout parsing, validation and pipeline construction.

use std::{collections::HashSet, path::Path, str::FromStr};

use phaseline_core::{Phase, Pipeline};
use serde::Deserialize;

use crate::{Error, PhaseSet, Result, error::LayoutSource, span::find_value_spans};

/// Filename reported for layouts that were not parsed from text.
const UNNAMED_SOURCE: &str = "<layout>";

/// Root of a layout document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    /// Phase declarations, in default order.
    #[serde(default, rename = "phase")]
    pub phases: Vec<PhaseDecl>,
}

/// A single `[[phase]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseDecl {
    /// Unique phase name.
    pub name: String,
    /// Place this phase immediately before the named phase.
    #[serde(default)]
    pub before: Option<String>,
    /// Place this phase after the named phase and its earlier `after` siblings.
    #[serde(default)]
    pub after: Option<String>,
}

impl PhaseDecl {
    /// The key and name of the phase this declaration is placed relative to.
    fn anchor(&self) -> Option<(&'static str, &str)> {
        match (&self.before, &self.after) {
            (Some(before), _) => Some(("before", before)),
            (None, Some(after)) => Some(("after", after)),
            (None, None) => None,
        }
    }
}

impl FromStr for Layout {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_layout(s, "phases.toml")
    }
}

impl Layout {
    /// Parse a layout file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        parse_layout(&content, &path.display().to_string())
    }

    /// Parse a layout from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_layout(content, filename)
    }

    /// Build a pipeline with the declared phases.
    ///
    /// Plain declarations are appended; relative ones are inserted before or
    /// after their anchor, so several phases placed after the same anchor
    /// run in declaration order.
    ///
    /// # Errors
    ///
    /// The layout is checked again before building, so a hand-built layout
    /// fails with the same errors as a parsed one ([`Error::DuplicatePhase`],
    /// [`Error::ConflictingRelation`], [`Error::UnknownAnchor`]), without
    /// source labels.
    pub fn build<S, C>(&self) -> Result<(Pipeline<S, C>, PhaseSet)> {
        self.validate(&LayoutSource::new("", UNNAMED_SOURCE))?;

        let mut pipeline = Pipeline::default();
        let mut phases = PhaseSet::default();

        for decl in &self.phases {
            let phase = Phase::new(decl.name.as_str());
            match (&decl.before, &decl.after) {
                (Some(anchor), _) => pipeline
                    .insert_phase_before(lookup(&phases, anchor)?, phase.clone())
                    .map_err(|e| Box::new(Error::from(e)))?,
                (None, Some(anchor)) => pipeline
                    .insert_phase_after(lookup(&phases, anchor)?, phase.clone())
                    .map_err(|e| Box::new(Error::from(e)))?,
                (None, None) => pipeline.add_phase(phase.clone()),
            }
            phases.insert(phase);
        }

        tracing::debug!(phases = phases.len(), "built pipeline from layout");
        Ok((pipeline, phases))
    }

    /// Validate the layout against its source.
    fn validate(&self, source: &LayoutSource) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for decl in &self.phases {
            let name = decl.name.as_str();

            if seen.contains(name) {
                let spans = find_value_spans(source.text(), "name", name);
                return Err(source.duplicate_phase(
                    name,
                    spans.first().copied(),
                    spans.get(1).copied(),
                ));
            }

            if decl.before.is_some() && decl.after.is_some() {
                let spans = find_value_spans(source.text(), "name", name);
                let span = spans.first().copied();
                return Err(source.conflicting_relation(name, span));
            }

            if let Some((key, anchor)) = decl.anchor()
                && !seen.contains(anchor)
            {
                let spans = find_value_spans(source.text(), key, anchor);
                let span = spans.first().copied();
                return Err(source.unknown_anchor(name, anchor, span));
            }

            seen.insert(name);
        }

        Ok(())
    }
}

fn lookup<'a>(phases: &'a PhaseSet, anchor: &str) -> Result<&'a Phase> {
    phases.require(anchor).map_err(|e| Box::new(Error::from(e)))
}

/// Parse a layout from content with the given filename for error reporting.
pub fn parse_layout(content: &str, filename: &str) -> Result<Layout> {
    let source = LayoutSource::new(content, filename);
    let layout: Layout = toml::from_str(content).map_err(|e| source.parse_error(e))?;
    layout.validate(&source)?;
    Ok(layout)
}
