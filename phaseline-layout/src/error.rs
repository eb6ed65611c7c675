use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use phaseline_core::PipelineError;
use thiserror::Error;

/// Result type for layout operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The layout text an error points into.
///
/// Every layout error embeds the full source for miette to render its
/// labels; the constructors below fill that in.
#[derive(Debug, Clone)]
pub(crate) struct LayoutSource {
    text: String,
    name: String,
}

impl LayoutSource {
    pub(crate) fn new(text: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: name.into(),
        }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    fn labeled(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.text.clone())
    }

    /// Wrap a TOML syntax or shape error, labeling its span when known.
    pub(crate) fn parse_error(&self, source: toml::de::Error) -> Box<Error> {
        let span = source.span().map(SourceSpan::from);
        Box::new(Error::Parse {
            src: self.labeled(),
            span,
            source,
        })
    }

    /// Create a duplicate phase error.
    pub(crate) fn duplicate_phase(
        &self,
        name: impl Into<String>,
        first_span: Option<SourceSpan>,
        second_span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::DuplicatePhase {
            src: self.labeled(),
            first_span,
            second_span,
            name: name.into(),
        })
    }

    /// Create an error for a phase declaring both `before` and `after`.
    pub(crate) fn conflicting_relation(
        &self,
        name: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::ConflictingRelation {
            src: self.labeled(),
            span,
            name: name.into(),
        })
    }

    /// Create an error for an anchor that is not declared earlier.
    pub(crate) fn unknown_anchor(
        &self,
        name: impl Into<String>,
        anchor: impl Into<String>,
        span: Option<SourceSpan>,
    ) -> Box<Error> {
        Box::new(Error::UnknownAnchor {
            src: self.labeled(),
            span,
            name: name.into(),
            anchor: anchor.into(),
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse phase layout")]
    #[diagnostic(code(phaseline::layout::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("duplicate phase '{name}'")]
    #[diagnostic(
        code(phaseline::layout::duplicate_phase),
        help("phase names must be unique within a layout")
    )]
    DuplicatePhase {
        #[source_code]
        src: NamedSource<String>,
        #[label("first declared here")]
        first_span: Option<SourceSpan>,
        #[label("declared again here")]
        second_span: Option<SourceSpan>,
        name: String,
    },

    #[error("phase '{name}' declares both `before` and `after`")]
    #[diagnostic(
        code(phaseline::layout::conflicting_relation),
        help("a phase can only be placed relative to one anchor")
    )]
    ConflictingRelation {
        #[source_code]
        src: NamedSource<String>,
        #[label("placed twice")]
        span: Option<SourceSpan>,
        name: String,
    },

    #[error("phase '{name}' is placed relative to unknown phase '{anchor}'")]
    #[diagnostic(
        code(phaseline::layout::unknown_anchor),
        help("declare '{anchor}' before '{name}' in the layout")
    )]
    UnknownAnchor {
        #[source_code]
        src: NamedSource<String>,
        #[label("not declared above")]
        span: Option<SourceSpan>,
        name: String,
        anchor: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),
}
