//! Request option enums and the validated [`AskOptions`] bundle.

use std::path::{Path, PathBuf};

use crate::config::{validate_locale, MAX_ATTACHMENTS, MAX_ATTACHMENT_SIZE};
use crate::error::{Error, Result};

/// Backend model selection.
///
/// Identifiers map to the opaque `model_preference` strings the web
/// frontend sends; they do not resemble the marketing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    /// Let the service pick the best model for each query.
    #[default]
    Best,
    /// Perplexity's fast in-house model.
    Sonar,
    /// Anthropic's advanced model.
    Claude40Sonnet,
    /// OpenAI's advanced model.
    Gpt41,
    /// Google's latest model.
    Gemini25Pro,
    /// Perplexity's unbiased reasoning model.
    R11776,
    /// xAI's reasoning model.
    Grok4,
    /// OpenAI's reasoning model.
    O3,
    /// Anthropic's reasoning model.
    Claude40SonnetThinking,
    /// Deep research: in-depth reports with more sources and reasoning.
    Research,
}

impl Model {
    /// Wire identifier for the `model_preference` field.
    pub fn identifier(&self) -> &'static str {
        match self {
            Model::Best => "pplx_pro",
            Model::Sonar => "experimental",
            Model::Claude40Sonnet => "claude2",
            Model::Gpt41 => "gpt41",
            Model::Gemini25Pro => "gemini2flash",
            Model::R11776 => "r1",
            Model::Grok4 => "grok4",
            Model::O3 => "o3",
            Model::Claude40SonnetThinking => "claude37sonnetthinking",
            Model::Research => "pplx_alpha",
        }
    }

    /// Wire value for the `mode` field. Currently `copilot` for every
    /// model the WebUI exposes.
    pub fn mode(&self) -> &'static str {
        "copilot"
    }
}

/// How citation markers in the answer text are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CitationMode {
    /// Leave the upstream `[n]` markers in place.
    Default,
    /// Rewrite each resolvable marker to `[n](url)`.
    Markdown,
    /// Strip resolvable markers from the text; the citation list is
    /// still available as structured metadata.
    #[default]
    Clean,
}

/// Search focus: whether the answer is grounded in a web search at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFocus {
    /// Search the web.
    #[default]
    Web,
    /// Writing mode: no search is performed.
    Writing,
}

impl SearchFocus {
    pub fn wire_value(&self) -> &'static str {
        match self {
            SearchFocus::Web => "internet",
            SearchFocus::Writing => "writing",
        }
    }
}

/// Which source corpus the search draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFocus {
    /// The entire internet.
    #[default]
    Web,
    /// Academic papers.
    Academic,
    /// Discussions and opinions.
    Social,
    /// SEC filings.
    Finance,
}

impl SourceFocus {
    pub fn wire_value(&self) -> &'static str {
        match self {
            SourceFocus::Web => "web",
            SourceFocus::Academic => "scholar",
            SourceFocus::Social => "social",
            SourceFocus::Finance => "edgar",
        }
    }
}

/// Recency filter for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Sources from all time (no filter on the wire).
    #[default]
    All,
    Today,
    LastWeek,
    LastMonth,
    LastYear,
}

impl TimeRange {
    /// Wire value for `search_recency_filter`; `None` means no filter.
    pub fn wire_value(&self) -> Option<&'static str> {
        match self {
            TimeRange::All => None,
            TimeRange::Today => Some("DAY"),
            TimeRange::LastWeek => Some("WEEK"),
            TimeRange::LastMonth => Some("MONTH"),
            TimeRange::LastYear => Some("YEAR"),
        }
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the WGS 84 ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::Config(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::Config(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Immutable, construction-validated configuration for an ask.
///
/// Built through [`AskOptions::builder`]; a successfully built value is
/// guaranteed to pass every local check, so no validation happens at
/// request time beyond re-checking merged per-call overrides.
#[derive(Debug, Clone)]
pub struct AskOptions {
    pub model: Model,
    pub citation_mode: CitationMode,
    pub search_focus: SearchFocus,
    /// Non-empty set of source corpora.
    pub sources: Vec<SourceFocus>,
    pub time_range: TimeRange,
    /// Locale like `en-US`.
    pub language: String,
    /// IANA timezone name like `America/New_York`.
    pub timezone: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// When false (the default) the query is sent incognito.
    pub save_to_library: bool,
    /// Local files to upload before the ask (max 30, each max 50 MB).
    pub attachments: Vec<PathBuf>,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            model: Model::Best,
            citation_mode: CitationMode::Clean,
            search_focus: SearchFocus::Web,
            sources: vec![SourceFocus::Web],
            time_range: TimeRange::All,
            language: "en-US".to_string(),
            timezone: None,
            coordinates: None,
            save_to_library: false,
            attachments: Vec::new(),
        }
    }
}

impl AskOptions {
    /// Create a builder seeded with the defaults.
    pub fn builder() -> AskOptionsBuilder {
        AskOptionsBuilder::new()
    }

    /// Run every local check: locale shape, source set, attachment
    /// limits, and model/focus compatibility. Called by the builder and
    /// again by the client after merging per-call overrides.
    pub fn validate(&self) -> Result<()> {
        validate_locale(&self.language)?;

        if self.sources.is_empty() {
            return Err(Error::Config("source focus set must not be empty".into()));
        }

        self.validate_compatibility()?;
        validate_attachments(&self.attachments)
    }

    /// Known-incompatible model/focus combinations, rejected locally so
    /// the caller gets a clear error instead of an opaque upstream one.
    fn validate_compatibility(&self) -> Result<()> {
        if self.model == Model::Research && self.search_focus == SearchFocus::Writing {
            return Err(Error::Config(
                "the Research model requires web search focus".into(),
            ));
        }

        if self.search_focus == SearchFocus::Writing {
            // Writing mode performs no search, so search-shaping options
            // are meaningless and the upstream rejects them.
            if self.sources.iter().any(|s| *s != SourceFocus::Web) {
                return Err(Error::Config(
                    "source focus other than web cannot be combined with writing focus".into(),
                ));
            }
            if self.time_range != TimeRange::All {
                return Err(Error::Config(
                    "a time range cannot be combined with writing focus".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Check the documented attachment limits against the filesystem.
pub(crate) fn validate_attachments(attachments: &[PathBuf]) -> Result<()> {
    if attachments.len() > MAX_ATTACHMENTS {
        return Err(Error::Config(format!(
            "too many attachments: {} (maximum {MAX_ATTACHMENTS})",
            attachments.len()
        )));
    }

    for path in attachments {
        let meta = std::fs::metadata(path).map_err(|e| {
            Error::Config(format!("attachment {} is not readable: {e}", path.display()))
        })?;
        if meta.len() > MAX_ATTACHMENT_SIZE {
            return Err(Error::Config(format!(
                "attachment {} is {} bytes (maximum {MAX_ATTACHMENT_SIZE})",
                path.display(),
                meta.len()
            )));
        }
    }

    Ok(())
}

/// Builder for [`AskOptions`].
#[derive(Debug, Clone, Default)]
pub struct AskOptionsBuilder {
    options: AskOptions,
}

impl AskOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: AskOptions::default(),
        }
    }

    pub fn model(mut self, model: Model) -> Self {
        self.options.model = model;
        self
    }

    pub fn citation_mode(mut self, mode: CitationMode) -> Self {
        self.options.citation_mode = mode;
        self
    }

    pub fn search_focus(mut self, focus: SearchFocus) -> Self {
        self.options.search_focus = focus;
        self
    }

    /// Replace the source focus set.
    pub fn sources(mut self, sources: Vec<SourceFocus>) -> Self {
        self.options.sources = sources;
        self
    }

    /// Add one source focus to the set.
    pub fn source(mut self, source: SourceFocus) -> Self {
        if !self.options.sources.contains(&source) {
            self.options.sources.push(source);
        }
        self
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.options.time_range = range;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.options.language = language.into();
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.options.timezone = Some(timezone.into());
        self
    }

    pub fn coordinates(mut self, coordinates: Coordinates) -> Self {
        self.options.coordinates = Some(coordinates);
        self
    }

    pub fn save_to_library(mut self, save: bool) -> Self {
        self.options.save_to_library = save;
        self
    }

    /// Attach a local file (uploaded before the ask request).
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.options.attachments.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the attachment list.
    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.options.attachments = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<AskOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
