//! Tunables shared by the parsers.

/// Parser configuration. `Default` gives the standard limits.
///
/// ```
/// use readalong::ParseOptions;
///
/// let options = ParseOptions::default()
///     .with_max_section_chars(1200)
///     .with_preview_chars(80);
/// assert_eq!(options.max_chapter_chars, 3600);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// Target length of chunked sections (plain text, word documents).
    pub max_section_chars: usize,
    /// How far around the target a word-safe boundary is searched for.
    pub boundary_window: usize,
    /// Target length of parts when a book chapter is split.
    pub max_chapter_chars: usize,
    /// Chapters longer than `max_chapter_chars * chapter_split_factor` are split.
    pub chapter_split_factor: f64,
    /// Length cap of section previews.
    pub preview_chars: usize,
    /// Label prefix of plain-text sections ("Page 1", "Page 2", ...).
    pub plain_label_prefix: String,
    /// Label prefix of word-processor sections.
    pub word_label_prefix: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_section_chars: 1800,
            boundary_window: 200,
            max_chapter_chars: 3600,
            chapter_split_factor: 1.2,
            preview_chars: 160,
            plain_label_prefix: "Page".to_string(),
            word_label_prefix: "Section".to_string(),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_section_chars(mut self, chars: usize) -> Self {
        self.max_section_chars = chars.max(1);
        self
    }

    pub fn with_boundary_window(mut self, chars: usize) -> Self {
        self.boundary_window = chars;
        self
    }

    pub fn with_max_chapter_chars(mut self, chars: usize) -> Self {
        self.max_chapter_chars = chars.max(1);
        self
    }

    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    /// Length above which a chapter gets split into parts.
    pub fn chapter_split_threshold(&self) -> usize {
        (self.max_chapter_chars as f64 * self.chapter_split_factor) as usize
    }
}
