//! Pipeline orchestrator
//!
//! Runs the three stages in a fixed order:
//!
//! ```text
//! document ─▶ ContentLocator ─▶ Sanitizer ─▶ MarkdownTransformer ─▶ Markdown
//! ```
//!
//! A missing content region stops the run at the locate stage, and a
//! sanitization failure stops it at the sanitize stage. Later stages never
//! run after a failure and no partial output is returned.
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::default();
//! let markdown = pipeline
//!     .run("<article><h2>Title</h2><p>Hello <b>world</b></p></article>")
//!     .unwrap();
//! assert_eq!(markdown, "### Title\n\nHello **world**");
//! ```

use tracing::debug;

use crate::charset::decode_html;
use crate::config::PipelineConfig;
use crate::converter::MarkdownTransformer;
use crate::error::{ConfigError, PipelineError, Stage, StageError};
use crate::locator::ContentLocator;
use crate::sanitizer::Sanitizer;

/// Locator, sanitizer and transformer wired together.
///
/// Holds no per-run state; one value can convert any number of documents.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    locator: ContentLocator,
    sanitizer: Sanitizer,
    transformer: MarkdownTransformer,
}

impl Pipeline {
    pub fn new(
        locator: ContentLocator,
        sanitizer: Sanitizer,
        transformer: MarkdownTransformer,
    ) -> Self {
        Self {
            locator,
            sanitizer,
            transformer,
        }
    }

    /// Build all three stages from one configuration value.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            ContentLocator::new(config.locator.selector_list()?),
            Sanitizer::new(config.sanitizer.clone()),
            MarkdownTransformer::new(config.markdown.mapping()?),
        ))
    }

    pub fn locator(&self) -> &ContentLocator {
        &self.locator
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn transformer(&self) -> &MarkdownTransformer {
        &self.transformer
    }

    /// Convert an HTML document to Markdown.
    ///
    /// # Errors
    ///
    /// - `Stage::Locate` with [`StageError::NoContentFound`] when neither a
    ///   selector nor the body yields a region
    /// - `Stage::Sanitize` with [`StageError::Sanitization`] when the region
    ///   cannot be cleaned
    pub fn run(&self, document: &str) -> Result<String, PipelineError> {
        debug!(input_len = document.len(), "Locating content region");
        let region = self
            .locator
            .locate(document)
            .ok_or_else(|| PipelineError::new(Stage::Locate, StageError::NoContentFound))?;
        let region_html = region.to_html();
        debug!(
            selector = region.matched_rule().unwrap_or("body"),
            region_len = region_html.len(),
            "Located content region"
        );

        let cleaned = self
            .sanitizer
            .sanitize(&region_html)
            .map_err(|e| PipelineError::new(Stage::Sanitize, e))?;
        debug!(cleaned_len = cleaned.len(), "Sanitized content region");

        let markdown = self.transformer.transform(&cleaned);
        debug!(markdown_len = markdown.len(), "Converted to Markdown");

        Ok(markdown)
    }

    /// Decode raw bytes with the charset cascade, then [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// `Stage::Decode` when the bytes cannot be decoded, otherwise the errors
    /// of [`run`](Self::run).
    pub fn run_bytes(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, PipelineError> {
        let document =
            decode_html(bytes, content_type).map_err(|e| PipelineError::new(Stage::Decode, e))?;
        debug!(
            input_bytes = bytes.len(),
            decoded_len = document.len(),
            "Decoded input"
        );
        self.run(&document)
    }
}

/// Convert `document` with the default configuration.
pub fn run(document: &str) -> Result<String, PipelineError> {
    Pipeline::default().run(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, SanitizationError};
    use crate::policy::SanitizationPolicy;

    #[test]
    fn test_article_scenario() {
        let markdown = run("<article><h2>Title</h2><p>Hello <b>world</b></p></article>").unwrap();
        assert_eq!(markdown, "### Title\n\nHello **world**");
    }

    #[test]
    fn test_body_fallback_scenario() {
        assert_eq!(run("<body>Just text</body>").unwrap(), "Just text");
    }

    #[test]
    fn test_located_region_content_is_converted() {
        let pipeline = Pipeline::default();
        let region = pipeline
            .locator()
            .locate("<nav>skip</nav><article><p>kept</p></article>")
            .expect("region");
        assert_eq!(region.to_html(), "<article><p>kept</p></article>");

        let markdown = pipeline
            .run(r#"<table><tr><td id="main">cell text</td></tr></table>"#)
            .unwrap();
        assert_eq!(markdown, "cell text");
    }

    #[test]
    fn test_empty_document_fails_at_locate() {
        let err = run("").unwrap_err();
        assert_eq!(err.stage, Stage::Locate);
        assert_eq!(err.cause, StageError::NoContentFound);
    }

    #[test]
    fn test_sanitize_failure_is_attributed() {
        let sanitizer = Sanitizer::new(SanitizationPolicy {
            max_depth: 3,
            ..Default::default()
        });
        let pipeline = Pipeline::new(ContentLocator::default(), sanitizer, MarkdownTransformer::default());

        let err = pipeline
            .run("<main><div><div><div><p>deep</p></div></div></div></main>")
            .unwrap_err();
        assert_eq!(err.stage, Stage::Sanitize);
        assert!(matches!(
            err.cause,
            StageError::Sanitization(SanitizationError::TooDeep { max: 3, .. })
        ));
    }

    #[test]
    fn test_run_bytes_decodes_first() {
        let pipeline = Pipeline::default();
        let markdown = pipeline
            .run_bytes(b"<main><p>Caf\xE9</p></main>", Some("text/html; charset=iso-8859-1"))
            .unwrap();
        assert_eq!(markdown, "Café");
    }

    #[test]
    fn test_run_bytes_decode_failure() {
        let err = Pipeline::default().run_bytes(b"<p>\xFF</p>", None).unwrap_err();
        assert_eq!(err.stage, Stage::Decode);
        assert!(matches!(err.cause, StageError::Decode(DecodeError::InvalidBytes { .. })));
        assert_eq!(err.code(), 2);
    }

    #[test]
    fn test_from_config_rejects_bad_selector() {
        let mut config = PipelineConfig::default();
        config.locator.selectors = vec!["main > p".to_string()];
        assert!(matches!(
            Pipeline::from_config(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
