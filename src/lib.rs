//! Content Markdown Converter
//!
//! Turns a full HTML page into Markdown containing only its main content.
//!
//! # Architecture
//!
//! The crate is a linear pipeline of three stages:
//! - `locator`: finds the main content region with ordered selector rules
//! - `sanitizer`: strips scripts, styles, links and other noise from it
//! - `converter`: renders the cleaned fragment as Markdown
//!
//! Supporting modules:
//! - `pipeline`: runs the stages and attributes failures to a stage
//! - `parser`: HTML5 parsing using html5ever
//! - `charset`: character encoding detection for byte input
//! - `policy`: the sanitizer's noise categories
//! - `mapping`: the transformer's tag table
//! - `config`: TOML configuration for all stages
//! - `dom`: helpers over the parsed tree
//!
//! # Examples
//!
//! ```rust
//! use content_markdown_converter::Pipeline;
//!
//! let html = r#"<html><body>
//!     <nav>Home | About</nav>
//!     <main><h1>Release notes</h1><p>Now <em>faster</em>.</p></main>
//! </body></html>"#;
//!
//! let markdown = Pipeline::default().run(html).unwrap();
//! assert_eq!(markdown, "## Release notes\n\nNow *faster*.");
//! ```

pub mod charset;
pub mod config;
pub mod converter;
pub mod dom;
pub mod error;
pub mod locator;
pub mod mapping;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod sanitizer;

pub use config::PipelineConfig;
pub use converter::MarkdownTransformer;
pub use error::{ConfigError, PipelineError, SanitizationError, Stage, StageError};
pub use locator::{ContentLocator, ContentRegion, SelectorList, SelectorRule};
pub use mapping::{MarkdownMapping, TagRule};
pub use parser::parse_html;
pub use pipeline::Pipeline;
pub use policy::SanitizationPolicy;
pub use sanitizer::Sanitizer;
