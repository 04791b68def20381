//! End-to-end pipeline tests
//!
//! Full pages go in, Markdown comes out. These tests pin the behaviour that
//! only shows up when the three stages run together: which region wins,
//! what noise disappears before conversion, and which stage a failure is
//! attributed to.

use content_markdown_converter::error::{DecodeError, StageError};
use content_markdown_converter::policy::SanitizationPolicy;
use content_markdown_converter::{
    ContentLocator, MarkdownTransformer, Pipeline, PipelineConfig, SanitizationError, Sanitizer,
    SelectorList, Stage, pipeline,
};
use pretty_assertions::assert_eq;

const BLOG_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>My blog</title>
    <link rel="stylesheet" href="/site.css">
    <script src="/analytics.js"></script>
</head>
<body>
    <header><nav><a href="/">Home</a> | <a href="/about">About</a></nav></header>
    <div class="content">Sidebar teaser</div>
    <main>
        <h1>Release notes</h1>
        <p>Version 2 is <em>much</em> faster.</p>
        <script>trackPageView();</script>
        <ul>
            <li>New parser</li>
            <li>Smaller output</li>
        </ul>
        <p>Read the <a href="/docs" target="_blank">docs</a>.</p>
    </main>
    <footer>Copyright</footer>
</body>
</html>"#;

/// Only the main region is converted; navigation, sidebar and footer are not
#[test]
fn test_blog_page_keeps_main_content_only() {
    let markdown = Pipeline::default().run(BLOG_PAGE).unwrap();

    assert_eq!(
        markdown,
        "## Release notes\n\n\
         Version 2 is *much* faster.\n\n\
         * New parser\n\
         * Smaller output\n\n\
         Read the [docs](/docs)."
    );
}

#[test]
fn test_article_with_heading_and_bold() {
    let markdown =
        pipeline::run("<article><h2>Title</h2><p>Hello <b>world</b></p></article>").unwrap();
    assert_eq!(markdown, "### Title\n\nHello **world**");
}

#[test]
fn test_body_fallback_without_matching_selector() {
    assert_eq!(pipeline::run("<body>Just text</body>").unwrap(), "Just text");
    assert_eq!(
        pipeline::run("<div><p>First</p><p>Second</p></div>").unwrap(),
        "First\n\nSecond"
    );
}

#[test]
fn test_main_outranks_earlier_content_class() {
    let html = r#"<div class="content"><p>Teaser</p></div><main><p>Story</p></main>"#;
    assert_eq!(pipeline::run(html).unwrap(), "Story");
}

/// The located region's own content reaches the output, wherever it sits
#[test]
fn test_region_inside_table_cell() {
    let html = r#"<table><tr><td>menu</td><td id="main">cell text</td></tr></table>"#;
    assert_eq!(pipeline::run(html).unwrap(), "cell text");

    let html = r#"<table><tr><td id="main"><p>cell <b>text</b></p></td></tr></table>"#;
    assert_eq!(pipeline::run(html).unwrap(), "cell **text**");
}

#[test]
fn test_script_and_style_removed_but_sibling_text_kept() {
    let html = "<article><p>Keep</p><script>x()</script><style>p{}</style>tail</article>";
    assert_eq!(pipeline::run(html).unwrap(), "Keep\n\ntail");
}

/// Empty or content-free documents fail in the locate stage
#[test]
fn test_empty_document_fails_at_locate() {
    for html in ["", "   ", "<html><body></body></html>", "<body> \n </body>"] {
        let err = pipeline::run(html).unwrap_err();
        assert_eq!(err.stage, Stage::Locate, "input {html:?}");
        assert_eq!(err.cause, StageError::NoContentFound);
        assert_eq!(err.code(), 3);
    }
}

#[test]
fn test_region_cleaned_to_nothing_is_empty_markdown() {
    assert_eq!(pipeline::run("<main><script>x()</script></main>").unwrap(), "");
}

#[test]
fn test_sanitize_failure_stops_before_transform() {
    let sanitizer = Sanitizer::new(SanitizationPolicy {
        max_depth: 4,
        ..Default::default()
    });
    let pipeline = Pipeline::new(
        ContentLocator::default(),
        sanitizer,
        MarkdownTransformer::default(),
    );

    let html = format!("<main>{}deep{}</main>", "<div>".repeat(6), "</div>".repeat(6));
    let err = pipeline.run(&html).unwrap_err();

    assert_eq!(err.stage, Stage::Sanitize);
    assert!(matches!(
        err.cause,
        StageError::Sanitization(SanitizationError::TooDeep { max: 4, .. })
    ));
    assert_eq!(err.code(), 4);
    assert!(err.to_string().starts_with("sanitize stage failed"));
}

#[test]
fn test_custom_selectors() {
    let selectors = SelectorList::from_strs(&["#story", "article"]).unwrap();
    let pipeline = Pipeline::new(
        ContentLocator::new(selectors),
        Sanitizer::default(),
        MarkdownTransformer::default(),
    );

    let html = r#"<main><p>Main</p></main><section id="story"><p>Story</p></section>"#;
    assert_eq!(pipeline.run(html).unwrap(), "Story");
}

#[test]
fn test_from_config_applies_every_section() {
    let config = PipelineConfig::from_toml_str(
        r#######"
        [locator]
        selectors = [".post"]

        [sanitizer]
        mark_links_nofollow = false

        [markdown]
        heading_markers = ["#", "##", "###", "####", "#####", "######"]
        bullets = "-"
        "#######,
    )
    .unwrap();
    let pipeline = Pipeline::from_config(&config).unwrap();

    let html = r#"<main>ignored</main><div class="post"><h1>Post</h1><ul><li>a</li></ul></div>"#;
    assert_eq!(pipeline.run(html).unwrap(), "# Post\n\n- a");
}

#[test]
fn test_run_bytes_uses_header_charset() {
    let markdown = Pipeline::default()
        .run_bytes(
            b"<main><p>Caf\xE9 au lait</p></main>",
            Some("text/html; charset=ISO-8859-1"),
        )
        .unwrap();
    assert_eq!(markdown, "Café au lait");
}

#[test]
fn test_run_bytes_uses_meta_charset() {
    let page = b"<html><head><meta charset=\"windows-1252\"></head>\
        <body><main><p>Na\xEFve</p></main></body></html>";
    assert_eq!(Pipeline::default().run_bytes(page, None).unwrap(), "Naïve");
}

#[test]
fn test_run_bytes_rejects_invalid_utf8() {
    let err = Pipeline::default()
        .run_bytes(b"<main>\xC3\x28</main>", Some("text/html; charset=utf-8"))
        .unwrap_err();

    assert_eq!(err.stage, Stage::Decode);
    assert_eq!(
        err.cause,
        StageError::Decode(DecodeError::InvalidBytes {
            charset: "UTF-8".to_string(),
            position: Some(6),
        })
    );
    assert_eq!(err.code(), 2);
}

#[test]
fn test_pipeline_is_reusable() {
    let pipeline = Pipeline::default();
    assert_eq!(pipeline.run("<main><p>One</p></main>").unwrap(), "One");
    assert_eq!(pipeline.run("<main><p>Two</p></main>").unwrap(), "Two");
}
