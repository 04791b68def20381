//! Sanitizer behaviour tests
//!
//! Exercises the noise-removal stage on hostile and messy fragments: scripts,
//! event handlers, script URLs, embedded content, link decoration and deep
//! nesting. Each test checks both that the noise is gone and that the
//! surrounding content survives.

use content_markdown_converter::SanitizationError;
use content_markdown_converter::policy::SanitizationPolicy;
use content_markdown_converter::sanitizer::{Sanitizer, sanitize};
use pretty_assertions::assert_eq;

fn clean(html: &str) -> String {
    Sanitizer::default().sanitize(html).expect("Failed to sanitize")
}

/// Script elements are removed with their text, siblings remain
#[test]
fn test_script_tag_removal() {
    let html = r#"<div>
        <p>Before dangerous element</p>
        <script>alert('xss')</script>
        <p>After dangerous element</p>
    </div>"#;

    let output = clean(html);

    assert!(!output.contains("<script"));
    assert!(!output.contains("alert"));
    assert!(output.contains("<p>Before dangerous element</p>"));
    assert!(output.contains("<p>After dangerous element</p>"));
}

#[test]
fn test_style_removed_sibling_text_kept() {
    let output = clean("<p>Keep</p><style>.x { color: red }</style>tail text");
    assert_eq!(output, "<p>Keep</p>tail text");
}

#[test]
fn test_event_handler_removal() {
    let html = r#"<p onclick="alert('xss')">Click me</p>
        <div onload="malicious()">Content</div>
        <a href="test.html" onmouseover="attack()">Link</a>"#;

    let output = clean(html);

    assert!(!output.contains("onclick"));
    assert!(!output.contains("onload"));
    assert!(!output.contains("onmouseover"));
    assert!(output.contains("Click me"));
    assert!(output.contains(r#"<a href="test.html" rel="nofollow">Link</a>"#));
}

#[test]
fn test_javascript_url_case_insensitive() {
    for href in [
        "javascript:alert(1)",
        "JAVASCRIPT:alert(1)",
        "JavaScript:alert(1)",
        " javascript:alert(1)",
    ] {
        let output = clean(&format!(r#"<a href="{href}">Click</a>"#));
        assert_eq!(output, "<a>Click</a>", "href {href:?}");
    }
}

#[test]
fn test_data_urls() {
    let output = clean(r#"<a href="data:text/html,<script>alert(1)</script>">x</a>"#);
    assert_eq!(output, "<a>x</a>");

    let output = clean(r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="pixel">"#);
    assert_eq!(output, r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="pixel">"#);
}

#[test]
fn test_vbscript_url_blocked() {
    assert_eq!(clean(r#"<img src="vbscript:msgbox(1)" alt="x">"#), r#"<img alt="x">"#);
}

#[test]
fn test_safe_urls_preserved() {
    let html = r##"<a href="https://example.com">a</a><a href="/relative">b</a><a href="mailto:x@example.com">c</a><a href="#frag">d</a>"##;
    let output = clean(html);
    for href in ["https://example.com", "/relative", "mailto:x@example.com", "#frag"] {
        assert!(output.contains(&format!(r#"href="{href}""#)), "missing {href}");
    }
}

#[test]
fn test_embedded_content_removal() {
    let html = r#"<p>Before</p>
        <iframe src="http://internal/admin"></iframe>
        <object data="x.swf"><param name="a" value="b"></object>
        <embed src="x.swf">
        <p>After</p>"#;

    let output = clean(html);

    assert!(!output.contains("iframe"));
    assert!(!output.contains("object"));
    assert!(!output.contains("embed"));
    assert!(!output.contains("param"));
    assert!(output.contains("<p>Before</p>"));
    assert!(output.contains("<p>After</p>"));
}

#[test]
fn test_link_and_base_and_meta_removal() {
    let html = r#"<base href="http://evil.example/"><meta http-equiv="refresh" content="0">
        <link rel="stylesheet" href="x.css"><p>Content</p>"#;
    assert_eq!(clean(html), "<p>Content</p>");
}

#[test]
fn test_link_decoration_stripped_anchor_kept() {
    let html = r#"<p><a href="/x" target="_blank" ping="/track" referrerpolicy="no-referrer" title="T">Go</a></p>"#;
    assert_eq!(
        clean(html),
        r#"<p><a href="/x" title="T" rel="nofollow">Go</a></p>"#
    );
}

#[test]
fn test_doctype_is_not_output() {
    let output = clean("<!DOCTYPE html><html><body><p>Content</p></body></html>");
    assert_eq!(output, "<p>Content</p>");
}

#[test]
fn test_body_region_is_unwrapped_to_its_content() {
    assert_eq!(clean("<body><p>Hello</p></body>"), "<p>Hello</p>");
}

#[test]
fn test_deeply_nested_html() {
    let depth = 100;
    let html = format!("{}Deep{}", "<div>".repeat(depth), "</div>".repeat(depth));

    let output = clean(&html);
    assert!(output.contains("Deep"));

    let strict = Sanitizer::new(SanitizationPolicy {
        max_depth: 50,
        ..Default::default()
    });
    assert_eq!(
        strict.sanitize(&html),
        Err(SanitizationError::TooDeep { depth: 51, max: 50 })
    );
}

#[test]
fn test_multiple_vectors_at_once() {
    let html = r#"<div>
        <script>alert(1)</script>
        <img src="x" onerror="alert(2)">
        <a href="javascript:alert(3)">click</a>
        <iframe src="javascript:alert(4)"></iframe>
        <form action="javascript:alert(5)"><input value="x"><p>Form text</p></form>
        <p style="background:url(javascript:alert(6))">Styled</p>
    </div>"#;

    let output = clean(html);

    assert!(!output.contains("alert"));
    assert!(!output.contains("javascript"));
    assert!(output.contains(r#"<img src="x">"#));
    assert!(output.contains("<a>click</a>"));
    assert!(output.contains("<p>Form text</p>"));
    assert!(output.contains("<p>Styled</p>"));
}

#[test]
fn test_policy_flags_are_independent() {
    let html = r#"<p style="x"><a href="/a" target="_blank">a</a></p><!-- c -->"#;

    let keep_styles = SanitizationPolicy {
        strip_styles: false,
        ..Default::default()
    };
    assert_eq!(
        sanitize(html, &keep_styles).unwrap(),
        r#"<p style="x"><a href="/a" rel="nofollow">a</a></p>"#
    );

    let keep_links = SanitizationPolicy {
        strip_links: false,
        mark_links_nofollow: false,
        ..Default::default()
    };
    assert_eq!(
        sanitize(html, &keep_links).unwrap(),
        r#"<p><a href="/a" target="_blank">a</a></p>"#
    );

    let keep_comments = SanitizationPolicy {
        strip_comments: false,
        ..Default::default()
    };
    assert_eq!(
        sanitize(html, &keep_comments).unwrap(),
        r#"<p><a href="/a" rel="nofollow">a</a></p><!-- c -->"#
    );
}

#[test]
fn test_sanitize_twice_is_stable() {
    let html = r#"<title>T</title><div class="post"><h2>Head</h2>
        <p>Some <b>bold</b> &amp; <a href="/x" rel="author">link</a></p>
        <script>x()</script><ul><li>one<li>two</ul></div>"#;

    let once = clean(html);
    assert_eq!(clean(&once), once);
}

#[test]
fn test_cleaned_to_nothing_vs_unparseable() {
    assert_eq!(Sanitizer::default().sanitize("<script>x</script>"), Ok(String::new()));
    assert!(matches!(
        Sanitizer::default().sanitize("<!-- only a comment -->"),
        Err(SanitizationError::Unparseable(_))
    ));
}
