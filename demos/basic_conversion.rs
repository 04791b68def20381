//! Basic conversion example demonstrating the extraction pipeline

use content_markdown_converter::{
    ContentLocator, MarkdownTransformer, Pipeline, PipelineConfig, Sanitizer,
};

fn main() {
    println!("=== Content Markdown Converter - Basic Examples ===\n");

    // Example 1: Main content is picked out of page chrome
    example_1();

    // Example 2: Each stage on its own
    example_2();

    // Example 3: Configuration from TOML
    example_3();

    // Example 4: Failures name their stage
    example_4();
}

fn example_1() {
    println!("Example 1: Main content extraction");
    let html = r#"<html><head><title>Blog</title><style>nav { float: left }</style></head>
<body>
  <nav><a href="/">Home</a> | <a href="/archive">Archive</a></nav>
  <article>
    <h1>Shipping the parser</h1>
    <p>The new parser is <strong>twice</strong> as fast. Read the <a href="/notes">notes</a>.</p>
    <script>analytics.track("view")</script>
    <ul><li>Fewer allocations</li><li>Iterative traversal</li></ul>
  </article>
  <footer>Copyright</footer>
</body></html>"#;
    println!("Input HTML:\n{html}\n");

    match Pipeline::default().run(html) {
        Ok(markdown) => println!("Output Markdown:\n{markdown}"),
        Err(err) => println!("Conversion failed: {err}"),
    }
    println!("---\n");
}

fn example_2() {
    println!("Example 2: Stages one by one");
    let html = r#"<div class="sidebar">Links</div><div class="content"><h2>Notes</h2><p style="color: red">Styled <em>text</em></p></div>"#;

    let Some(region) = ContentLocator::default().locate(html) else {
        println!("No content region found");
        return;
    };
    println!(
        "Located via {:?}: {}",
        region.matched_rule().unwrap_or("body"),
        region.to_html()
    );

    let cleaned = match Sanitizer::default().sanitize(&region.to_html()) {
        Ok(cleaned) => cleaned,
        Err(err) => {
            println!("Sanitization failed: {err}");
            return;
        }
    };
    println!("Sanitized: {cleaned}");

    let markdown = MarkdownTransformer::default().transform(&cleaned);
    println!("Markdown:\n{markdown}");
    println!("---\n");
}

fn example_3() {
    println!("Example 3: Configuration");
    let toml = r#######"
[locator]
selectors = ["#story", "main"]

[markdown]
heading_markers = ["#", "##", "###", "####", "#####", "######"]
"#######;

    let pipeline = match PipelineConfig::from_toml_str(toml).and_then(|c| Pipeline::from_config(&c)) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            println!("Invalid configuration: {err}");
            return;
        }
    };

    let html = r#"<main><p>Not this</p></main><section id="story"><h1>Headline</h1><p>Body</p></section>"#;
    match pipeline.run(html) {
        Ok(markdown) => println!("Output Markdown:\n{markdown}"),
        Err(err) => println!("Conversion failed: {err}"),
    }
    println!("---\n");
}

fn example_4() {
    println!("Example 4: Stage-attributed errors");
    for input in ["", "<html><body>   </body></html>"] {
        match Pipeline::default().run(input) {
            Ok(markdown) => println!("{input:?} -> {markdown:?}"),
            Err(err) => println!("{input:?} -> error (code {}): {err}", err.code()),
        }
    }
    println!("---\n");
}
