//! Sanitization policy: which elements and attributes count as noise
//!
//! The policy is a plain set of flags. Each flag enables one category of
//! removal; the category tables below name the elements and attributes that
//! belong to it. Elements are either removed together with their content
//! ([`SanitizeAction::Remove`]) or unwrapped, keeping their children in
//! place ([`SanitizeAction::Unwrap`]).

use serde::{Deserialize, Serialize};

use crate::error::SanitizationError;

/// Maximum allowed nesting depth for HTML elements
/// Prevents stack overflow from deeply nested structures
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Script carriers, removed with their content
const SCRIPT_ELEMENTS: &[&str] = &["script", "noscript", "template"];

/// Presentational elements, removed with their content
const STYLE_ELEMENTS: &[&str] = &["style"];

/// External resource links (stylesheets, preloads, icons)
const LINK_ELEMENTS: &[&str] = &["link"];

/// Document metadata that has no readable content
const META_ELEMENTS: &[&str] = &["meta", "base"];

/// Embedded documents and plugins
const EMBEDDED_ELEMENTS: &[&str] = &[
    "iframe", "object", "embed", "applet", "param", "frame", "frameset", "noframes",
];

/// Presentational wrappers, unwrapped so their text survives
const PRESENTATIONAL_WRAPPERS: &[&str] = &["blink", "marquee"];

/// Form controls, removed with their content
const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea"];

/// Form containers, unwrapped so surrounding text survives
const FORM_WRAPPERS: &[&str] = &["form"];

/// Page-structure elements
const STRUCTURAL_WRAPPERS: &[&str] = &["html", "head", "body", "title"];

/// Anchor attributes that only decorate navigation behaviour
const LINK_DECORATION_ATTRIBUTES: &[&str] =
    &["target", "ping", "referrerpolicy", "hreflang", "media", "type"];

/// Attributes that carry URLs a browser would navigate to or load
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction"];

/// Dangerous URL schemes that should be blocked
const DANGEROUS_URL_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Action to take when sanitizing an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeAction {
    /// Keep the element (its attributes may still be cleaned)
    Keep,
    /// Remove the element and all its children
    Remove,
    /// Drop the element but keep its children in its place
    Unwrap,
}

/// Noise-removal configuration for the sanitizer.
///
/// The defaults strip everything but the structure needed for Markdown and
/// mark surviving links `nofollow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizationPolicy {
    /// Remove script carriers, `on*` handlers and script URLs
    pub strip_scripts: bool,
    /// Remove `style` elements and `style` attributes, unwrap `blink` and
    /// `marquee`
    pub strip_styles: bool,
    /// Remove `link` elements and link decoration attributes
    pub strip_links: bool,
    /// Add `rel="nofollow"` to every anchor with an `href`
    pub mark_links_nofollow: bool,
    /// Unwrap `html`, `head`, `body` and `title`
    pub strip_structural_wrappers: bool,
    pub strip_comments: bool,
    pub strip_embedded: bool,
    /// Remove form controls and unwrap `form`
    pub strip_forms: bool,
    pub strip_meta: bool,
    /// Deepest element nesting accepted before sanitization fails
    pub max_depth: usize,
}

impl Default for SanitizationPolicy {
    fn default() -> Self {
        Self {
            strip_scripts: true,
            strip_styles: true,
            strip_links: true,
            mark_links_nofollow: true,
            strip_structural_wrappers: false,
            strip_comments: true,
            strip_embedded: true,
            strip_forms: true,
            strip_meta: true,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl SanitizationPolicy {
    /// A policy that changes nothing except enforcing the depth limit.
    pub fn permissive() -> Self {
        Self {
            strip_scripts: false,
            strip_styles: false,
            strip_links: false,
            mark_links_nofollow: false,
            strip_structural_wrappers: false,
            strip_comments: false,
            strip_embedded: false,
            strip_forms: false,
            strip_meta: false,
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Decide what happens to an element with the given tag name
    ///
    /// # Examples
    ///
    /// ```
    /// use content_markdown_converter::policy::{SanitizationPolicy, SanitizeAction};
    ///
    /// let policy = SanitizationPolicy::default();
    /// assert_eq!(policy.check_element("script"), SanitizeAction::Remove);
    /// assert_eq!(policy.check_element("form"), SanitizeAction::Unwrap);
    /// assert_eq!(policy.check_element("p"), SanitizeAction::Keep);
    /// ```
    pub fn check_element(&self, tag_name: &str) -> SanitizeAction {
        let removed = [
            (self.strip_scripts, SCRIPT_ELEMENTS),
            (self.strip_styles, STYLE_ELEMENTS),
            (self.strip_links, LINK_ELEMENTS),
            (self.strip_meta, META_ELEMENTS),
            (self.strip_embedded, EMBEDDED_ELEMENTS),
            (self.strip_forms, FORM_CONTROLS),
        ];
        if removed
            .iter()
            .any(|(enabled, tags)| *enabled && tags.contains(&tag_name))
        {
            return SanitizeAction::Remove;
        }

        let unwrapped = [
            (self.strip_styles, PRESENTATIONAL_WRAPPERS),
            (self.strip_forms, FORM_WRAPPERS),
            (self.strip_structural_wrappers, STRUCTURAL_WRAPPERS),
        ];
        if unwrapped
            .iter()
            .any(|(enabled, tags)| *enabled && tags.contains(&tag_name))
        {
            return SanitizeAction::Unwrap;
        }

        SanitizeAction::Keep
    }

    /// Validate nesting depth to prevent stack overflow
    ///
    /// # Examples
    ///
    /// ```
    /// use content_markdown_converter::policy::SanitizationPolicy;
    ///
    /// let policy = SanitizationPolicy { max_depth: 100, ..Default::default() };
    /// assert!(policy.validate_depth(100).is_ok());
    /// assert!(policy.validate_depth(101).is_err());
    /// ```
    pub fn validate_depth(&self, depth: usize) -> Result<(), SanitizationError> {
        if depth > self.max_depth {
            Err(SanitizationError::TooDeep {
                depth,
                max: self.max_depth,
            })
        } else {
            Ok(())
        }
    }

    /// Whether the attribute `attr_name` on a `tag_name` element (holding
    /// `value`) should be dropped.
    pub fn should_strip_attribute(&self, tag_name: &str, attr_name: &str, value: &str) -> bool {
        if self.strip_scripts {
            if is_event_handler(attr_name) {
                return true;
            }
            if URL_ATTRIBUTES.contains(&attr_name) && is_dangerous_url(value) {
                return true;
            }
        }

        if self.strip_styles && attr_name == "style" {
            return true;
        }

        self.strip_links
            && matches!(tag_name, "a" | "area")
            && LINK_DECORATION_ATTRIBUTES.contains(&attr_name)
    }
}

/// Check if an attribute is an event handler (`onclick`, `onload`, ...)
pub fn is_event_handler(attr_name: &str) -> bool {
    attr_name.len() > 2 && attr_name.starts_with("on")
}

/// Check if a URL uses a scheme that executes or smuggles content.
///
/// `data:image/...` is allowed so inline images survive.
///
/// # Examples
///
/// ```
/// use content_markdown_converter::policy::is_dangerous_url;
///
/// assert!(is_dangerous_url("javascript:alert('xss')"));
/// assert!(is_dangerous_url("  JavaScript:void(0)"));
/// assert!(is_dangerous_url("data:text/html,<script>alert(1)</script>"));
/// assert!(!is_dangerous_url("data:image/png;base64,AAAA"));
/// assert!(!is_dangerous_url("https://example.com"));
/// assert!(!is_dangerous_url("/relative/path"));
/// ```
pub fn is_dangerous_url(url: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes
    let url_lower: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    if url_lower.starts_with("data:image/") {
        return false;
    }

    DANGEROUS_URL_SCHEMES
        .iter()
        .any(|scheme| url_lower.starts_with(scheme))
}
