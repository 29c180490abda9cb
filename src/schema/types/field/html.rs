use super::text::{check_bounds, check_length, coerce_text};
use crate::error::{SchemaError, SchemaResult};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashSet;

static DANGEROUS_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|object|embed)\b[^>]*>.*?</\s*(script|style|iframe|object|embed)\s*>")
        .expect("valid block regex")
});
// Attribute values are read as whole quoted units, so a `>` inside quotes
// never ends the tag.
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)(\s*)(/?)>"#,
    )
    .expect("valid tag regex")
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+([^\s"'>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("valid attribute regex")
});

const DEFAULT_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "i", "img", "li", "ol", "p", "pre", "s", "span", "strike", "strong", "sub", "sup", "table",
    "tbody", "td", "th", "thead", "tr", "u", "ul",
];
const DEFAULT_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "target", "class"];

/// Allow-list sanitizer for rich-text items.
///
/// Tags outside the list are removed while their inner text is kept.
/// Script-like blocks are removed together with their content. Attributes
/// outside the list, `on*` handlers and `javascript:` URLs are dropped from
/// allowed tags.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlAllowList {
    tags: HashSet<String>,
    attributes: HashSet<String>,
}

impl Default for HtmlAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS, DEFAULT_ATTRIBUTES)
    }
}

impl HtmlAllowList {
    pub fn new(tags: &[&str], attributes: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            attributes: attributes.iter().map(|a| a.to_ascii_lowercase()).collect(),
        }
    }

    /// Permits no markup at all.
    pub fn none() -> Self {
        Self::new(&[], &[])
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    /// Rebuilds every allowed tag from its permitted attributes, removes
    /// the rest and escapes any `<` or `>` left outside a tag.
    pub fn sanitize(&self, input: &str) -> String {
        let without_blocks = DANGEROUS_BLOCKS.replace_all(input, "");
        let mut out = String::with_capacity(without_blocks.len());
        let mut last = 0;
        for caps in TAG.captures_iter(&without_blocks) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            escape_into(&mut out, &without_blocks[last..whole.start()]);
            out.push_str(&self.rewrite_tag(&caps));
            last = whole.end();
        }
        escape_into(&mut out, &without_blocks[last..]);
        out
    }

    fn rewrite_tag(&self, caps: &Captures) -> String {
        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();
        if !self.allows_tag(&tag) {
            return String::new();
        }
        if closing {
            return format!("</{}>", tag);
        }

        let mut rebuilt = format!("<{}", tag);
        for attr in ATTRIBUTE.captures_iter(&caps[3]) {
            let name = attr[1].to_ascii_lowercase();
            let value = attr.get(2).map(|m| m.as_str());
            if self.attribute_allowed(&name, value) {
                rebuilt.push(' ');
                rebuilt.push_str(attr[0].trim_start());
            }
        }
        rebuilt.push_str(&caps[4]);
        rebuilt.push_str(&caps[5]);
        rebuilt.push('>');
        rebuilt
    }

    fn attribute_allowed(&self, name: &str, value: Option<&str>) -> bool {
        if name.starts_with("on") || !self.attributes.contains(name) {
            return false;
        }
        match value {
            Some(value) => {
                let unquoted = value.trim_matches(|c| c == '"' || c == '\'');
                !unquoted.trim_start().to_ascii_lowercase().starts_with("javascript:")
            }
            None => true,
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Options for a rich-text item.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlOptions {
    pub allow_list: HtmlAllowList,
    /// Reject input the sanitizer would change, instead of storing the
    /// sanitized form.
    pub error_bad_html: bool,
    pub min_characters: usize,
    pub max_characters: usize,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            allow_list: HtmlAllowList::default(),
            error_bad_html: true,
            min_characters: 0,
            max_characters: 10_000,
        }
    }
}

impl HtmlOptions {
    pub fn new(min_characters: usize, max_characters: usize) -> Self {
        Self {
            min_characters,
            max_characters,
            ..Default::default()
        }
    }

    pub fn with_allow_list(mut self, allow_list: HtmlAllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Silently store the sanitized form of disallowed input.
    pub fn rewrite_bad_html(mut self) -> Self {
        self.error_bad_html = false;
        self
    }

    pub(crate) fn check(&self, name: &str) -> SchemaResult<()> {
        check_bounds(name, self.min_characters, self.max_characters)
    }

    pub(crate) fn validate(&self, name: &str, value: &Value) -> SchemaResult<Value> {
        let text = coerce_text(name, value)?;
        let text = text.trim();
        let sanitized = self.allow_list.sanitize(text);
        if self.error_bad_html && sanitized != text {
            return Err(SchemaError::Validation(format!(
                "'{}' has html code that is not allowed",
                name
            )));
        }
        check_length(name, &sanitized, self.min_characters, self.max_characters)?;
        Ok(Value::String(sanitized))
    }
}
