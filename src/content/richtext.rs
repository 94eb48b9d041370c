//! Prismic structured text: plain-text flattening and HTML rendering
//!
//! A field is a list of blocks (`paragraph`, `heading1`..`heading6`,
//! `preformatted`, `list-item`, `o-list-item`, `image`, `embed`). Inline
//! formatting is carried as spans whose offsets count UTF-16 code units.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::html_escape;

/// One structured-text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Value>,
}

impl RichTextBlock {
    /// Build a text block without spans
    pub fn text(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: Some(text.to_string()),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::text("paragraph", text)
    }
}

/// Inline formatting over `[start, end)` of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Maps CMS document links to site URLs
#[derive(Debug, Clone)]
pub struct LinkResolver {
    root: String,
    post_type: String,
    post_dir: String,
}

impl LinkResolver {
    pub fn new(root: &str, post_type: &str, post_dir: &str) -> Self {
        Self {
            root: format!("{}/", root.trim_end_matches('/')),
            post_type: post_type.to_string(),
            post_dir: post_dir.trim_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &crate::config::SiteConfig) -> Self {
        Self::new(&config.root, &config.cms.document_type, &config.post_dir)
    }

    /// Resolve a link document (`{type, uid, ...}`) to a URL
    pub fn resolve(&self, doc: &Value) -> Option<String> {
        let kind = doc.get("type")?.as_str()?;
        let uid = doc.get("uid").and_then(Value::as_str);
        match (kind, uid) {
            ("homepage", _) => Some(self.root.clone()),
            ("page", Some(uid)) => Some(format!("{}{}", self.root, uid)),
            (k, Some(uid)) if k == self.post_type => {
                Some(format!("{}{}/{}/", self.root, self.post_dir, uid))
            }
            _ => None,
        }
    }

    /// Resolve the `data` of a hyperlink span
    fn hyperlink(&self, data: &Value) -> Option<(String, bool)> {
        let link_type = data.get("link_type").and_then(Value::as_str).unwrap_or("Web");
        let url = match link_type {
            "Document" => self.resolve(data)?,
            _ => data.get("url")?.as_str()?.to_string(),
        };
        let blank = data.get("target").and_then(Value::as_str) == Some("_blank");
        Some((url, blank))
    }
}

/// Flatten blocks into plain text, one space between blocks
///
/// Blocks without text (images, embeds) contribute an empty string.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render blocks to HTML
pub fn as_html(blocks: &[RichTextBlock], links: &LinkResolver) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < blocks.len() {
        let block = &blocks[i];
        let kind = block.kind.as_str();

        if kind == "list-item" || kind == "o-list-item" {
            let tag = if kind == "list-item" { "ul" } else { "ol" };
            out.push_str(&format!("<{}>", tag));
            while i < blocks.len() && blocks[i].kind == kind {
                out.push_str("<li>");
                out.push_str(&serialize_text(&blocks[i], links));
                out.push_str("</li>");
                i += 1;
            }
            out.push_str(&format!("</{}>", tag));
            continue;
        }

        match kind {
            "paragraph" => wrap(&mut out, "p", &serialize_text(block, links)),
            "preformatted" => wrap(&mut out, "pre", &serialize_text(block, links)),
            "image" => {
                if let Some(url) = &block.url {
                    out.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                        html_escape(url),
                        html_escape(block.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            "embed" => {
                if let Some(oembed) = &block.oembed {
                    out.push_str(&embed_html(oembed));
                }
            }
            k => match heading_level(k) {
                Some(level) => wrap(&mut out, &format!("h{}", level), &serialize_text(block, links)),
                None => {
                    tracing::debug!("Unknown rich text block type {:?}", k);
                    if block.text.as_deref().is_some_and(|t| !t.is_empty()) {
                        wrap(&mut out, "p", &serialize_text(block, links));
                    }
                }
            },
        }
        i += 1;
    }

    out
}

fn wrap(out: &mut String, tag: &str, inner: &str) {
    out.push_str(&format!("<{tag}>{inner}</{tag}>"));
}

fn heading_level(kind: &str) -> Option<u8> {
    let level: u8 = kind.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn embed_html(oembed: &Value) -> String {
    let attr = |key: &str| {
        html_escape(oembed.get(key).and_then(Value::as_str).unwrap_or(""))
    };
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        attr("embed_url"),
        attr("type"),
        attr("provider_name"),
        // the provider's markup is embedded as delivered
        oembed.get("html").and_then(Value::as_str).unwrap_or("")
    )
}

/// Convert a UTF-16 offset into a char index, clamped to the text length
fn char_index(chars: &[char], utf16_offset: usize) -> usize {
    let mut units = 0;
    for (i, c) in chars.iter().enumerate() {
        if units >= utf16_offset {
            return i;
        }
        units += c.len_utf16();
    }
    chars.len()
}

/// Render a block's text with its spans applied
///
/// The text is cut at every span boundary; each piece is wrapped in the
/// tags of the spans covering it, outermost (earliest, longest) first.
fn serialize_text(block: &RichTextBlock, links: &LinkResolver) -> String {
    let text = block.text.as_deref().unwrap_or("");
    let chars: Vec<char> = text.chars().collect();

    let spans: Vec<(usize, usize, &Span)> = block
        .spans
        .iter()
        .map(|s| (char_index(&chars, s.start), char_index(&chars, s.end), s))
        .filter(|(start, end, _)| start < end)
        .collect();

    let mut bounds: Vec<usize> = vec![0, chars.len()];
    for (start, end, _) in &spans {
        bounds.push(*start);
        bounds.push(*end);
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::with_capacity(text.len());
    for pair in bounds.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mut active: Vec<&(usize, usize, &Span)> = spans
            .iter()
            .filter(|(start, end, _)| *start <= a && *end >= b)
            .collect();
        active.sort_by(|x, y| x.0.cmp(&y.0).then(y.1.cmp(&x.1)));

        let mut closers = Vec::with_capacity(active.len());
        for (_, _, span) in &active {
            if let Some((open, close)) = span_tags(span, links) {
                out.push_str(&open);
                closers.push(close);
            }
        }

        let piece: String = chars[a..b].iter().collect();
        out.push_str(&html_escape(&piece).replace('\n', "<br />"));

        for close in closers.iter().rev() {
            out.push_str(close);
        }
    }

    out
}

fn span_tags(span: &Span, links: &LinkResolver) -> Option<(String, String)> {
    match span.kind.as_str() {
        "strong" => Some(("<strong>".to_string(), "</strong>".to_string())),
        "em" => Some(("<em>".to_string(), "</em>".to_string())),
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(Value::as_str)
                .unwrap_or("");
            Some((
                format!(r#"<span class="{}">"#, html_escape(label)),
                "</span>".to_string(),
            ))
        }
        "hyperlink" => {
            let (url, blank) = links.hyperlink(span.data.as_ref()?)?;
            let target = if blank {
                r#" target="_blank" rel="noopener""#
            } else {
                ""
            };
            Some((
                format!(r#"<a href="{}"{}>"#, html_escape(&url), target),
                "</a>".to_string(),
            ))
        }
        _ => None,
    }
}
