//! Raw content-service records and the transform into view models
//!
//! Pages are decoded leniently so that a single bad record does not fail
//! the whole response; each record is validated when it is transformed.

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::post::{
    Banner, PostDetail, PostDetailData, PostSummary, PostSummaryData, PostsPagination, Section,
};
use super::richtext::{as_text, RichTextBlock};
use crate::config::SiteConfig;
use crate::error::ContentError;
use crate::helpers::{format_optional_date, DEFAULT_DATE_FORMAT};

/// A page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub results: Vec<RawPost>,
}

/// A document as delivered by the content service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default, deserialize_with = "string_or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub uid: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "string_or_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "timestamp_or_none")]
    pub first_publication_date: Option<String>,
    #[serde(default, deserialize_with = "timestamp_or_none")]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Decode each entry of `results` on its own, dropping entries that are
/// not documents at all
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawPost>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RawPost>(entry) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!("Skipping undecodable record: {}", e);
                None
            }
        })
        .collect())
}

/// A string field; any other JSON type reads as absent
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_none(deserializer)?.unwrap_or_default())
}

/// A timestamp field; non-string values are kept as text so that the date
/// transform rejects the record instead of treating it as unpublished
fn timestamp_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// The first slice of a post, which carries every field the site uses
#[derive(Debug, Clone, Deserialize)]
struct RawSlice {
    #[serde(default)]
    primary: Map<String, Value>,
    #[serde(default)]
    items: Vec<Value>,
}

/// Date settings applied by the transform
#[derive(Debug, Clone)]
pub struct DateStyle {
    pub pattern: String,
    pub tz: Tz,
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
            tz: chrono_tz::UTC,
        }
    }
}

impl DateStyle {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            pattern: config.date_format.clone(),
            tz: config.tz(),
        }
    }
}

impl RawPost {
    /// Identifier used in error messages
    fn label(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }

    fn uid(&self) -> Result<String, ContentError> {
        match self.uid.as_deref() {
            Some(uid) if !uid.is_empty() => Ok(uid.to_string()),
            _ => Err(ContentError::malformed(&self.id, "missing uid")),
        }
    }

    fn first_slice(&self) -> Result<RawSlice, ContentError> {
        let slice = self
            .data
            .get("slices")
            .and_then(Value::as_array)
            .and_then(|slices| slices.first())
            .ok_or_else(|| ContentError::malformed(self.label(), "no slices"))?;
        serde_json::from_value(slice.clone())
            .map_err(|e| ContentError::malformed(self.label(), format!("bad slice: {}", e)))
    }

    fn publication_date(&self, dates: &DateStyle) -> Result<Option<String>, ContentError> {
        format_optional_date(self.first_publication_date.as_deref(), &dates.pattern, dates.tz)
    }

    /// Listing transform: uid, formatted date, title/subtitle/author
    pub fn to_summary(&self, dates: &DateStyle) -> Result<PostSummary, ContentError> {
        let uid = self.uid()?;
        let slice = self.first_slice()?;
        let data = PostSummaryData {
            title: required_text(&slice.primary, "title", &uid)?,
            subtitle: optional_text(&slice.primary, "subtitle", &uid)?,
            author: optional_text(&slice.primary, "author", &uid)?,
        };
        Ok(PostSummary::new(uid, self.publication_date(dates)?, data))
    }

    /// Detail transform: title, banner, author and the heading/body sections
    pub fn to_detail(&self, dates: &DateStyle) -> Result<PostDetail, ContentError> {
        let uid = self.uid()?;
        let slice = self.first_slice()?;

        let banner_url = slice
            .primary
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let content = slice
            .items
            .iter()
            .map(|item| to_section(item, &uid))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PostDetail {
            uid: uid.clone(),
            first_publication_date: self.publication_date(dates)?,
            data: PostDetailData {
                title: required_text(&slice.primary, "title", &uid)?,
                banner: Banner { url: banner_url },
                author: optional_text(&slice.primary, "author", &uid)?,
                content,
            },
        })
    }
}

fn to_section(item: &Value, uid: &str) -> Result<Section, ContentError> {
    let fields = item
        .as_object()
        .ok_or_else(|| ContentError::malformed(uid, "content item is not an object"))?;

    let body = match fields.get("body") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<RichTextBlock>>(value.clone())
            .map_err(|e| ContentError::malformed(uid, format!("bad body: {}", e)))?,
    };

    Ok(Section {
        heading: optional_text(fields, "heading", uid)?,
        body,
    })
}

/// Read a key-text or rich-text field as plain text
fn text_value(value: &Value, key: &str, uid: &str) -> Result<Option<String>, ContentError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Array(_) => {
            let blocks: Vec<RichTextBlock> = serde_json::from_value(value.clone())
                .map_err(|e| ContentError::malformed(uid, format!("bad {}: {}", key, e)))?;
            Ok(Some(as_text(&blocks)))
        }
        _ => Err(ContentError::malformed(uid, format!("{} is not text", key))),
    }
}

fn required_text(fields: &Map<String, Value>, key: &str, uid: &str) -> Result<String, ContentError> {
    fields
        .get(key)
        .map(|v| text_value(v, key, uid))
        .transpose()?
        .flatten()
        .ok_or_else(|| ContentError::malformed(uid, format!("missing {}", key)))
}

fn optional_text(fields: &Map<String, Value>, key: &str, uid: &str) -> Result<String, ContentError> {
    Ok(fields
        .get(key)
        .map(|v| text_value(v, key, uid))
        .transpose()?
        .flatten()
        .unwrap_or_default())
}

/// Transform every record of a page, skipping records that fail validation
pub fn summarize_page(page: &RawPage, dates: &DateStyle) -> PostsPagination {
    let results = page
        .results
        .iter()
        .filter_map(|post| match post.to_summary(dates) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Skipping post {:?}: {}", post.label(), e);
                None
            }
        })
        .collect();

    PostsPagination {
        results,
        next_page: page.next_page.clone(),
    }
}
