//! Search query builder

/// Default ordering of blog posts, newest first
pub const NEWEST_FIRST: &str = "document.first_publication_date desc";

/// A `documents/search` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    document_type: String,
    uid: Option<String>,
    page_size: usize,
    orderings: Vec<String>,
    fetch: Vec<String>,
}

impl Query {
    /// All documents of a custom type
    pub fn by_type(document_type: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            uid: None,
            page_size: 20,
            orderings: Vec::new(),
            fetch: Vec::new(),
        }
    }

    /// The document of a custom type with a given UID
    pub fn by_uid(document_type: &str, uid: &str) -> Self {
        Self {
            uid: Some(uid.to_string()),
            ..Self::by_type(document_type)
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn ordering(mut self, ordering: &str) -> Self {
        self.orderings.push(ordering.to_string());
        self
    }

    /// Restrict the returned data to `{type}.{field}` for each field
    pub fn fetch(mut self, fields: &[&str]) -> Self {
        self.fetch.extend(
            fields
                .iter()
                .map(|f| format!("{}.{}", self.document_type, f)),
        );
        self
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn size(&self) -> usize {
        self.page_size
    }

    /// The `q` parameter, e.g. `[[at(document.type,"posts")]]`
    pub fn q(&self) -> String {
        match &self.uid {
            Some(uid) => format!(
                "[[at(my.{}.uid,{})]]",
                self.document_type,
                quote(uid)
            ),
            None => format!("[[at(document.type,{})]]", quote(&self.document_type)),
        }
    }

    /// Query-string pairs, without `ref` and `access_token`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q()),
            ("pageSize", self.page_size.to_string()),
        ];
        if !self.orderings.is_empty() {
            params.push(("orderings", format!("[{}]", self.orderings.join(","))));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        params
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
