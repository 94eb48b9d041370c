//! Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{ContentService, Query};
use crate::config::CmsConfig;
use crate::content::raw::RawPage;
use crate::error::ContentError;

/// Connection settings, passed explicitly to every client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Preview or release ref; the master ref is used when unset
    pub ref_override: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_cms(cms: &CmsConfig) -> Self {
        Self {
            endpoint: cms.endpoint.clone(),
            access_token: cms.access_token.clone(),
            ref_override: cms.ref_override.clone(),
            timeout: Duration::from_secs(cms.timeout_secs),
        }
    }

    /// Same connection, reading content at another ref (e.g. a preview)
    pub fn with_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.ref_override = Some(content_ref.into());
        self
    }
}

/// API descriptor returned by the endpoint root
#[derive(Debug, Deserialize)]
struct ApiDescriptor {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    content_ref: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// HTTP client for one Prismic repository
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    config: ClientConfig,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    pub fn new(config: ClientConfig) -> Result<Self, ContentError> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|_| ContentError::InvalidEndpoint(config.endpoint.clone()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ContentError::InvalidEndpoint(config.endpoint.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            config,
            master_ref: OnceCell::new(),
        })
    }

    /// The ref documents are read at
    ///
    /// The master ref is looked up once per client.
    pub async fn content_ref(&self) -> Result<String, ContentError> {
        if let Some(preview) = &self.config.ref_override {
            return Ok(preview.clone());
        }

        self.master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                self.authorize(&mut url);
                let api: ApiDescriptor = self.get_json(url).await?;
                let master = api
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.content_ref)
                    .ok_or(ContentError::MissingMasterRef)?;
                tracing::debug!("Using master ref {}", master);
                Ok::<_, ContentError>(master)
            })
            .await
            .cloned()
    }

    fn search_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["documents", "search"]);
        }
        url
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.config.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    /// Check that a cursor points at this repository
    fn cursor_url(&self, cursor: &str) -> Result<Url, ContentError> {
        let url = Url::parse(cursor).map_err(|_| ContentError::InvalidCursor(cursor.to_string()))?;
        if url.origin() != self.endpoint.origin() {
            return Err(ContentError::InvalidCursor(cursor.to_string()));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        tracing::debug!("GET {}", url);
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ContentError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ContentService for PrismicClient {
    async fn query(&self, query: &Query) -> Result<RawPage, ContentError> {
        let content_ref = self.content_ref().await?;

        let mut url = self.search_url();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &content_ref);
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        self.authorize(&mut url);

        self.get_json(url).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, ContentError> {
        let mut url = self.cursor_url(cursor)?;
        self.authorize(&mut url);
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::NEWEST_FIRST;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn api_body() -> String {
        json!({
            "refs": [
                {"id": "release", "ref": "release-ref", "label": "Release", "isMasterRef": false},
                {"id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true}
            ]
        })
        .to_string()
    }

    fn client(server: &Server, token: Option<&str>) -> PrismicClient {
        PrismicClient::new(ClientConfig {
            endpoint: format!("{}/api/v2", server.url()),
            access_token: token.map(str::to_string),
            ref_override: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_uses_master_ref_and_params() {
        let mut server = Server::new_async().await;
        let api = server
            .mock("GET", "/api/v2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(api_body())
            .expect(1)
            .create_async()
            .await;
        let search = server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ref".into(), "master-ref".into()),
                Matcher::UrlEncoded("q".into(), r#"[[at(document.type,"posts")]]"#.into()),
                Matcher::UrlEncoded("pageSize".into(), "1".into()),
                Matcher::UrlEncoded(
                    "orderings".into(),
                    "[document.first_publication_date desc]".into(),
                ),
            ]))
            .with_status(200)
            .with_body(
                json!({"page": 1, "total_pages": 2, "next_page": "https://next", "results": []})
                    .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let client = client(&server, None);
        let query = Query::by_type("posts").page_size(1).ordering(NEWEST_FIRST);
        let page = client.query(&query).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.next_page.as_deref(), Some("https://next"));

        // the master ref is cached
        client.query(&query).await.unwrap();
        api.assert_async().await;
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_ref_override_skips_api_lookup() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::UrlEncoded("ref".into(), "preview-ref".into()))
            .with_status(200)
            .with_body(json!({"results": []}).to_string())
            .create_async()
            .await;

        let mut config = client(&server, None).config.clone();
        config = config.with_ref("preview-ref");
        let client = PrismicClient::new(config).unwrap();
        client.query(&Query::by_type("posts")).await.unwrap();
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_by_uid_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v2")
            .with_status(200)
            .with_body(api_body())
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"[[at(my.posts.uid,"missing")]]"#.into(),
            ))
            .with_status(200)
            .with_body(json!({"results": []}).to_string())
            .create_async()
            .await;

        let err = client(&server, None)
            .get_by_uid("posts", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound { uid } if uid == "missing"));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_cursor_with_token() {
        let mut server = Server::new_async().await;
        let next = server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("access_token".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(json!({"page": 2, "next_page": null, "results": []}).to_string())
            .create_async()
            .await;

        let client = client(&server, Some("secret"));
        let cursor = format!("{}/api/v2/documents/search?ref=master-ref&page=2", server.url());
        let page = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(page.page, 2);
        assert!(page.next_page.is_none());
        next.assert_async().await;
    }

    #[tokio::test]
    async fn test_foreign_cursor_is_rejected() {
        let server = Server::new_async().await;
        let client = client(&server, None);
        let err = client
            .fetch_page("https://evil.example.com/api/v2/documents/search?page=2")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_error_status_and_bad_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::UrlEncoded("page".into(), "9".into()))
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/documents/search")
            .match_query(Matcher::UrlEncoded("page".into(), "10".into()))
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = client(&server, None);
        let base = format!("{}/api/v2/documents/search", server.url());

        let err = client.fetch_page(&format!("{}?page=9", base)).await.unwrap_err();
        assert!(matches!(err, ContentError::Status { status: 500, .. }));

        let err = client.fetch_page(&format!("{}?page=10", base)).await.unwrap_err();
        assert!(matches!(err, ContentError::Decode { .. }));
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = PrismicClient::new(ClientConfig {
            endpoint: "not a url".to_string(),
            access_token: None,
            ref_override: None,
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(result, Err(ContentError::InvalidEndpoint(_))));
    }
}
