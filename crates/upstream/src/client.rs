//! The Upstream client (C4): rate-limited, token-authenticated HTTP client
//! to the external catalogue.

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamErrorBody};
use crate::rate_limit::RateLimiters;
use crate::session::{is_protected_path, SessionManager};
use crate::transform::{self, MangaRecord, PartialManhwa};
use manhwa_core::models::tag::Tag;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

const PAGINATION_CEILING: u32 = 10_000;

/// §4.4 "Search filters supported."
#[derive(Debug, Clone)]
pub struct UpstreamSearchParams {
    pub title: String,
    pub limit: u32,
    pub offset: u32,
    pub content_rating: Vec<String>,
    pub status: Vec<String>,
    pub publication_demographic: Vec<String>,
    pub included_tags: Vec<String>,
    pub excluded_tags: Vec<String>,
}

impl Default for UpstreamSearchParams {
    fn default() -> Self {
        UpstreamSearchParams {
            title: String::new(),
            limit: 20,
            offset: 0,
            content_rating: vec!["safe".into(), "suggestive".into()],
            status: Vec::new(),
            publication_demographic: Vec::new(),
            included_tags: Vec::new(),
            excluded_tags: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    data: Vec<MangaRecord>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct RecordResponseBody {
    data: MangaRecord,
}

#[derive(Debug, Deserialize)]
struct LoginResponseBody {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    session: String,
}

#[derive(Debug, Deserialize)]
struct TagListBody {
    #[serde(default)]
    data: Vec<TagRecord>,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    id: String,
    attributes: TagAttributes,
}

#[derive(Debug, Deserialize)]
struct TagAttributes {
    name: std::collections::HashMap<String, String>,
    group: String,
}

pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    limiters: RateLimiters,
    session: SessionManager,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("reqwest client builds with static config");

        UpstreamClient {
            http,
            config,
            limiters: RateLimiters::default(),
            session: SessionManager::new(),
        }
    }

    /// §4.4 + §8 property 6: reject before ever issuing the request.
    pub fn check_pagination(offset: u32, limit: u32) -> Result<(), UpstreamError> {
        if offset as u64 + limit as u64 > PAGINATION_CEILING as u64 {
            return Err(UpstreamError::PaginationLimitExceeded);
        }
        Ok(())
    }

    pub async fn search(
        &self,
        params: &UpstreamSearchParams,
    ) -> Result<(Vec<MangaRecord>, u64), UpstreamError> {
        Self::check_pagination(params.offset, params.limit)?;
        let limit = params.limit.min(100);

        let query = json!({
            "title": params.title,
            "limit": limit,
            "offset": params.offset,
            "contentRating": params.content_rating,
            "status": params.status,
            "publicationDemographic": params.publication_demographic,
            "includedTags": params.included_tags,
            "excludedTags": params.excluded_tags,
            "order": { "relevance": "desc" },
            "includes": ["cover_art", "author", "artist"],
        });

        let body: SearchResponseBody = self
            .request(Method::GET, "/manga", Some(query))
            .await?;
        Ok((body.data, body.total))
    }

    pub async fn fetch_by_id(&self, upstream_id: &str) -> Result<MangaRecord, UpstreamError> {
        let path = format!("/manga/{upstream_id}");
        let body: RecordResponseBody = self.request(Method::GET, &path, None).await?;
        Ok(body.data)
    }

    /// §4.4: "Failures return an empty list rather than propagating."
    pub async fn list_tags(&self) -> Vec<Tag> {
        let body: Result<TagListBody, UpstreamError> = self.request(Method::GET, "/manga/tag", None).await;
        match body {
            Ok(body) => body
                .data
                .into_iter()
                .map(|record| Tag {
                    id: record.id,
                    name: record
                        .attributes
                        .name
                        .get("en")
                        .cloned()
                        .or_else(|| record.attributes.name.values().next().cloned())
                        .unwrap_or_default(),
                    group: record.attributes.group,
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn transform(&self, record: &MangaRecord) -> PartialManhwa {
        transform::transform(record, &self.config.base_url)
    }

    async fn login(&self) -> Result<String, UpstreamError> {
        self.limiters.check("login")?;
        let body = json!({ "username": self.config.username, "password": self.config.secret });
        let response = self
            .http
            .post(format!("{}/auth/login", self.config.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unauthorised);
        }
        let parsed: LoginResponseBody = response
            .json()
            .await
            .map_err(|e| UpstreamError::Transient(e.to_string()))?;
        Ok(parsed.token.session)
    }

    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        method: Method,
        path: &str,
        query: Option<serde_json::Value>,
    ) -> Result<T, UpstreamError> {
        let endpoint_key = if path == "/manga/random" { "random" } else { "default" };
        self.limiters.check(endpoint_key)?;

        let protected = is_protected_path(path);
        let response = self.send_once(&method, path, &query, protected).await?;

        if response.status() == StatusCode::UNAUTHORIZED && protected {
            self.session.invalidate().await;
            let retry = self.send_once(&method, path, &query, true).await?;
            return Self::parse_response(retry).await;
        }

        Self::parse_response(response).await
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &Option<serde_json::Value>,
        protected: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let mut builder = self.http.request(method.clone(), format!("{}{}", self.config.base_url, path));
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if protected {
            let token = self.session.token(|| self.login()).await?;
            builder = builder.bearer_auth(token);
        }
        builder.send().await.map_err(|e| UpstreamError::Transient(e.to_string()))
    }

    async fn parse_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, UpstreamError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::Unauthorised);
        }
        if !status.is_success() {
            let status_code = status.as_u16();
            let body: UpstreamErrorBody = response
                .json()
                .await
                .unwrap_or(UpstreamErrorBody { result: "error".into(), errors: vec![] });
            return Err(UpstreamError::from_body(status_code, &body));
        }
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Transient(e.to_string()))
    }
}
