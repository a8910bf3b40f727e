//! Web search adapters

use crate::config::{Config, WebSearchProvider};
use crate::error::{RagRouteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const DUCKDUCKGO_ENDPOINT: &str = "https://api.duckduckgo.com/";
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// One web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search returning text ready to show to a user
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search and format the results; an empty result set is an error
    async fn search(&self, query: &str) -> Result<String>;

    fn provider_name(&self) -> &str;
}

/// Render results as a numbered list under a header
pub fn format_results(results: &[SearchResult]) -> String {
    let mut out = String::from("Web search results:\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   {}\n", i + 1, result.title, result.url));
        if !result.snippet.is_empty() && result.snippet != result.title {
            out.push_str(&format!("   {}\n", result.snippet));
        }
    }
    out.trim_end().to_string()
}

fn finish(provider: &str, query: &str, results: Vec<SearchResult>) -> Result<String> {
    if results.is_empty() {
        return Err(RagRouteError::NoResults(format!(
            "{} returned nothing for \"{}\"",
            provider, query
        )));
    }
    tracing::debug!("{} returned {} results", provider, results.len());
    Ok(format_results(&results))
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(RagRouteError::Http)
}

/// DuckDuckGo Instant Answer API (no key)
///
/// Only encyclopedic abstracts and related topics come back; most other
/// questions yield no results. [`TavilySearch`] returns regular search hits.
pub struct DuckDuckGoSearch {
    http_client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(max_results: usize, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http_client: http_client(timeout_secs)?,
            endpoint: DUCKDUCKGO_ENDPOINT.to_string(),
            max_results,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagRouteError::from_response("DuckDuckGo", response).await);
        }

        let payload: Value = response.json().await?;
        let mut results = Vec::new();

        let abstract_text = payload["AbstractText"].as_str().unwrap_or("");
        let abstract_url = payload["AbstractURL"].as_str().unwrap_or("");
        if !abstract_text.is_empty() && !abstract_url.is_empty() {
            let heading = payload["Heading"].as_str().unwrap_or("");
            results.push(SearchResult {
                title: if heading.is_empty() {
                    title_of(abstract_text)
                } else {
                    heading.to_string()
                },
                url: abstract_url.to_string(),
                snippet: abstract_text.to_string(),
            });
        }

        for field in ["Results", "RelatedTopics"] {
            if let Some(items) = payload[field].as_array() {
                extract_topics(items, &mut results);
            }
        }

        results.truncate(self.max_results);
        Ok(results)
    }
}

fn title_of(text: &str) -> String {
    text.split(" - ").next().unwrap_or(text).to_string()
}

/// Flatten DuckDuckGo topic lists, which may nest under `Topics`
fn extract_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item["Topics"].as_array() {
            extract_topics(topics, results);
            continue;
        }
        let text = item["Text"].as_str().unwrap_or("");
        let url = item["FirstURL"].as_str().unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: title_of(text),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<String> {
        let results = self.fetch(query).await?;
        finish("DuckDuckGo", query, results)
    }

    fn provider_name(&self) -> &str {
        "duckduckgo"
    }
}

/// Tavily search API
pub struct TavilySearch {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, max_results: usize, timeout_secs: u64) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagRouteError::Config(
                "TAVILY_API_KEY is required for Tavily search".to_string(),
            ));
        }
        Ok(Self {
            http_client: http_client(timeout_secs)?,
            endpoint: TAVILY_ENDPOINT.to_string(),
            api_key,
            max_results,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": self.max_results,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagRouteError::from_response("Tavily", response).await);
        }

        let body: TavilyResponse = response.json().await?;
        let results = body
            .results
            .into_iter()
            .filter(|hit| !hit.url.is_empty())
            .take(self.max_results)
            .map(|hit| SearchResult {
                title: if hit.title.is_empty() {
                    hit.url.clone()
                } else {
                    hit.title
                },
                url: hit.url,
                snippet: hit.content,
            })
            .collect();

        finish("Tavily", query, results)
    }

    fn provider_name(&self) -> &str {
        "tavily"
    }
}

/// Build the provider selected by the configuration
pub fn web_search_from_config(config: &Config) -> Result<Arc<dyn WebSearch>> {
    let settings = &config.web_search;
    match settings.provider {
        WebSearchProvider::DuckDuckGo => Ok(Arc::new(DuckDuckGoSearch::new(
            settings.max_results,
            config.timeout_secs,
        )?)),
        WebSearchProvider::Tavily => {
            let api_key = settings.tavily_api_key.clone().ok_or_else(|| {
                RagRouteError::Config("TAVILY_API_KEY is required for Tavily search".to_string())
            })?;
            Ok(Arc::new(TavilySearch::new(
                api_key,
                settings.max_results,
                config.timeout_secs,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_format_results() {
        let text = format_results(&[
            SearchResult {
                title: "Rust".into(),
                url: "https://rust-lang.org".into(),
                snippet: "A systems language".into(),
            },
            SearchResult {
                title: "Cargo".into(),
                url: "https://doc.rust-lang.org/cargo".into(),
                snippet: "Cargo".into(),
            },
        ]);
        assert_eq!(
            text,
            "Web search results:\n\
             1. Rust\n   https://rust-lang.org\n   A systems language\n\
             2. Cargo\n   https://doc.rust-lang.org/cargo"
        );
    }

    #[tokio::test]
    async fn test_duckduckgo_flattens_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Heading": "Rust",
                "AbstractText": "Rust is a programming language.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
                "Results": [],
                "RelatedTopics": [
                    {"Text": "Cargo - Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                    {"Name": "See also", "Topics": [
                        {"Text": "Ferris - mascot", "FirstURL": "https://duckduckgo.com/Ferris"}
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(5, 5)
            .unwrap()
            .with_endpoint(format!("{}/", server.uri()));
        let text = search.search("rust language").await.unwrap();

        assert!(text.starts_with("Web search results:\n1. Rust"));
        assert!(text.contains("2. Cargo\n   https://duckduckgo.com/Cargo"));
        assert!(text.contains("3. Ferris"));
    }

    #[tokio::test]
    async fn test_duckduckgo_empty_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AbstractText": "",
                "RelatedTopics": []
            })))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(5, 5).unwrap().with_endpoint(server.uri());
        let err = search.search("nothing").await.unwrap_err();
        assert!(matches!(err, RagRouteError::NoResults(_)));
    }

    #[tokio::test]
    async fn test_tavily_request_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({
                "api_key": "tvly-key",
                "query": "q3 revenue",
                "max_results": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"title": "A", "url": "https://a.example", "content": "alpha"},
                    {"title": "B", "url": "https://b.example", "content": "beta"},
                    {"title": "C", "url": "https://c.example", "content": "gamma"}
                ]
            })))
            .mount(&server)
            .await;

        let search = TavilySearch::new("tvly-key", 2, 5)
            .unwrap()
            .with_endpoint(format!("{}/search", server.uri()));
        let text = search.search("q3 revenue").await.unwrap();
        assert!(text.contains("2. B"));
        assert!(!text.contains("3. C"));
    }

    #[test]
    fn test_tavily_requires_key() {
        assert!(TavilySearch::new("", 5, 5).is_err());

        let mut config = Config::default();
        config.web_search.provider = WebSearchProvider::Tavily;
        assert!(web_search_from_config(&config).is_err());
    }
}
