use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use serde_json::Value;

use super::{SearchProvider, SearchResult};
use crate::config::SearchConfig;
use crate::{Result, SongdlError};

const INITIAL_DATA_MARKER: &str = "ytInitialData";

/// YouTube search by scraping the results page
pub struct YoutubeSearch {
    client: Client,
    results_url: String,
}

impl YoutubeSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            results_url: config.results_url.clone(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?search_query={}",
            self.results_url,
            urlencoding::encode(query)
        )
    }

    /// Fetch the raw results page for a query
    async fn fetch_page(&self, query: &str) -> Result<String> {
        let url = self.search_url(query);
        tracing::debug!("Fetching search page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SongdlError::SearchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SongdlError::SearchFailed(format!("HTTP {}", response.status())).into());
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchProvider for YoutubeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let page = self.fetch_page(query).await?;
        let results = parse_results(&page)?;

        tracing::debug!("Search for {:?} returned {} videos", query, results.len());
        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "YouTube"
    }
}

/// Extract every video hit from a results page, in page order
pub fn parse_results(page: &str) -> Result<Vec<SearchResult>> {
    let data = extract_initial_data(page)?;

    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .ok_or_else(|| SongdlError::SearchFailed("unexpected search page layout".to_string()))?;

    let results = sections
        .iter()
        .filter_map(|section| section["itemSectionRenderer"]["contents"].as_array())
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .filter_map(video_from_renderer)
        .collect();

    Ok(results)
}

/// Cut the `ytInitialData` JSON document out of the page's inline script
fn extract_initial_data(page: &str) -> Result<Value> {
    let missing = || SongdlError::SearchFailed("search page has no ytInitialData".to_string());

    let marker = page.find(INITIAL_DATA_MARKER).ok_or_else(missing)?;
    let after_marker = marker + INITIAL_DATA_MARKER.len();
    let start = after_marker + page[after_marker..].find('{').ok_or_else(missing)?;
    let end = start + page[start..].find("};").ok_or_else(missing)? + 1;

    let data: Value = serde_json::from_str(&page[start..end])
        .map_err(|e| SongdlError::SearchFailed(format!("malformed ytInitialData: {}", e)))?;

    Ok(data)
}

fn video_from_renderer(video: &Value) -> Option<SearchResult> {
    let id = video["videoId"].as_str()?.to_string();

    let text = |field: &str| -> Option<String> {
        video[field]["simpleText"]
            .as_str()
            .or_else(|| video[field]["runs"][0]["text"].as_str())
            .map(|s| s.to_string())
    };

    let url_suffix = video
        .pointer("/navigationEndpoint/commandMetadata/webCommandMetadata/url")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("/watch?v={}", id));

    Some(SearchResult {
        title: text("title"),
        channel: text("longBylineText"),
        duration: text("lengthText"),
        views: text("viewCountText"),
        url_suffix,
        id,
    })
}
