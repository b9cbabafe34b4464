use crate::source::{SentimentChannel, SentimentSource, SourceError, base_asset, http_client};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

fn joined_text(title: Option<&str>, body: Option<&str>) -> Option<String> {
    let text = [title, body]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!text.is_empty()).then_some(text)
}

async fn get_json(
    client: &Client,
    url: &str,
    endpoint: &str,
    query: &[(&str, &str)],
) -> Result<Value, SourceError> {
    let response = client.get(url).query(query).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        });
    }
    Ok(response.json().await?)
}

/// CryptoPanic 응답에서 `제목 + 설명` 텍스트 추출
pub fn parse_cryptopanic(body: &Value) -> Result<Vec<String>, SourceError> {
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Decode("CryptoPanic results 없음".to_string()))?;

    Ok(results
        .iter()
        .filter_map(|post| {
            joined_text(
                post.get("title").and_then(Value::as_str),
                post.get("description").and_then(Value::as_str),
            )
        })
        .collect())
}

/// Reddit 검색 응답에서 `제목 + 본문` 텍스트 추출
pub fn parse_reddit(body: &Value) -> Result<Vec<String>, SourceError> {
    let children = body
        .pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Decode("Reddit data.children 없음".to_string()))?;

    Ok(children
        .iter()
        .filter_map(|child| {
            let data = child.get("data")?;
            joined_text(
                data.get("title").and_then(Value::as_str),
                data.get("selftext").and_then(Value::as_str),
            )
        })
        .collect())
}

/// CryptoPanic 뉴스 소스
#[derive(Debug, Clone)]
pub struct CryptoPanicSource {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl CryptoPanicSource {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(CryptoPanicSource {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        })
    }
}

#[async_trait]
impl SentimentSource for CryptoPanicSource {
    fn name(&self) -> &'static str {
        "cryptopanic"
    }

    fn channel(&self) -> SentimentChannel {
        SentimentChannel::News
    }

    async fn fetch_texts(&self, symbol: &str) -> Result<Vec<String>, SourceError> {
        let asset = base_asset(symbol).ok_or_else(|| SourceError::InvalidSymbol(symbol.to_string()))?;
        let url = format!("{}/posts/", self.base_url);

        let body = get_json(
            &self.client,
            &url,
            "/posts/",
            &[
                ("auth_token", self.auth_token.as_str()),
                ("currencies", asset),
                ("public", "true"),
            ],
        )
        .await?;

        let texts = parse_cryptopanic(&body)?;
        debug!("CryptoPanic {}: {}건", asset, texts.len());
        Ok(texts)
    }
}

/// Reddit 서브레딧 검색 소스
#[derive(Debug, Clone)]
pub struct RedditSource {
    client: Client,
    base_url: String,
    subreddit: String,
    limit: usize,
}

impl RedditSource {
    pub fn new(
        base_url: impl Into<String>,
        subreddit: impl Into<String>,
        limit: usize,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(RedditSource {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            subreddit: subreddit.into(),
            limit,
        })
    }
}

#[async_trait]
impl SentimentSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    fn channel(&self) -> SentimentChannel {
        SentimentChannel::Social
    }

    async fn fetch_texts(&self, symbol: &str) -> Result<Vec<String>, SourceError> {
        let asset = base_asset(symbol).ok_or_else(|| SourceError::InvalidSymbol(symbol.to_string()))?;
        let endpoint = format!("/r/{}/search.json", self.subreddit);
        let url = format!("{}{}", self.base_url, endpoint);
        let limit = self.limit.to_string();

        let body = get_json(
            &self.client,
            &url,
            &endpoint,
            &[
                ("q", asset),
                ("restrict_sr", "1"),
                ("sort", "new"),
                ("limit", limit.as_str()),
            ],
        )
        .await?;

        let texts = parse_reddit(&body)?;
        debug!("Reddit {}: {}건", asset, texts.len());
        Ok(texts)
    }
}
