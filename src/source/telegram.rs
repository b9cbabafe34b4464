use crate::model::RecipientId;
use crate::source::{Notifier, NotifyError, http_client};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<Option<T>, NotifyError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(NotifyError::Api(
                self.description
                    .unwrap_or_else(|| "알 수 없는 오류".to_string()),
            ))
        }
    }
}

/// getUpdates로 받은 업데이트
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// 텍스트 메시지라면 (보낸 채팅방, 본문)
    pub fn text_message(&self) -> Option<(RecipientId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((RecipientId(message.chat.id), text))
    }
}

/// 텔레그램 봇 API 클라이언트
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, NotifyError> {
        Ok(TelegramNotifier {
            client: http_client(request_timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<Option<T>, NotifyError> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let parsed: ApiResponse<T> = response.json().await?;
        parsed.into_result()
    }

    /// 롱 폴링으로 새 업데이트 조회
    ///
    /// # Arguments
    /// * `offset` - 이미 처리한 마지막 update_id + 1
    /// * `poll_timeout` - 서버가 업데이트를 기다리는 최대 시간
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, NotifyError> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });

        let updates = self
            .call::<Vec<Update>>("getUpdates", body, poll_timeout + self.request_timeout)
            .await?
            .unwrap_or_default();

        if !updates.is_empty() {
            debug!("텔레그램 업데이트 {}건 수신", updates.len());
        }
        Ok(updates)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
        let body = json!({
            "chat_id": recipient.0,
            "text": text,
        });

        self.call::<serde_json::Value>("sendMessage", body, self.request_timeout)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!("메시지 전송 실패 ({}): {}", recipient, e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updates() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"chat": {"id": 42}, "text": "/monitor"}},
                {"update_id": 11, "message": {"chat": {"id": 42}}},
                {"update_id": 12}
            ]
        }"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = parsed.into_result().unwrap().unwrap();

        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].text_message(), Some((RecipientId(42), "/monitor")));
        assert_eq!(updates[1].text_message(), None);
        assert_eq!(updates[2].text_message(), None);
    }

    #[test]
    fn test_api_error_is_surfaced() {
        let raw = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
        let parsed: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        match parsed.into_result() {
            Err(NotifyError::Api(msg)) => assert!(msg.contains("chat not found")),
            other => panic!("API 오류가 나와야 함: {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_token() {
        let notifier =
            TelegramNotifier::new("https://api.telegram.org", "123:secret", Duration::from_secs(5))
                .unwrap();
        assert!(!format!("{:?}", notifier).contains("secret"));
        assert!(notifier.method_url("sendMessage").ends_with("/bot123:secret/sendMessage"));
    }
}
