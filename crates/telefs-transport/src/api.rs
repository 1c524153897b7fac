//! Telegram Bot API wire types and error classification.
//!
//! Only the fields telefs reads are modelled; everything else in a response
//! is ignored by `serde`.

use std::time::Duration;

use serde::Deserialize;
use telefs_types::{BlobRef, MessageDescriptor, MessageId};

use crate::error::{TransportError, TransportResult};

/// Largest `limit` accepted by `getUpdates`.
pub const MAX_UPDATES_LIMIT: usize = 100;

/// Bot API calls telefs makes. Used to pick the right error mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMethod {
    SendDocument,
    GetUpdates,
    GetFile,
    /// The plain file download from `/file/bot<token>/<path>`.
    Download,
}

impl ApiMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiMethod::SendDocument => "sendDocument",
            ApiMethod::GetUpdates => "getUpdates",
            ApiMethod::GetFile => "getFile",
            ApiMethod::Download => "download",
        }
    }
}

/// The envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<u16>,
    pub description: Option<String>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the result or translate the failure into a [`TransportError`].
    pub fn into_result(self, method: ApiMethod, status: u16) -> TransportResult<T> {
        if self.ok {
            return self.result.ok_or_else(|| {
                TransportError::InvalidResponse(format!(
                    "{}: ok response without result",
                    method.as_str()
                ))
            });
        }
        let code = self.error_code.unwrap_or(status);
        let description = self
            .description
            .unwrap_or_else(|| format!("HTTP {status}"));
        let retry_after = self
            .parameters
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs);
        Err(classify(method, code, description, retry_after))
    }
}

/// Map a failed call onto the transport error taxonomy.
pub fn classify(
    method: ApiMethod,
    code: u16,
    description: String,
    retry_after: Option<Duration>,
) -> TransportError {
    if code == 429 || retry_after.is_some() {
        return TransportError::RateLimited { retry_after };
    }
    match (method, code) {
        (_, 401) | (_, 403) => TransportError::Auth(description),
        // The Bot API answers 404 for every method when the token is unknown.
        (ApiMethod::SendDocument | ApiMethod::GetUpdates | ApiMethod::GetFile, 404) => {
            TransportError::Auth(format!("bot token not recognized: {description}"))
        }
        (ApiMethod::GetFile, 400) if !description.contains("too big") => {
            TransportError::NotFound(description)
        }
        (ApiMethod::Download, 404) => TransportError::NotFound(description),
        _ => TransportError::Api { code, description },
    }
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

impl Update {
    fn into_message(self) -> Option<Message> {
        self.channel_post.or(self.message)
    }
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
}

/// Result of `getFile`.
#[derive(Debug, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

/// Matches messages against the configured destination chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatFilter {
    Id(i64),
    Username(String),
}

impl ChatFilter {
    pub fn parse(chat_id: &str) -> Self {
        let chat_id = chat_id.trim();
        match chat_id.parse::<i64>() {
            Ok(id) => ChatFilter::Id(id),
            Err(_) => ChatFilter::Username(chat_id.trim_start_matches('@').to_lowercase()),
        }
    }

    pub fn matches(&self, chat: &Chat) -> bool {
        match self {
            ChatFilter::Id(id) => chat.id == *id,
            ChatFilter::Username(name) => chat
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name)),
        }
    }
}

impl Message {
    /// The descriptor for a document message; `None` for anything else.
    pub fn into_descriptor(self) -> Option<MessageDescriptor> {
        let document = self.document?;
        let name = document.file_name?;
        Some(MessageDescriptor::new(
            MessageId(self.message_id),
            name,
            BlobRef::new(document.file_id),
        ))
    }
}

/// Turn a `getUpdates` result into descriptors for the configured chat,
/// oldest first.
pub fn descriptors_from_updates(updates: Vec<Update>, filter: &ChatFilter) -> Vec<MessageDescriptor> {
    let mut descriptors: Vec<MessageDescriptor> = updates
        .into_iter()
        .filter_map(Update::into_message)
        .filter(|m| filter.matches(&m.chat))
        .filter_map(Message::into_descriptor)
        .collect();
    descriptors.sort_by_key(|d| d.message_id);
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: serde::de::DeserializeOwned>(json: &str) -> ApiResponse<T> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ok_response_yields_result() {
        let resp: ApiResponse<File> = parse(
            r#"{"ok":true,"result":{"file_id":"abc","file_size":5,"file_path":"documents/file_1.json"}}"#,
        );
        let file = resp.into_result(ApiMethod::GetFile, 200).unwrap();
        assert_eq!(file.file_path.as_deref(), Some("documents/file_1.json"));
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let resp: ApiResponse<File> = parse(
            r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 7","parameters":{"retry_after":7}}"#,
        );
        let err = resp.into_result(ApiMethod::SendDocument, 429).unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn unauthorized_is_auth() {
        let resp: ApiResponse<File> =
            parse(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#);
        let err = resp.into_result(ApiMethod::GetUpdates, 401).unwrap_err();
        assert!(matches!(err, TransportError::Auth(_)));
    }

    #[test]
    fn unknown_token_404_is_auth() {
        let err = classify(ApiMethod::SendDocument, 404, "Not Found".into(), None);
        assert!(matches!(err, TransportError::Auth(_)));
    }

    #[test]
    fn invalid_file_id_is_not_found() {
        let err = classify(ApiMethod::GetFile, 400, "Bad Request: invalid file_id".into(), None);
        assert!(matches!(err, TransportError::NotFound(_)));
        let err = classify(ApiMethod::GetFile, 400, "Bad Request: file is too big".into(), None);
        assert!(matches!(err, TransportError::Api { code: 400, .. }));
    }

    #[test]
    fn server_errors_are_retryable_api_errors() {
        let err = classify(ApiMethod::GetUpdates, 502, "Bad Gateway".into(), None);
        assert!(matches!(err, TransportError::Api { code: 502, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn ok_without_result_is_invalid() {
        let resp: ApiResponse<File> = parse(r#"{"ok":true}"#);
        let err = resp.into_result(ApiMethod::GetFile, 200).unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }

    #[test]
    fn chat_filter_parsing() {
        assert_eq!(ChatFilter::parse("-100123"), ChatFilter::Id(-100123));
        assert_eq!(ChatFilter::parse("@MyChannel"), ChatFilter::Username("mychannel".into()));
    }

    #[test]
    fn updates_filtered_and_sorted() {
        let json = r#"{"ok":true,"result":[
            {"update_id":10,"channel_post":{"message_id":8,"chat":{"id":-100,"username":"store"},
                "document":{"file_id":"f8","file_name":"b.txt"}}},
            {"update_id":11,"channel_post":{"message_id":5,"chat":{"id":-100},
                "document":{"file_id":"f5","file_name":"a.txt"}}},
            {"update_id":12,"message":{"message_id":9,"chat":{"id":42},
                "document":{"file_id":"x","file_name":"other.txt"}}},
            {"update_id":13,"channel_post":{"message_id":10,"chat":{"id":-100},"text":"hello"}},
            {"update_id":14,"channel_post":{"message_id":11,"chat":{"id":-100},
                "document":{"file_id":"f11"}}}
        ]}"#;
        let resp: ApiResponse<Vec<Update>> = parse(json);
        let updates = resp.into_result(ApiMethod::GetUpdates, 200).unwrap();
        let descriptors = descriptors_from_updates(updates, &ChatFilter::Id(-100));

        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(descriptors[0].message_id, MessageId(5));
        assert_eq!(descriptors[1].blob.as_str(), "f8");
    }

    #[test]
    fn username_filter_matches_case_insensitively() {
        let chat = Chat { id: 1, username: Some("Store".into()) };
        assert!(ChatFilter::parse("@store").matches(&chat));
        assert!(!ChatFilter::parse("@other").matches(&chat));
    }
}
