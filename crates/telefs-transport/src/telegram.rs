//! [`ChannelTransport`] over the Telegram Bot API.
//!
//! - uploads use `sendDocument` (multipart `chat_id` + `document`)
//! - history scans use `getUpdates` with a negative offset, which returns the
//!   last `limit` updates; the Bot API then forgets every update older than
//!   that tail, so history beyond the window is gone for good
//! - downloads use `getFile` followed by a GET on `/file/bot<token>/<path>`
//!
//! The Bot API keeps undelivered updates for 24 hours and returns at most
//! [`MAX_UPDATES_LIMIT`] per call, so larger scan windows are clamped. A bot
//! only sees channel posts it did not send itself when another client posts;
//! run telefs against a chat where the bot receives its own channel posts
//! (for example through a linked discussion group) or accept that history
//! only covers what the Bot API reports.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use telefs_types::{BlobRef, MessageDescriptor};
use tracing::debug;

use crate::api::{self, ApiMethod, ApiResponse, ChatFilter, Message, Update, MAX_UPDATES_LIMIT};
use crate::config::TelegramConfig;
use crate::context::OpContext;
use crate::error::{TransportError, TransportResult};
use crate::traits::{ChannelTransport, ScanResult};

const ALLOWED_UPDATES: &str = r#"["message","channel_post"]"#;

/// Telegram Bot API client.
pub struct TelegramTransport {
    http: Client,
    config: TelegramConfig,
    filter: ChatFilter,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> TransportResult<Self> {
        if !config.has_credentials() {
            return Err(TransportError::Auth(
                "bot token and chat id must both be set".into(),
            ));
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TransportError::from)?;
        let filter = ChatFilter::parse(&config.chat_id);
        Ok(Self {
            http,
            config,
            filter,
        })
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    fn method_url(&self, method: ApiMethod) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base,
            self.config.bot_token,
            method.as_str()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_base, self.config.bot_token, file_path
        )
    }

    /// Send a Bot API request and unwrap its envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: ApiMethod,
        request: RequestBuilder,
    ) -> TransportResult<T> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        let envelope: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if status != 200 => {
                return Err(api::classify(
                    method,
                    status,
                    format!("HTTP {status}"),
                    None,
                ))
            }
            Err(e) => {
                return Err(TransportError::InvalidResponse(format!(
                    "{}: {e}",
                    method.as_str()
                )))
            }
        };
        envelope.into_result(method, status)
    }

    async fn send_document(&self, name: &str, bytes: &[u8]) -> TransportResult<MessageDescriptor> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("document", part);
        let request = self
            .http
            .post(self.method_url(ApiMethod::SendDocument))
            .multipart(form);

        let message: Message = self.call(ApiMethod::SendDocument, request).await?;
        let message_id = message.message_id;
        let mut descriptor = message.into_descriptor().ok_or_else(|| {
            TransportError::InvalidResponse(format!(
                "sendDocument: message {message_id} carries no named document"
            ))
        })?;
        // Catalog lookups match on the declared name, so keep the one we sent.
        descriptor.name = name.to_string();
        Ok(descriptor)
    }

    /// The window counts as truncated when the raw update list filled the
    /// clamped limit, before non-document posts and other chats are dropped.
    async fn get_updates(&self, limit: usize) -> TransportResult<ScanResult> {
        let limit = limit.clamp(1, MAX_UPDATES_LIMIT);
        let offset = -(limit as i64);
        let request = self.http.get(self.method_url(ApiMethod::GetUpdates)).query(&[
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
            ("allowed_updates", ALLOWED_UPDATES.to_string()),
        ]);
        let updates: Vec<Update> = self.call(ApiMethod::GetUpdates, request).await?;
        let truncated = updates.len() >= limit;
        Ok(ScanResult::new(
            api::descriptors_from_updates(updates, &self.filter),
            truncated,
        ))
    }

    async fn fetch_file(&self, blob: &BlobRef) -> TransportResult<Vec<u8>> {
        let request = self
            .http
            .get(self.method_url(ApiMethod::GetFile))
            .query(&[("file_id", blob.as_str())]);
        let file: api::File = self.call(ApiMethod::GetFile, request).await?;
        let path = file.file_path.ok_or_else(|| {
            TransportError::NotFound(format!("blob {} has no downloadable path", blob.short()))
        })?;

        let response = self.http.get(self.file_url(&path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api::classify(
                ApiMethod::Download,
                status.as_u16(),
                format!("download of {} failed: HTTP {}", blob.short(), status.as_u16()),
                None,
            ));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl ChannelTransport for TelegramTransport {
    async fn upload_blob(
        &self,
        ctx: &OpContext,
        name: &str,
        bytes: &[u8],
    ) -> TransportResult<MessageDescriptor> {
        debug!(name, size = bytes.len(), "sendDocument");
        let descriptor = ctx.run(self.send_document(name, bytes)).await?;
        debug!(name, message_id = %descriptor.message_id, "document sent");
        Ok(descriptor)
    }

    async fn scan_recent(&self, ctx: &OpContext, limit: usize) -> TransportResult<ScanResult> {
        if limit > MAX_UPDATES_LIMIT {
            debug!(limit, max = MAX_UPDATES_LIMIT, "scan window clamped by getUpdates");
        }
        let scan = ctx.run(self.get_updates(limit)).await?;
        debug!(found = scan.descriptors.len(), truncated = scan.truncated, "getUpdates");
        Ok(scan)
    }

    async fn download_blob(&self, ctx: &OpContext, blob: &BlobRef) -> TransportResult<Vec<u8>> {
        debug!(blob = blob.short(), "getFile");
        ctx.run(self.fetch_file(blob)).await
    }
}
