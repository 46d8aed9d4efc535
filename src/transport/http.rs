//! Production HTTP transport over reqwest.

use std::path::Path;

use async_stream::try_stream;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::SessionAuthenticator;
use crate::config;
use crate::error::{Error, Result};
use crate::models::request::AskPayload;
use crate::transport::sse::{decode_update, SseStream};
use crate::transport::{headers, Transport, UpdateStream};

/// Talks to the WebUI endpoints with browser-simulation headers and the
/// session cookie attached to every request.
pub struct HttpTransport {
    client: reqwest::Client,
    auth: SessionAuthenticator,
    base: Url,
}

impl HttpTransport {
    /// Build a transport from a preconfigured reqwest client.
    pub fn new(client: reqwest::Client, auth: SessionAuthenticator, base: Url) -> Self {
        Self { client, auth, base }
    }

    fn base_origin(&self) -> String {
        self.base.as_str().trim_end_matches('/').to_string()
    }

    /// The web frontend hits `/search/new` before opening the SSE
    /// connection; skipping it makes the ask endpoint flaky. Warm-up
    /// failures are logged and ignored, the ask itself will surface any
    /// real problem.
    async fn warm_up(&self, query: &str) {
        let url = config::search_warmup_url(&self.base, query);
        let headers = match headers::webui_headers(&self.auth, &self.base_origin()) {
            Ok(h) => h,
            Err(_) => return,
        };
        match self.client.get(url).headers(headers).send().await {
            Ok(resp) => trace!(status = %resp.status(), "warm-up request completed"),
            Err(e) => debug!(error = %e, "warm-up request failed"),
        }
    }

    async fn open_sse(&self, payload: &AskPayload) -> Result<reqwest::Response> {
        let url = config::ask_url(&self.base);
        let headers = headers::sse_headers(&self.auth, &self.base_origin())?;

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(payload)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), message));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn ask(&self, payload: &AskPayload) -> Result<UpdateStream> {
        self.warm_up(&payload.query_str).await;

        let response = self.open_sse(payload).await?;
        debug!(model = payload.params.model_preference, "ask stream opened");

        let mut sse = SseStream::new(response.bytes_stream());
        let stream = try_stream! {
            while let Some(event) = sse.next().await {
                let event = event?;
                if let Some(update) = decode_update(&event.data)? {
                    let is_final = update.is_final;
                    yield update;
                    if is_final {
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    async fn upload(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("attachment path {path:?} has no file name")))?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| Error::AttachmentIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let content_type = guess_content_type(&filename);

        // First leg: ask the WebUI for a presigned upload target.
        let headers = headers::webui_headers(&self.auth, &self.base_origin())?;
        let response = self
            .client
            .post(config::create_upload_url(&self.base))
            .headers(headers)
            .json(&serde_json::json!({
                "filename": filename,
                "content_type": content_type,
                "source": "default",
                "file_size": bytes.len(),
                "force_image": false,
            }))
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), message));
        }

        let body: Value = response.json().await.map_err(Error::from_reqwest)?;
        let bucket_url = body
            .get("s3_bucket_url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("upload-URL response missing s3_bucket_url".into()))?
            .to_string();
        let fields = body
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Protocol("upload-URL response missing fields".into()))?;

        // Second leg: presigned multipart POST to the bucket, form fields
        // first, file part last.
        let mut form = reqwest::multipart::Form::new();
        let mut object_key = None;
        for (name, value) in fields {
            let value = value
                .as_str()
                .ok_or_else(|| Error::Protocol(format!("non-string upload field '{name}'")))?;
            if name == "key" {
                object_key = Some(value.to_string());
            }
            form = form.text(name.clone(), value.to_string());
        }
        let object_key = object_key
            .ok_or_else(|| Error::Protocol("upload-URL response missing object key".into()))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str(content_type)
            .map_err(|_| Error::Config(format!("invalid content type '{content_type}'")))?;
        form = form.part("file", part);

        let upload_response = self
            .client
            .post(&bucket_url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = upload_response.status();
        if !status.is_success() {
            warn!(%status, file = %filename, "attachment upload rejected");
            let message = upload_response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), message));
        }

        let key = object_key.replace("${filename}", &filename);
        Ok(format!("{}/{}", bucket_url.trim_end_matches('/'), key))
    }
}

/// Minimal extension-based content-type guess for the upload leg. The
/// bucket only uses it for metadata, so unknown types fall back to a
/// generic binary type.
fn guess_content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_ascii_lowercase) {
        Some(ext) => match ext.as_str() {
            "txt" | "md" => "text/plain",
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "csv" => "text/csv",
            "json" => "application/json",
            _ => "application/octet-stream",
        },
        None => "application/octet-stream",
    }
}
