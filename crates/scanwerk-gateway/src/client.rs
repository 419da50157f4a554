// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing gateway client. Talks to the remote OCR / translation /
// summarization / PDF backend over HTTP:
//   - image operations upload `multipart/form-data`
//   - text operations post JSON
//
// Every call is a single request. Failures are returned to the caller as-is;
// nothing here retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use scanwerk_core::AppConfig;
use scanwerk_core::context::AuthContext;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::PageImage;
use scanwerk_document::PdfReader;

use crate::progress::{ProgressFn, UploadProgress, progress_stream};
use crate::responses::{
    Extraction, MultiExtractReply, OcrScanReply, PdfReply, SummaryReply, TableExtractReply,
    TranslateReply, Translation, parse_reply,
};

/// Paths relative to the configured base URL.
pub mod endpoints {
    pub const EXTRACT_TEXT: &str = "ocr/extract";
    pub const EXTRACT_MULTIPLE: &str = "ocr/extract-multiple";
    pub const EXTRACT_TABLES: &str = "ocr/extract-tables";
    pub const CREATE_PDF: &str = "pdf/create";
    pub const TRANSLATE: &str = "ai/translate";
    pub const SUMMARIZE: &str = "ai/summarize";
}

/// A PDF assembled by the backend, already checked to parse.
#[derive(Debug, Clone)]
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// The remote processing service as seen by the workflow.
pub trait ProcessingGateway: Send + Sync {
    /// Single-image OCR.
    fn extract_text(&self, image: &PageImage) -> impl Future<Output = Result<Extraction>> + Send;

    /// Multi-page OCR, pages in order.
    fn extract_multiple(
        &self,
        images: &[PageImage],
    ) -> impl Future<Output = Result<Extraction>> + Send;

    /// Single-image OCR with table detection.
    fn extract_with_tables(
        &self,
        image: &PageImage,
    ) -> impl Future<Output = Result<Extraction>> + Send;

    /// Assemble a PDF from page images. `progress` tracks the upload.
    fn create_pdf(
        &self,
        images: &[PageImage],
        progress: Option<ProgressFn>,
    ) -> impl Future<Output = Result<GeneratedPdf>> + Send;

    fn translate(
        &self,
        text: &str,
        target_language: &str,
        scan_id: Option<&str>,
    ) -> impl Future<Output = Result<Translation>> + Send;

    fn summarize(&self, text: &str) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP implementation of [`ProcessingGateway`] built on `reqwest`.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    text: &'a str,
    target_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan_id: Option<&'a str>,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
}

impl HttpGateway {
    /// Build a client for `config.gateway_base_url`, authenticating with the
    /// token in `auth` when one is present.
    pub fn new(config: &AppConfig, auth: &AuthContext) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScanwerkError::Network(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            token: auth.token().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode the reply envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorize(request).send().await.map_err(|e| {
            ScanwerkError::Network(format!(
                "could not reach the gateway at {}: {e}",
                self.base_url
            ))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScanwerkError::Network(format!("failed to read reply: {e}")))?;
        debug!(%status, body_len = body.len(), "gateway replied");
        parse_reply(status, &body)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.post(self.endpoint(path)).json(body);
        self.send(request).await
    }

    /// Upload `images` under form field `field`.
    async fn post_images<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &'static str,
        images: &[PageImage],
        progress: Option<ProgressFn>,
    ) -> Result<T> {
        let total = images.iter().map(PageImage::len).sum();
        let tracker = UploadProgress::new(total, progress);
        let form = image_form(field, images, &tracker)?;

        let request = self.client.post(self.endpoint(path)).multipart(form);
        let reply = self.send(request).await?;
        tracker.finish();
        Ok(reply)
    }
}

fn image_form(field: &'static str, images: &[PageImage], tracker: &Arc<UploadProgress>) -> Result<Form> {
    let mut form = Form::new();
    for image in images {
        let stream = progress_stream(image.bytes().to_vec(), Arc::clone(tracker));
        let mime = image.kind().mime_type();
        let part = Part::stream_with_length(Body::wrap_stream(stream), image.len() as u64)
            .file_name(image.file_name())
            .mime_str(mime)
            .map_err(|_| ScanwerkError::UnsupportedMediaType(mime.to_string()))?;
        form = form.part(field, part);
    }
    Ok(form)
}

/// Decode the base64 `pdf` field and make sure it parses.
///
/// A `data:application/pdf;base64,` prefix is tolerated.
pub fn decode_pdf(encoded: &str) -> Result<GeneratedPdf> {
    let payload = match encoded.find("base64,") {
        Some(pos) if encoded.starts_with("data:") => &encoded[pos + "base64,".len()..],
        _ => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanwerkError::InvalidResponse(format!("pdf is not valid base64: {e}")))?;
    let pages = PdfReader::from_bytes(&bytes)
        .map_err(|e| ScanwerkError::InvalidResponse(format!("gateway returned an unreadable PDF: {e}")))?
        .page_count();
    Ok(GeneratedPdf { bytes, pages })
}

impl ProcessingGateway for HttpGateway {
    #[instrument(skip_all, fields(page = %image.id(), bytes = image.len()))]
    async fn extract_text(&self, image: &PageImage) -> Result<Extraction> {
        let reply: OcrScanReply = self
            .post_images(endpoints::EXTRACT_TEXT, "image", std::slice::from_ref(image), None)
            .await?;
        let extraction = Extraction::from(reply);
        info!(chars = extraction.result.text.len(), "text extracted");
        Ok(extraction)
    }

    #[instrument(skip_all, fields(pages = images.len()))]
    async fn extract_multiple(&self, images: &[PageImage]) -> Result<Extraction> {
        let reply: MultiExtractReply = self
            .post_images(endpoints::EXTRACT_MULTIPLE, "images", images, None)
            .await?;
        let extraction = Extraction::from(reply);
        info!(
            pages = extraction.result.pages,
            tables = extraction.result.tables.len(),
            "multi-page text extracted"
        );
        Ok(extraction)
    }

    #[instrument(skip_all, fields(page = %image.id(), bytes = image.len()))]
    async fn extract_with_tables(&self, image: &PageImage) -> Result<Extraction> {
        let reply: TableExtractReply = self
            .post_images(endpoints::EXTRACT_TABLES, "image", std::slice::from_ref(image), None)
            .await?;
        let extraction = Extraction::from(reply);
        info!(tables = extraction.result.tables.len(), "tables extracted");
        Ok(extraction)
    }

    #[instrument(skip_all, fields(pages = images.len()))]
    async fn create_pdf(&self, images: &[PageImage], progress: Option<ProgressFn>) -> Result<GeneratedPdf> {
        let reply: PdfReply = self
            .post_images(endpoints::CREATE_PDF, "images", images, progress)
            .await?;
        let pdf = decode_pdf(&reply.pdf)?;
        info!(pages = pdf.pages, bytes = pdf.bytes.len(), "PDF received");
        Ok(pdf)
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn translate(&self, text: &str, target_language: &str, scan_id: Option<&str>) -> Result<Translation> {
        let request = TranslateRequest {
            text,
            target_language,
            scan_id,
        };
        let reply: TranslateReply = self.post_json(endpoints::TRANSLATE, &request).await?;
        Ok(reply.translation)
    }

    #[instrument(skip_all, fields(text_len = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let reply: SummaryReply = self
            .post_json(endpoints::SUMMARIZE, &SummarizeRequest { text })
            .await?;
        Ok(reply.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::types::ImageKind;
    use scanwerk_document::PdfWriter;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Accept one request, answer with `status_line` and `body`, and hand
    /// back the request head.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = find(&buf, b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap());
            match content_length {
                Some(len) => {
                    while buf.len() < header_end + len {
                        let n = socket.read(&mut chunk).await.unwrap();
                        assert!(n > 0, "client closed before body");
                        buf.extend_from_slice(&chunk[..n]);
                    }
                }
                None if head.contains("transfer-encoding: chunked") => {
                    while !buf.ends_with(b"0\r\n\r\n") {
                        let n = socket.read(&mut chunk).await.unwrap();
                        assert!(n > 0, "client closed before last chunk");
                        buf.extend_from_slice(&chunk[..n]);
                    }
                }
                None => {}
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            head
        });
        (format!("http://{addr}/api/"), handle)
    }

    fn gateway(base_url: String, token: Option<&str>) -> HttpGateway {
        let config = AppConfig {
            gateway_base_url: base_url,
            request_timeout_secs: 10,
            ..AppConfig::default()
        };
        HttpGateway::new(&config, &AuthContext::in_memory(token.map(str::to_string))).unwrap()
    }

    fn page(len: usize) -> PageImage {
        PageImage::new(vec![0xAB; len], ImageKind::Jpeg)
    }

    #[test]
    fn endpoints_join_without_double_slash() {
        let gw = gateway("http://localhost:5000/api/".into(), None);
        assert_eq!(gw.base_url(), "http://localhost:5000/api");
        assert_eq!(gw.endpoint(endpoints::SUMMARIZE), "http://localhost:5000/api/ai/summarize");
    }

    #[test]
    fn decode_pdf_accepts_data_url() {
        let pdf = PdfWriter::a4().create_from_text("hello").unwrap();
        let encoded = format!("data:application/pdf;base64,{}", STANDARD.encode(&pdf));
        let decoded = decode_pdf(&encoded).unwrap();
        assert_eq!(decoded.bytes, pdf);
        assert_eq!(decoded.pages, 1);
    }

    #[test]
    fn decode_pdf_rejects_non_pdf() {
        let encoded = STANDARD.encode(b"<html>oops</html>");
        assert!(matches!(decode_pdf(&encoded), Err(ScanwerkError::InvalidResponse(_))));
        assert!(matches!(decode_pdf("%%%"), Err(ScanwerkError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn summarize_sends_bearer_token() {
        let (url, server) = serve_once("200 OK", r#"{"success":true,"summary":"short"}"#.into()).await;
        let gw = gateway(url, Some("secret-token"));

        let summary = gw.summarize("a long text").await.unwrap();
        assert_eq!(summary, "short");

        let head = server.await.unwrap();
        assert!(head.starts_with("post /api/ai/summarize"));
        assert!(head.contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn extract_text_uploads_multipart() {
        let body = r#"{"success":true,"scan":{"id":"s1","ocr":{"text":"Invoice","confidence":97}}}"#;
        let (url, server) = serve_once("200 OK", body.into()).await;
        let gw = gateway(url, None);

        let extraction = gw.extract_text(&page(1024)).await.unwrap();
        assert_eq!(extraction.result.text, "Invoice");
        assert_eq!(extraction.scan_id.as_deref(), Some("s1"));

        let head = server.await.unwrap();
        assert!(head.starts_with("post /api/ocr/extract"));
        assert!(head.contains("content-type: multipart/form-data"));
        assert!(!head.contains("authorization"));
    }

    #[tokio::test]
    async fn create_pdf_reports_progress_to_100() {
        let pdf = PdfWriter::a4().create_from_text("page").unwrap();
        let body = format!(r#"{{"success":true,"pdf":"{}"}}"#, STANDARD.encode(&pdf));
        let (url, server) = serve_once("200 OK", body).await;
        let gw = gateway(url, None);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |p: u8| sink.lock().unwrap().push(p));

        let result = gw
            .create_pdf(&[page(200_000), page(50_000)], Some(progress))
            .await
            .unwrap();
        assert_eq!(result.pages, 1);
        server.await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn business_error_is_surfaced_verbatim() {
        let body = r#"{"success":false,"message":"Daily scan limit reached"}"#;
        let (url, server) = serve_once("429 Too Many Requests", body.into()).await;
        let gw = gateway(url, None);

        let err = gw.translate("hola", "en", None).await.unwrap_err();
        assert!(matches!(err, ScanwerkError::Gateway { message } if message == "Daily scan limit reached"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_gateway_is_network_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = gateway(format!("http://{addr}/api"), None);
        let err = gw.summarize("text").await.unwrap_err();
        assert!(matches!(err, ScanwerkError::Network(_)));
    }
}
