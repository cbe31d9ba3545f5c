//! HTTP probe: one request, one classified outcome
//!
//! A probe never returns an error. Transport faults, unexpected status codes
//! and failed body assertions all become a `FAIL` outcome in the recorder,
//! and the caller gets an [`Exchange`] it can mine for ids and tokens.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::recorder::{CheckOutcome, Recorder, Verdict};

/// Statuses that designate a server-side refusal (bad request, forbidden)
pub const REJECTION_STATUSES: [u16; 2] = [400, 403];

/// Request payload
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

/// Text fields plus an optional file part
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(file) = self.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// Description of a single API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    template: String,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Body,
    bearer: Option<String>,
    timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            path_params: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
            bearer: None,
            timeout: None,
        }
    }

    pub fn get(template: impl Into<String>) -> Self {
        Self::new(Method::GET, template)
    }

    pub fn post(template: impl Into<String>) -> Self {
        Self::new(Method::POST, template)
    }

    pub fn put(template: impl Into<String>) -> Self {
        Self::new(Method::PUT, template)
    }

    pub fn delete(template: impl Into<String>) -> Self {
        Self::new(Method::DELETE, template)
    }

    /// Bind a `{name}` placeholder in the path template
    pub fn path_param(mut self, name: &str, value: impl ToString) -> Self {
        self.path_params.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter; values are passed through unmodified
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// `page` and `size` query parameters
    pub fn page(self, page: u32, size: u32) -> Self {
        self.query("page", page).query("size", size)
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Body::Multipart(body);
        self
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Interpolate path parameters into the template.
    ///
    /// Values are percent-encoded. A placeholder left unbound is an error.
    pub fn path(&self) -> Result<String, String> {
        let mut path = self.template.clone();
        for (name, value) in &self.path_params {
            path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
        }
        if let Some(start) = path.find('{') {
            let end = path[start..].find('}').map_or(path.len(), |i| start + i + 1);
            return Err(format!("unbound path parameter {}", &path[start..end]));
        }
        Ok(path)
    }
}

/// Which status codes count as the expected outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expect {
    statuses: Vec<u16>,
    rejection: bool,
}

impl Expect {
    /// 200 only
    pub fn ok() -> Self {
        Self::any_of(&[200])
    }

    /// 200 or 201
    pub fn created() -> Self {
        Self::any_of(&[200, 201])
    }

    pub fn any_of(statuses: &[u16]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            rejection: false,
        }
    }

    /// The call must be refused; a success status is a failure
    pub fn rejected() -> Self {
        Self {
            statuses: REJECTION_STATUSES.to_vec(),
            rejection: true,
        }
    }

    pub fn matches(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status.as_u16())
    }

    fn describe(&self) -> String {
        self.statuses
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// What came back from one probe, plus the verdict already recorded for it
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: Option<StatusCode>,
    pub body: Option<Value>,
    pub text: String,
    pub verdict: Verdict,
    pub detail: String,
}

impl Exchange {
    fn transport_failure(detail: String) -> Self {
        Self {
            status: None,
            body: None,
            text: String::new(),
            verdict: Verdict::Fail,
            detail,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// `Status: <code>` for detail messages
    pub fn status_detail(&self) -> String {
        match self.status {
            Some(status) => format!("Status: {}", status.as_u16()),
            None => "no response".to_string(),
        }
    }

    /// Value at a JSON pointer (`/user/username`), if the body parsed
    pub fn json(&self, pointer: &str) -> Option<&Value> {
        self.body.as_ref()?.pointer(pointer)
    }

    pub fn json_str(&self, pointer: &str) -> Option<String> {
        self.json(pointer)?.as_str().map(str::to_string)
    }

    pub fn json_i64(&self, pointer: &str) -> Option<i64> {
        self.json(pointer)?.as_i64()
    }

    pub fn json_bool(&self, pointer: &str) -> Option<bool> {
        self.json(pointer)?.as_bool()
    }

    /// Items of a paged response (`content`), or of a bare JSON array
    pub fn items(&self) -> &[Value] {
        let list = match self.body.as_ref() {
            Some(Value::Array(items)) => Some(items),
            Some(body) => body.get("content").and_then(Value::as_array),
            None => None,
        };
        list.map(Vec::as_slice).unwrap_or(&[])
    }

    /// `totalElements` of a paged response
    pub fn total_elements(&self) -> Option<u64> {
        self.json("/totalElements")?.as_u64()
    }

    /// True when any listed item has the given `id`
    pub fn contains_id(&self, id: i64) -> bool {
        self.items()
            .iter()
            .any(|item| item.get("id").and_then(Value::as_i64) == Some(id))
    }
}

/// Thin wrapper over a shared HTTP client bound to the backend's base URL
#[derive(Debug, Clone)]
pub struct Probe {
    client: Client,
    base_url: String,
}

impl Probe {
    pub fn new(config: &HarnessConfig) -> E2eResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a status-only check and record it
    pub async fn check(
        &self,
        recorder: &mut Recorder,
        name: &str,
        request: ApiRequest,
        expect: Expect,
    ) -> Exchange {
        self.check_with(recorder, name, request, expect, |ex| Ok(ex.status_detail()))
            .await
    }

    /// Run a check whose body is inspected once the status matched.
    ///
    /// `assess` returns `Ok(detail)` to pass or `Err(detail)` to fail; it is
    /// not called for transport faults or status mismatches.
    pub async fn check_with<F>(
        &self,
        recorder: &mut Recorder,
        name: &str,
        request: ApiRequest,
        expect: Expect,
        assess: F,
    ) -> Exchange
    where
        F: FnOnce(&Exchange) -> Result<String, String>,
    {
        let exchange = self.exchange(request, &expect, assess).await;
        recorder.record(CheckOutcome::new(name, exchange.verdict, exchange.detail.clone()));
        exchange
    }

    async fn exchange<F>(&self, request: ApiRequest, expect: &Expect, assess: F) -> Exchange
    where
        F: FnOnce(&Exchange) -> Result<String, String>,
    {
        let (status, text) = match self.send(request).await {
            Ok(response) => response,
            Err(detail) => return Exchange::transport_failure(detail),
        };

        let mut exchange = Exchange {
            status: Some(status),
            body: serde_json::from_str(&text).ok(),
            text,
            verdict: Verdict::Fail,
            detail: String::new(),
        };

        if !expect.matches(status) {
            exchange.detail = if expect.rejection {
                format!("Status: {} (expected {})", status.as_u16(), expect.describe())
            } else {
                format!("Status: {}, Body: {}", status.as_u16(), exchange.text)
            };
            return exchange;
        }

        match assess(&exchange) {
            Ok(detail) => {
                exchange.verdict = Verdict::Pass;
                exchange.detail = if expect.rejection {
                    format!("Status: {} (expected {})", status.as_u16(), expect.describe())
                } else {
                    detail
                };
            }
            Err(detail) => exchange.detail = detail,
        }
        exchange
    }

    /// Issue exactly one request. Any transport-level fault comes back as text.
    async fn send(&self, request: ApiRequest) -> Result<(StatusCode, String), String> {
        let path = request.path()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(body) => builder.multipart(body.into_form().map_err(|e| e.to_string())?),
        };

        let response = builder.send().await.map_err(|e| describe_transport(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("unreadable response body: {e}"))?;
        debug!(%url, status = status.as_u16(), "response received");
        Ok((status, text))
    }
}

fn describe_transport(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
