use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Method as HttpMethod, RequestBuilder};
use serde_json::Value;

use crate::client::{AuthStore, Backend, ListRequest};
use crate::config::{normalize_base_url, AppConfig};
use crate::error::AdminError;
use crate::model::{
    is_missing_id, read_ack, read_envelope, read_list, Ack, AdminProfile, FormField, ListPage,
    LoginRequest, LoginResponse, Method, MutationIntent, Payload, UserRecord,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest transport that attaches the bearer token to every call
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    auth: Arc<dyn AuthStore>,
}

impl HttpBackend {
    pub fn new(base_url: &str, auth: Arc<dyn AuthStore>) -> Result<Self, AdminError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
            http: reqwest::Client::new(),
            auth,
        })
    }

    pub fn from_config(config: &AppConfig, auth: Arc<dyn AuthStore>) -> Result<Self, AdminError> {
        let mut backend = Self::new(&config.api_base_url()?, auth)?;
        backend.timeout = config.api_timeout();
        Ok(backend)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        let trimmed = path.trim();
        if trimmed.starts_with('/') {
            format!("{}{}", self.base_url, trimmed)
        } else {
            format!("{}/{}", self.base_url, trimmed)
        }
    }

    fn authorized(&self, method: HttpMethod, path: &str) -> Result<RequestBuilder, AdminError> {
        let token = self.auth.token().ok_or(AdminError::Unauthenticated)?;
        Ok(self
            .http
            .request(method, self.endpoint(path))
            .timeout(self.timeout)
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token))
    }

    /// Exchange credentials for a token and keep it in the auth store
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminProfile, AdminError> {
        let credentials = LoginRequest::new(email, password);
        credentials.validate()?;

        let request = self
            .http
            .post(self.endpoint("/login"))
            .timeout(self.timeout)
            .json(&credentials);

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);

        let rejected = status == 401
            || body.get("success").and_then(Value::as_bool) == Some(false);
        if rejected {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .unwrap_or("Login failed.");
            return Err(AdminError::backend(Some(status), message));
        }
        let body = read_envelope(status, body)?;

        let session: LoginResponse = serde_json::from_value(body)
            .map_err(|error| AdminError::transport(error.to_string()))?;
        self.auth.set_token(&session.token);
        debug!("logged in as {}", session.user.email);
        Ok(session.user)
    }

    pub fn logout(&self) {
        self.auth.clear_token();
    }

    pub async fn user_details(&self, user_id: &str) -> Result<UserRecord, AdminError> {
        if is_missing_id(user_id) {
            return Err(AdminError::validation("User ID is required."));
        }
        let path = format!("/getUserById/{}", user_id.trim());
        let mut body = send(self.authorized(HttpMethod::GET, &path)?).await?;
        let data = body.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|error| AdminError::transport(error.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list(&self, request: &ListRequest) -> Result<ListPage<Value>, AdminError> {
        debug!("GET {} {:?}", request.path, request.query_pairs());
        let builder = self
            .authorized(HttpMethod::GET, &request.path)?
            .query(&request.query_pairs());
        let body = send(builder).await?;
        read_list(body, request.page, request.limit)
    }

    async fn mutate(&self, intent: &MutationIntent) -> Result<Ack, AdminError> {
        let method = match intent.route.method {
            Method::Post => HttpMethod::POST,
            Method::Put => HttpMethod::PUT,
            Method::Patch => HttpMethod::PATCH,
            Method::Delete => HttpMethod::DELETE,
        };
        debug!("{} {}", method, intent.route.path);

        let builder = self.authorized(method, &intent.route.path)?;
        let builder = match &intent.payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Multipart(fields) => builder.multipart(multipart_form(fields)?),
        };
        let body = send(builder).await?;
        Ok(read_ack(body))
    }
}

fn multipart_form(fields: &[FormField]) -> Result<Form, AdminError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, upload } => {
                let part = Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.content_type)
                    .map_err(|_| {
                        AdminError::validation(format!(
                            "Unsupported file type: {}",
                            upload.content_type
                        ))
                    })?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

async fn send(request: RequestBuilder) -> Result<Value, AdminError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(body) => read_envelope(status, body),
        Err(_) if status == 401 => Err(AdminError::Unauthenticated),
        Err(error) => {
            warn!("non-JSON response ({}): {}", status, error);
            Err(AdminError::transport(format!(
                "non-JSON response with status {status}"
            )))
        }
    }
}
