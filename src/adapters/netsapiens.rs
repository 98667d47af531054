//! NetSapiens UCaaS adapter.
//!
//! Implements the [`VoipAdapter`] contract against the NetSapiens REST API:
//! OAuth 2.0 token acquisition with lazy refresh, request construction, and
//! bidirectional translation between NetSapiens JSON shapes (subscribers,
//! devices, calls) and the universal schema.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use async_trait::async_trait;

use crate::error::{AdapterError, AdapterResult, ErrorCode};
use crate::models::{
    CallDirection, CallPage, CallStatus, DeviceCreate, DevicePage, DeviceStatus, DeviceType,
    Page, ProviderMetadata, TransferRequest, UserCreate, UserPage, UserStatus, UserUpdate,
    VoipCall, VoipDevice, VoipUser,
};

use super::traits::{AdapterConfig, VoipAdapter};

/// Longest slice of an unparseable response body carried in a PARSE_ERROR.
/// Bounds audit/log size; the full body is never preserved for parse
/// failures.
const BODY_PREVIEW_LIMIT: usize = 256;

/// Cached OAuth state. Guarded by an async mutex so that concurrent
/// operations observing an expired token serialize on a single refresh
/// instead of racing (single-flight).
#[derive(Debug)]
struct AuthState {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    /// Tenant domain. Seeded from local config; the vendor's token response
    /// may carry the true tenant name and overrides this value.
    domain: String,
}

/// Adapter for the NetSapiens UCaaS platform.
///
/// NetSapiens uses OAuth 2.0 (client_credentials or password grants), a
/// JSON REST API, and its own terminology: subscribers (users), devices,
/// domains (tenants).
#[derive(Debug)]
pub struct NetSapiensAdapter {
    config: AdapterConfig,
    client: StdMutex<Option<Client>>,
    auth: Mutex<AuthState>,
}

impl NetSapiensAdapter {
    pub const PROVIDER_TYPE: &'static str = "netsapiens";
    pub const PROVIDER_NAME: &'static str = "NetSapiens";

    pub fn new(config: AdapterConfig) -> Self {
        let domain = config.config.get("domain").cloned().unwrap_or_default();
        Self {
            config,
            client: StdMutex::new(None),
            auth: Mutex::new(AuthState {
                access_token: None,
                expires_at: None,
                domain,
            }),
        }
    }

    fn http_client(&self) -> AdapterResult<Client> {
        self.client
            .lock()
            .expect("client lock poisoned")
            .clone()
            .ok_or_else(|| {
                AdapterError::new(
                    ErrorCode::NotConnected,
                    "Adapter not connected. Call connect() first.",
                )
            })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn current_domain(&self) -> String {
        self.auth.lock().await.domain.clone()
    }

    /// Authenticate against the NetSapiens OAuth token endpoint.
    ///
    /// Supports both grant shapes: `client_credentials` (client_id +
    /// client_secret) and `password` (additionally username + password).
    /// Fails fast with AUTH_ERROR naming exactly the missing fields.
    async fn authenticate(&self, client: &Client, state: &mut AuthState) -> AdapterResult<()> {
        let creds = &self.config.credentials;
        let grant_type = creds
            .get("grant_type")
            .map(String::as_str)
            .unwrap_or("client_credentials");

        let mut required = vec!["client_id", "client_secret"];
        match grant_type {
            "client_credentials" => {}
            "password" => required.extend(["username", "password"]),
            other => {
                return Err(AdapterError::new(
                    ErrorCode::AuthError,
                    format!(
                        "Unsupported grant_type: {}. Supported: client_credentials, password",
                        other
                    ),
                ));
            }
        }

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|field| creds.get(*field).map(String::as_str).unwrap_or("").is_empty())
            .collect();
        if !missing.is_empty() {
            return Err(AdapterError::new(
                ErrorCode::AuthError,
                format!("Missing required credentials: {}", missing.join(", ")),
            ));
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", grant_type),
            ("client_id", creds["client_id"].as_str()),
            ("client_secret", creds["client_secret"].as_str()),
        ];
        if grant_type == "password" {
            form.push(("username", creds["username"].as_str()));
            form.push(("password", creds["password"].as_str()));
        }

        // Token endpoint expects form-encoded data, not query params.
        let token_url = self.endpoint("oauth2/token/");
        let response = client.post(&token_url).form(&form).send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::new(ErrorCode::AuthTimeout, "OAuth token request timed out")
            } else {
                AdapterError::new(
                    ErrorCode::AuthError,
                    format!("OAuth token request failed: {}", e),
                )
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            error!("❌ OAuth token request failed: {} - {}", status, body);
            let vendor_message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error_description")
                        .or_else(|| v.get("error"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| body.clone());
            return Err(AdapterError::new(
                ErrorCode::AuthError,
                format!(
                    "OAuth authentication failed: {} - {}",
                    status.as_u16(),
                    vendor_message
                ),
            )
            .with_detail("status_code", json!(status.as_u16()))
            .with_provider_error(body));
        }

        let token_data: Value = serde_json::from_str(&body).map_err(|e| {
            AdapterError::new(
                ErrorCode::AuthError,
                format!("Malformed token response: {}", e),
            )
            .with_provider_error(preview(&body))
        })?;

        let access_token = token_data
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AdapterError::new(ErrorCode::AuthError, "Token response missing access_token")
            })?;
        state.access_token = Some(access_token.to_string());

        state.expires_at = token_data
            .get("expires_in")
            .and_then(expires_in_seconds)
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));

        // The vendor's domain is authoritative: local config may reference a
        // hostname rather than the true tenant name.
        if let Some(vendor_domain) = token_data.get("domain").and_then(Value::as_str) {
            if !vendor_domain.is_empty() && vendor_domain != state.domain {
                info!(
                    "🔁 Token response overrides configured domain: {} -> {}",
                    state.domain, vendor_domain
                );
                state.domain = vendor_domain.to_string();
            }
        }

        info!("🔐 Authenticated with NetSapiens (grant: {})", grant_type);
        Ok(())
    }

    /// Return a valid bearer token, lazily re-authenticating when the
    /// cached one has expired. The auth mutex is held across the refresh so
    /// concurrent callers wait on one refresh rather than issuing their own.
    async fn bearer_token(&self, client: &Client) -> AdapterResult<String> {
        let mut state = self.auth.lock().await;
        let expired = match (&state.access_token, &state.expires_at) {
            (None, _) => true,
            (Some(_), Some(expires_at)) => Utc::now() >= *expires_at,
            (Some(_), None) => false,
        };
        if expired {
            info!("🔄 Access token missing or expired, re-authenticating");
            self.authenticate(client, &mut state).await?;
        }
        Ok(state
            .access_token
            .clone()
            .expect("authenticate left no token"))
    }

    /// Issue an authenticated request and normalize the response.
    ///
    /// Status >= 400 maps to `HTTP_<status>` carrying the raw body; a
    /// transport timeout maps to TIMEOUT; an empty body is a valid empty
    /// payload (delete responses); a non-empty unparseable body maps to
    /// PARSE_ERROR with a bounded preview.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> AdapterResult<Value> {
        let client = self.http_client()?;
        let token = self.bearer_token(&client).await?;

        let mut req = client
            .request(method, self.endpoint(path))
            .bearer_auth(token);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(payload) = body {
            req = req.json(&payload);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::new(ErrorCode::Timeout, "Request timed out")
            } else {
                AdapterError::new(ErrorCode::RequestError, e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.as_u16() >= 400 {
            error!("❌ NetSapiens API error: {} - {}", status, text);
            return Err(AdapterError::new(
                ErrorCode::Http(status.as_u16()),
                format!("API request failed: {}", status.as_u16()),
            )
            .with_provider_error(text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            AdapterError::new(ErrorCode::ParseError, format!("Invalid JSON response: {}", e))
                .with_provider_error(preview(&text))
        })
    }

    // ── Translation ─────────────────────────────────────────────────────

    fn transform_user(&self, raw: &Value) -> VoipUser {
        let id = str_field(raw, "user_id")
            .or_else(|| str_field(raw, "user"))
            .unwrap_or_default();

        VoipUser {
            id: id.clone(),
            username: str_field(raw, "user").unwrap_or_default(),
            email: str_field(raw, "email"),
            first_name: str_field(raw, "first_name"),
            last_name: str_field(raw, "last_name"),
            display_name: str_field(raw, "display_name"),
            extension: str_field(raw, "extension"),
            did: str_field(raw, "did"),
            status: map_user_status(raw.get("status").and_then(Value::as_str)),
            department: str_field(raw, "department"),
            site: str_field(raw, "site"),
            has_voicemail: raw
                .get("voicemail_enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            has_sms: false,
            has_fax: false,
            created_at: parse_datetime(raw.get("created_at")),
            updated_at: parse_datetime(raw.get("updated_at")),
            provider_metadata: Some(ProviderMetadata {
                provider_type: Self::PROVIDER_TYPE.to_string(),
                raw_id: id,
                raw_data: raw.clone(),
            }),
        }
    }

    fn transform_device(&self, raw: &Value) -> VoipDevice {
        let id = str_field(raw, "device_id")
            .or_else(|| str_field(raw, "mac_address"))
            .unwrap_or_default();

        VoipDevice {
            id: id.clone(),
            name: str_field(raw, "device_name").unwrap_or_default(),
            device_type: from_ns_device_type(raw.get("device_type").and_then(Value::as_str)),
            user_id: str_field(raw, "user"),
            extension: str_field(raw, "extension"),
            mac_address: str_field(raw, "mac_address"),
            ip_address: str_field(raw, "ip_address"),
            manufacturer: str_field(raw, "manufacturer"),
            model: str_field(raw, "model"),
            firmware_version: str_field(raw, "firmware"),
            status: map_device_status(raw.get("status").and_then(Value::as_str)),
            last_seen: parse_datetime(raw.get("last_seen")),
            provider_metadata: Some(ProviderMetadata {
                provider_type: Self::PROVIDER_TYPE.to_string(),
                raw_id: id,
                raw_data: raw.clone(),
            }),
        }
    }

    fn transform_call(&self, raw: &Value) -> VoipCall {
        let id = str_field(raw, "call_id")
            .or_else(|| str_field(raw, "orig_callid"))
            .unwrap_or_default();
        let from_number = str_field(raw, "from_number")
            .or_else(|| str_field(raw, "orig_from_user"))
            .unwrap_or_default();
        let to_number = str_field(raw, "to_number")
            .or_else(|| str_field(raw, "term_user"))
            .unwrap_or_default();
        let hint = str_field(raw, "direction");

        VoipCall {
            id: id.clone(),
            direction: infer_call_direction(&from_number, &to_number, hint.as_deref()),
            from_number,
            to_number,
            status: map_call_status(raw.get("status").and_then(Value::as_str)),
            user_id: str_field(raw, "user"),
            start_time: parse_datetime(raw.get("start_time")),
            duration_seconds: raw.get("duration").and_then(Value::as_u64),
            provider_metadata: Some(ProviderMetadata {
                provider_type: Self::PROVIDER_TYPE.to_string(),
                raw_id: id,
                raw_data: raw.clone(),
            }),
        }
    }

    /// POST a call-control action and normalize an empty vendor ack into a
    /// small confirmation payload.
    async fn call_action(&self, call_id: &str, action: &str, body: Value) -> AdapterResult<Value> {
        let domain = self.current_domain().await;
        let mut payload = body;
        payload["domain"] = json!(domain);

        let result = self
            .request(
                Method::POST,
                &format!("ns-api/v2/calls/{}/{}", call_id, action),
                &[],
                Some(payload),
            )
            .await?;

        match result {
            Value::Null => Ok(json!({ action: true, "call_id": call_id })),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl VoipAdapter for NetSapiensAdapter {
    fn provider_type(&self) -> &'static str {
        Self::PROVIDER_TYPE
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER_NAME
    }

    async fn connect(&self) -> AdapterResult<()> {
        url::Url::parse(&self.config.base_url).map_err(|e| {
            AdapterError::new(
                ErrorCode::ConnectionError,
                format!("Invalid base URL '{}': {}", self.config.base_url, e),
            )
        })?;

        let client = Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| {
                AdapterError::new(
                    ErrorCode::ConnectionError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        let mut auth = self.auth.lock().await;
        self.authenticate(&client, &mut auth).await?;

        *self.client.lock().expect("client lock poisoned") = Some(client);
        info!("✅ Connected to NetSapiens domain: {}", auth.domain);
        Ok(())
    }

    async fn disconnect(&self) {
        let dropped = self
            .client
            .lock()
            .expect("client lock poisoned")
            .take()
            .is_some();
        let mut auth = self.auth.lock().await;
        auth.access_token = None;
        auth.expires_at = None;
        if dropped {
            info!("👋 Disconnected from NetSapiens");
        }
    }

    async fn health_check(&self) -> AdapterResult<Value> {
        self.request(Method::GET, "ns-api/v2/domains", &[], None)
            .await?;
        Ok(json!({ "healthy": true }))
    }

    // ── Users ───────────────────────────────────────────────────────────

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
        status: Option<UserStatus>,
    ) -> AdapterResult<UserPage> {
        let domain = self.current_domain().await;
        let mut query = vec![
            ("domain", domain),
            ("limit", page_size.to_string()),
            ("offset", page_offset(page, page_size).to_string()),
        ];
        if let Some(term) = search {
            query.push(("search", term.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", user_status_param(status).to_string()));
        }

        let data = self
            .request(Method::GET, "ns-api/v2/subscribers", &query, None)
            .await?;

        let users: Vec<VoipUser> = data
            .get("subscribers")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(|u| self.transform_user(u)).collect())
            .unwrap_or_default();

        let total = data
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(users.len() as u64);

        Ok(Page::new(users, total, page, page_size))
    }

    async fn get_user(&self, user_id: &str) -> AdapterResult<VoipUser> {
        let domain = self.current_domain().await;
        let data = self
            .request(
                Method::GET,
                &format!("ns-api/v2/subscribers/{}", user_id),
                &[("domain", domain)],
                None,
            )
            .await?;
        Ok(self.transform_user(&data))
    }

    async fn create_user(&self, user: &UserCreate) -> AdapterResult<VoipUser> {
        let domain = self.current_domain().await;
        let mut payload = json!({
            "domain": domain,
            "user": user.username,
            "email": user.email,
            "first_name": user.first_name.clone().unwrap_or_default(),
            "last_name": user.last_name.clone().unwrap_or_default(),
            "subscriber_type": "standard",
        });
        if let Some(extension) = &user.extension {
            payload["extension"] = json!(extension);
        }
        if let Some(password) = &user.password {
            payload["password"] = json!(password);
        }

        let data = self
            .request(Method::POST, "ns-api/v2/subscribers", &[], Some(payload))
            .await?;
        Ok(self.transform_user(&data))
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> AdapterResult<VoipUser> {
        let domain = self.current_domain().await;
        let mut payload = json!({ "domain": domain });
        if let Some(email) = &update.email {
            payload["email"] = json!(email);
        }
        if let Some(first_name) = &update.first_name {
            payload["first_name"] = json!(first_name);
        }
        if let Some(last_name) = &update.last_name {
            payload["last_name"] = json!(last_name);
        }
        if let Some(extension) = &update.extension {
            payload["extension"] = json!(extension);
        }
        if let Some(status) = update.status {
            payload["status"] = json!(user_status_param(status));
        }

        let data = self
            .request(
                Method::PUT,
                &format!("ns-api/v2/subscribers/{}", user_id),
                &[],
                Some(payload),
            )
            .await?;
        Ok(self.transform_user(&data))
    }

    async fn delete_user(&self, user_id: &str) -> AdapterResult<()> {
        let domain = self.current_domain().await;
        self.request(
            Method::DELETE,
            &format!("ns-api/v2/subscribers/{}", user_id),
            &[("domain", domain)],
            None,
        )
        .await?;
        Ok(())
    }

    // ── Devices ─────────────────────────────────────────────────────────

    async fn list_devices(
        &self,
        page: u32,
        page_size: u32,
        user_id: Option<&str>,
    ) -> AdapterResult<DevicePage> {
        let domain = self.current_domain().await;
        let mut query = vec![
            ("domain", domain),
            ("limit", page_size.to_string()),
            ("offset", page_offset(page, page_size).to_string()),
        ];
        if let Some(user) = user_id {
            query.push(("user", user.to_string()));
        }

        let data = self
            .request(Method::GET, "ns-api/v2/devices", &query, None)
            .await?;

        let devices: Vec<VoipDevice> = data
            .get("devices")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(|d| self.transform_device(d)).collect())
            .unwrap_or_default();

        let total = data
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(devices.len() as u64);

        Ok(Page::new(devices, total, page, page_size))
    }

    async fn get_device(&self, device_id: &str) -> AdapterResult<VoipDevice> {
        let domain = self.current_domain().await;
        let data = self
            .request(
                Method::GET,
                &format!("ns-api/v2/devices/{}", device_id),
                &[("domain", domain)],
                None,
            )
            .await?;
        Ok(self.transform_device(&data))
    }

    async fn create_device(&self, device: &DeviceCreate) -> AdapterResult<VoipDevice> {
        let domain = self.current_domain().await;
        let mut payload = json!({
            "domain": domain,
            "mac_address": device.mac_address,
            "device_name": device.name,
            "device_type": to_ns_device_type(device.device_type),
        });
        if let Some(user) = &device.user_id {
            payload["user"] = json!(user);
        }
        if let Some(manufacturer) = &device.manufacturer {
            payload["manufacturer"] = json!(manufacturer);
        }
        if let Some(model) = &device.model {
            payload["model"] = json!(model);
        }

        let data = self
            .request(Method::POST, "ns-api/v2/devices", &[], Some(payload))
            .await?;
        Ok(self.transform_device(&data))
    }

    async fn delete_device(&self, device_id: &str) -> AdapterResult<()> {
        let domain = self.current_domain().await;
        self.request(
            Method::DELETE,
            &format!("ns-api/v2/devices/{}", device_id),
            &[("domain", domain)],
            None,
        )
        .await?;
        Ok(())
    }

    // ── Call control ────────────────────────────────────────────────────

    async fn get_active_calls(
        &self,
        user_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> AdapterResult<CallPage> {
        let domain = self.current_domain().await;
        let mut query = vec![
            ("domain", domain),
            ("limit", page_size.to_string()),
            ("offset", page_offset(page, page_size).to_string()),
        ];
        if let Some(user) = user_id {
            query.push(("user", user.to_string()));
        }

        let data = self
            .request(Method::GET, "ns-api/v2/calls", &query, None)
            .await?;

        let calls: Vec<VoipCall> = data
            .get("calls")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(|c| self.transform_call(c)).collect())
            .unwrap_or_default();

        let total = data
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(calls.len() as u64);

        Ok(Page::new(calls, total, page, page_size))
    }

    async fn get_call(&self, call_id: &str) -> AdapterResult<VoipCall> {
        let domain = self.current_domain().await;
        let data = self
            .request(
                Method::GET,
                &format!("ns-api/v2/calls/{}", call_id),
                &[("domain", domain)],
                None,
            )
            .await?;
        Ok(self.transform_call(&data))
    }

    async fn transfer_call(
        &self,
        call_id: &str,
        request: &TransferRequest,
    ) -> AdapterResult<Value> {
        debug!("📞 Transferring call {} to {}", call_id, request.destination);
        self.call_action(
            call_id,
            "transfer",
            json!({
                "destination": request.destination,
                "announce": request.announce,
            }),
        )
        .await
    }

    async fn hold_call(&self, call_id: &str) -> AdapterResult<Value> {
        self.call_action(call_id, "hold", json!({})).await
    }

    async fn resume_call(&self, call_id: &str) -> AdapterResult<Value> {
        self.call_action(call_id, "resume", json!({})).await
    }

    async fn mute_call(&self, call_id: &str) -> AdapterResult<Value> {
        self.call_action(call_id, "mute", json!({})).await
    }

    async fn unmute_call(&self, call_id: &str) -> AdapterResult<Value> {
        self.call_action(call_id, "unmute", json!({})).await
    }

    async fn hangup_call(&self, call_id: &str) -> AdapterResult<Value> {
        self.call_action(call_id, "hangup", json!({})).await
    }
}

// ── Mapping tables ──────────────────────────────────────────────────────
// Explicit field-by-field maps with an explicit fallback; unrecognized
// vendor values degrade to a bucket rather than failing the operation.

fn map_user_status(value: Option<&str>) -> UserStatus {
    match value.unwrap_or("active") {
        "active" => UserStatus::Active,
        "inactive" => UserStatus::Inactive,
        "suspended" => UserStatus::Suspended,
        "pending" => UserStatus::Pending,
        _ => UserStatus::Active,
    }
}

fn user_status_param(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "active",
        UserStatus::Inactive => "inactive",
        UserStatus::Suspended => "suspended",
        UserStatus::Pending => "pending",
    }
}

fn map_device_status(value: Option<&str>) -> DeviceStatus {
    match value.unwrap_or("") {
        "online" | "registered" => DeviceStatus::Online,
        "offline" | "unregistered" => DeviceStatus::Offline,
        "busy" => DeviceStatus::Busy,
        _ => DeviceStatus::Unknown,
    }
}

fn to_ns_device_type(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::DeskPhone => "sip_phone",
        DeviceType::Softphone => "softphone",
        DeviceType::MobileApp => "mobile",
        DeviceType::Webrtc => "webrtc",
        DeviceType::Ata => "ata",
        DeviceType::Conference | DeviceType::Other => "sip_phone",
    }
}

fn from_ns_device_type(value: Option<&str>) -> DeviceType {
    match value.unwrap_or("") {
        "sip_phone" => DeviceType::DeskPhone,
        "softphone" => DeviceType::Softphone,
        "mobile" => DeviceType::MobileApp,
        "webrtc" => DeviceType::Webrtc,
        "ata" => DeviceType::Ata,
        _ => DeviceType::Other,
    }
}

fn map_call_status(value: Option<&str>) -> CallStatus {
    match value.unwrap_or("") {
        "ringing" => CallStatus::Ringing,
        "active" | "answered" | "connected" => CallStatus::Active,
        "hold" | "held" => CallStatus::Held,
        "parked" => CallStatus::Parked,
        "ended" | "hangup" | "completed" => CallStatus::Ended,
        _ => CallStatus::Unknown,
    }
}

/// Best-effort call-direction heuristic.
///
/// A vendor-supplied direction hint wins when present. Otherwise a number
/// that looks external (leading `+` or at least seven digits) on the
/// originating side classifies the call inbound, on the terminating side
/// outbound; two internal-looking numbers classify it internal. This is a
/// heuristic, not ground truth; keep it replaceable without touching the
/// rest of the translation logic.
pub fn infer_call_direction(from: &str, to: &str, hint: Option<&str>) -> CallDirection {
    match hint.map(str::to_ascii_lowercase).as_deref() {
        Some("inbound") | Some("in") => return CallDirection::Inbound,
        Some("outbound") | Some("out") => return CallDirection::Outbound,
        _ => {}
    }

    match (looks_external(from), looks_external(to)) {
        (true, _) => CallDirection::Inbound,
        (false, true) => CallDirection::Outbound,
        (false, false) => CallDirection::Internal,
    }
}

fn looks_external(number: &str) -> bool {
    number.starts_with('+') || number.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

// Widened before multiplying, same as the page math in `Page::new`.
fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn expires_in_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn preview(body: &str) -> String {
    if body.len() <= BODY_PREVIEW_LIMIT {
        body.to_string()
    } else {
        let mut cut = BODY_PREVIEW_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_hint_wins_over_heuristic() {
        assert_eq!(
            infer_call_direction("101", "102", Some("outbound")),
            CallDirection::Outbound
        );
        assert_eq!(
            infer_call_direction("+15551234567", "101", Some("in")),
            CallDirection::Inbound
        );
    }

    #[test]
    fn external_looking_origin_classifies_inbound() {
        assert_eq!(
            infer_call_direction("+15551234567", "101", None),
            CallDirection::Inbound
        );
        assert_eq!(
            infer_call_direction("5551234567", "102", None),
            CallDirection::Inbound
        );
    }

    #[test]
    fn external_destination_classifies_outbound() {
        assert_eq!(
            infer_call_direction("101", "+15551234567", None),
            CallDirection::Outbound
        );
    }

    #[test]
    fn two_extensions_classify_internal() {
        assert_eq!(infer_call_direction("101", "102", None), CallDirection::Internal);
    }

    #[test]
    fn unknown_vendor_enum_values_fall_back() {
        assert_eq!(map_device_status(Some("rebooting")), DeviceStatus::Unknown);
        assert_eq!(from_ns_device_type(Some("quantum_phone")), DeviceType::Other);
        assert_eq!(map_call_status(Some("warbling")), CallStatus::Unknown);
        assert_eq!(map_user_status(None), UserStatus::Active);
    }

    #[test]
    fn device_type_round_trips_through_vendor_spelling() {
        for ty in [
            DeviceType::DeskPhone,
            DeviceType::Softphone,
            DeviceType::MobileApp,
            DeviceType::Webrtc,
            DeviceType::Ata,
        ] {
            assert_eq!(from_ns_device_type(Some(to_ns_device_type(ty))), ty);
        }
    }

    #[test]
    fn body_preview_is_bounded() {
        let long = "x".repeat(10_000);
        let p = preview(&long);
        assert!(p.len() <= BODY_PREVIEW_LIMIT + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn transform_user_preserves_raw_record() {
        let adapter = NetSapiensAdapter::new(AdapterConfig::new("https://ns.example.com/"));
        let raw = serde_json::json!({
            "user_id": "sub-42",
            "user": "jsmith",
            "email": "jsmith@example.com",
            "status": "suspended",
            "extension": "101",
            "custom_vendor_field": {"nested": [1, 2, 3]},
        });
        let user = adapter.transform_user(&raw);
        assert_eq!(user.id, "sub-42");
        assert_eq!(user.status, UserStatus::Suspended);
        let meta = user.provider_metadata.expect("metadata");
        assert_eq!(meta.provider_type, "netsapiens");
        assert_eq!(meta.raw_id, "sub-42");
        assert_eq!(meta.raw_data, raw);
    }
}
