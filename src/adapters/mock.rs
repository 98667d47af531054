//! Mock adapter backed by in-process state.
//!
//! Used for local development and contract tests. Reproduces the real
//! adapter's pagination, filtering, and not-found behavior so tests written
//! against the contract are adapter-agnostic. None of the optional
//! capabilities are implemented.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AdapterError, AdapterResult};
use crate::models::{
    DeviceCreate, DevicePage, DeviceStatus, DeviceType, Page, ProviderMetadata, UserCreate,
    UserPage, UserStatus, UserUpdate, VoipDevice, VoipUser,
};

use super::traits::{AdapterConfig, VoipAdapter};

#[derive(Debug)]
struct MockState {
    users: BTreeMap<String, Value>,
    devices: BTreeMap<String, Value>,
    next_user_id: u32,
    next_device_id: u32,
}

/// In-memory reference adapter. State lives for the adapter's lifetime;
/// create operations allocate the next sequential synthetic ID.
#[derive(Debug)]
pub struct MockAdapter {
    #[allow(dead_code)]
    config: AdapterConfig,
    state: Mutex<MockState>,
}

impl MockAdapter {
    pub const PROVIDER_TYPE: &'static str = "mock";
    pub const PROVIDER_NAME: &'static str = "Mock Provider";

    pub fn new(config: AdapterConfig) -> Self {
        let users = seed_users()
            .into_iter()
            .map(|u| (u["id"].as_str().unwrap().to_string(), u))
            .collect();
        let devices = seed_devices()
            .into_iter()
            .map(|d| (d["id"].as_str().unwrap().to_string(), d))
            .collect();
        Self {
            config,
            state: Mutex::new(MockState {
                users,
                devices,
                next_user_id: 9,
                next_device_id: 8,
            }),
        }
    }

    fn to_voip_user(&self, raw: &Value) -> VoipUser {
        let id = raw["id"].as_str().unwrap_or_default().to_string();
        let status = match raw.get("status").and_then(Value::as_str) {
            Some("inactive") => UserStatus::Inactive,
            Some("suspended") => UserStatus::Suspended,
            _ => UserStatus::Active,
        };
        VoipUser {
            id: id.clone(),
            username: field(raw, "username").unwrap_or_default(),
            email: field(raw, "email"),
            first_name: field(raw, "first_name"),
            last_name: field(raw, "last_name"),
            display_name: None,
            extension: field(raw, "extension"),
            did: field(raw, "did"),
            status,
            department: field(raw, "department"),
            site: None,
            has_voicemail: true,
            has_sms: false,
            has_fax: false,
            created_at: Some(Utc::now() - ChronoDuration::days(30)),
            updated_at: None,
            provider_metadata: Some(ProviderMetadata {
                provider_type: Self::PROVIDER_TYPE.to_string(),
                raw_id: id,
                raw_data: raw.clone(),
            }),
        }
    }

    fn to_voip_device(&self, raw: &Value) -> VoipDevice {
        let id = raw["id"].as_str().unwrap_or_default().to_string();
        let device_type = match raw.get("device_type").and_then(Value::as_str) {
            Some("desk_phone") => DeviceType::DeskPhone,
            Some("softphone") => DeviceType::Softphone,
            Some("conference") => DeviceType::Conference,
            _ => DeviceType::Other,
        };
        let status = match raw.get("status").and_then(Value::as_str) {
            Some("online") => DeviceStatus::Online,
            Some("offline") => DeviceStatus::Offline,
            _ => DeviceStatus::Unknown,
        };
        VoipDevice {
            id: id.clone(),
            name: field(raw, "name").unwrap_or_default(),
            device_type,
            user_id: field(raw, "user_id"),
            extension: None,
            mac_address: field(raw, "mac_address"),
            ip_address: None,
            manufacturer: field(raw, "manufacturer"),
            model: field(raw, "model"),
            firmware_version: None,
            status,
            last_seen: Some(Utc::now() - ChronoDuration::minutes(5)),
            provider_metadata: Some(ProviderMetadata {
                provider_type: Self::PROVIDER_TYPE.to_string(),
                raw_id: id,
                raw_data: raw.clone(),
            }),
        }
    }
}

#[async_trait]
impl VoipAdapter for MockAdapter {
    fn provider_type(&self) -> &'static str {
        Self::PROVIDER_TYPE
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER_NAME
    }

    async fn connect(&self) -> AdapterResult<()> {
        info!("✅ Mock adapter connected");
        Ok(())
    }

    async fn disconnect(&self) {
        info!("👋 Mock adapter disconnected");
    }

    async fn health_check(&self) -> AdapterResult<Value> {
        Ok(json!({ "healthy": true }))
    }

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
        status: Option<UserStatus>,
    ) -> AdapterResult<UserPage> {
        let state = self.state.lock().expect("mock state lock poisoned");
        let mut users: Vec<&Value> = state.users.values().collect();

        if let Some(term) = search {
            let term = term.to_lowercase();
            users.retain(|u| {
                ["username", "email", "first_name", "last_name", "extension"]
                    .iter()
                    .any(|key| {
                        u.get(*key)
                            .and_then(Value::as_str)
                            .map(|v| v.to_lowercase().contains(&term))
                            .unwrap_or(false)
                    })
            });
        }

        if let Some(wanted) = status {
            users.retain(|u| {
                let raw = u.get("status").and_then(Value::as_str).unwrap_or("active");
                serde_json::to_value(wanted).unwrap() == json!(raw)
            });
        }

        let total = users.len() as u64;
        let start = page_offset(page, page_size);
        let items: Vec<VoipUser> = users
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|u| self.to_voip_user(u))
            .collect();

        Ok(Page::new(items, total, page, page_size))
    }

    async fn get_user(&self, user_id: &str) -> AdapterResult<VoipUser> {
        let state = self.state.lock().expect("mock state lock poisoned");
        state
            .users
            .get(user_id)
            .map(|u| self.to_voip_user(u))
            .ok_or_else(|| AdapterError::not_found("User", user_id))
    }

    async fn create_user(&self, user: &UserCreate) -> AdapterResult<VoipUser> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let id = format!("user-{:03}", state.next_user_id);
        state.next_user_id += 1;

        let extension = user
            .extension
            .clone()
            .unwrap_or_else(|| (100 + state.next_user_id).to_string());
        let record = json!({
            "id": id.clone(),
            "username": user.username,
            "email": user.email,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "extension": extension,
            "did": format!("+1555123{}", 100 + state.next_user_id),
            "department": user.department,
            "status": "active",
        });
        state.users.insert(id, record.clone());

        Ok(self.to_voip_user(&record))
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> AdapterResult<VoipUser> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let record = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AdapterError::not_found("User", user_id))?;

        if let Some(email) = &update.email {
            record["email"] = json!(email);
        }
        if let Some(first_name) = &update.first_name {
            record["first_name"] = json!(first_name);
        }
        if let Some(last_name) = &update.last_name {
            record["last_name"] = json!(last_name);
        }
        if let Some(extension) = &update.extension {
            record["extension"] = json!(extension);
        }
        if let Some(status) = update.status {
            record["status"] = serde_json::to_value(status).unwrap();
        }

        let updated = record.clone();
        drop(state);
        Ok(self.to_voip_user(&updated))
    }

    async fn delete_user(&self, user_id: &str) -> AdapterResult<()> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        state
            .users
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| AdapterError::not_found("User", user_id))
    }

    async fn list_devices(
        &self,
        page: u32,
        page_size: u32,
        user_id: Option<&str>,
    ) -> AdapterResult<DevicePage> {
        let state = self.state.lock().expect("mock state lock poisoned");
        let mut devices: Vec<&Value> = state.devices.values().collect();

        if let Some(owner) = user_id {
            devices.retain(|d| d.get("user_id").and_then(Value::as_str) == Some(owner));
        }

        let total = devices.len() as u64;
        let start = page_offset(page, page_size);
        let items: Vec<VoipDevice> = devices
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|d| self.to_voip_device(d))
            .collect();

        Ok(Page::new(items, total, page, page_size))
    }

    async fn get_device(&self, device_id: &str) -> AdapterResult<VoipDevice> {
        let state = self.state.lock().expect("mock state lock poisoned");
        state
            .devices
            .get(device_id)
            .map(|d| self.to_voip_device(d))
            .ok_or_else(|| AdapterError::not_found("Device", device_id))
    }

    async fn create_device(&self, device: &DeviceCreate) -> AdapterResult<VoipDevice> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        let id = format!("device-{:03}", state.next_device_id);
        state.next_device_id += 1;

        let record = json!({
            "id": id.clone(),
            "name": device.name,
            "device_type": serde_json::to_value(device.device_type).unwrap(),
            "user_id": device.user_id,
            "mac_address": device.mac_address,
            "manufacturer": device.manufacturer,
            "model": device.model,
            "status": "offline",
        });
        state.devices.insert(id, record.clone());

        Ok(self.to_voip_device(&record))
    }

    async fn delete_device(&self, device_id: &str) -> AdapterResult<()> {
        let mut state = self.state.lock().expect("mock state lock poisoned");
        state
            .devices
            .remove(device_id)
            .map(|_| ())
            .ok_or_else(|| AdapterError::not_found("Device", device_id))
    }
}

// Widened before multiplying, same as the page math in `Page::new`.
fn page_offset(page: u32, page_size: u32) -> usize {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    usize::try_from(offset).unwrap_or(usize::MAX)
}

fn field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn seed_users() -> Vec<Value> {
    vec![
        json!({"id": "user-001", "username": "jsmith", "email": "john.smith@testdental.com",
            "first_name": "John", "last_name": "Smith", "extension": "101",
            "did": "+15551234101", "department": "Front Desk", "status": "active"}),
        json!({"id": "user-002", "username": "mjohnson", "email": "mary.johnson@testdental.com",
            "first_name": "Mary", "last_name": "Johnson", "extension": "102",
            "did": "+15551234102", "department": "Hygiene", "status": "active"}),
        json!({"id": "user-003", "username": "drwilliams", "email": "dr.williams@testdental.com",
            "first_name": "Robert", "last_name": "Williams", "extension": "103",
            "did": "+15551234103", "department": "Dentist", "status": "active"}),
        json!({"id": "user-004", "username": "sbrown", "email": "sarah.brown@testdental.com",
            "first_name": "Sarah", "last_name": "Brown", "extension": "104",
            "did": "+15551234104", "department": "Front Desk", "status": "active"}),
        json!({"id": "user-005", "username": "drdavis", "email": "dr.davis@testdental.com",
            "first_name": "Emily", "last_name": "Davis", "extension": "105",
            "did": "+15551234105", "department": "Dentist", "status": "active"}),
        json!({"id": "user-006", "username": "jgarcia", "email": "jose.garcia@testdental.com",
            "first_name": "Jose", "last_name": "Garcia", "extension": "106",
            "did": "+15551234106", "department": "Billing", "status": "active"}),
        json!({"id": "user-007", "username": "amiller", "email": "amanda.miller@testdental.com",
            "first_name": "Amanda", "last_name": "Miller", "extension": "107",
            "did": "+15551234107", "department": "Hygiene", "status": "inactive"}),
        json!({"id": "user-008", "username": "twang", "email": "tom.wang@testdental.com",
            "first_name": "Tom", "last_name": "Wang", "extension": "108",
            "did": "+15551234108", "department": "IT", "status": "active"}),
    ]
}

fn seed_devices() -> Vec<Value> {
    vec![
        json!({"id": "device-001", "name": "Front Desk Phone 1", "device_type": "desk_phone",
            "user_id": "user-001", "mac_address": "AA:BB:CC:DD:EE:01", "manufacturer": "Polycom",
            "model": "VVX 450", "status": "online"}),
        json!({"id": "device-002", "name": "Front Desk Phone 2", "device_type": "desk_phone",
            "user_id": "user-004", "mac_address": "AA:BB:CC:DD:EE:02", "manufacturer": "Polycom",
            "model": "VVX 450", "status": "online"}),
        json!({"id": "device-003", "name": "Hygiene Room 1", "device_type": "desk_phone",
            "user_id": "user-002", "mac_address": "AA:BB:CC:DD:EE:03", "manufacturer": "Yealink",
            "model": "T46U", "status": "online"}),
        json!({"id": "device-004", "name": "Dr. Williams Office", "device_type": "desk_phone",
            "user_id": "user-003", "mac_address": "AA:BB:CC:DD:EE:04", "manufacturer": "Polycom",
            "model": "VVX 601", "status": "offline"}),
        json!({"id": "device-005", "name": "Dr. Davis Office", "device_type": "desk_phone",
            "user_id": "user-005", "mac_address": "AA:BB:CC:DD:EE:05", "manufacturer": "Polycom",
            "model": "VVX 601", "status": "online"}),
        json!({"id": "device-006", "name": "Billing Softphone", "device_type": "softphone",
            "user_id": "user-006", "mac_address": null, "manufacturer": "NetSapiens",
            "model": "Desktop App", "status": "online"}),
        json!({"id": "device-007", "name": "Conference Room", "device_type": "conference",
            "user_id": null, "mac_address": "AA:BB:CC:DD:EE:07", "manufacturer": "Poly",
            "model": "Trio 8500", "status": "online"}),
    ]
}
