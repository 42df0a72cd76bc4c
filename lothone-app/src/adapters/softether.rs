//! SSTP admin service over the `SoftEther` VPN Server JSON-RPC API
//!
//! Every call is a `POST {endpoint}` with the hub name and admin password in
//! the `X-VPNADMIN-*` headers and a JSON-RPC 2.0 body.

use async_trait::async_trait;
use chrono::NaiveDate;
use lothone_core::error::{CoreError, CoreResult};
use lothone_core::traits::{ExternalAccountService, ExternalUser};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::http::HttpUtils;

const SERVICE: &str = "sstp";

/// `AuthType_u32` for password authentication
const AUTH_PASSWORD: u32 = 1;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(rename = "UserList", default)]
    users: Vec<UserEntry>,
}

#[derive(Deserialize)]
struct UserEntry {
    #[serde(rename = "Name_str")]
    name: String,
    #[serde(rename = "Note_utf", default)]
    note: String,
    #[serde(rename = "Expires_dt", default)]
    expires: Option<String>,
}

pub struct SoftEtherClient {
    client: Client,
    endpoint: String,
    hub: String,
    admin_password: String,
}

impl SoftEtherClient {
    /// # Arguments
    /// * `endpoint` - JSON-RPC URL, e.g. `https://vpn.example.net:5555/api/`
    /// * `hub` - Virtual hub the users live in
    /// * `admin_password` - Hub or server admin password
    pub fn new(endpoint: &str, hub: &str, admin_password: &str) -> CoreResult<Self> {
        Ok(Self {
            client: HttpUtils::client(None)?,
            endpoint: endpoint.trim().to_string(),
            hub: hub.to_string(),
            admin_password: admin_password.to_string(),
        })
    }

    /// Calls one RPC method and returns the raw response text.
    async fn call(&self, method: &str, params: Value) -> CoreResult<String> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: "rpc_call_id",
            method,
            params,
        };
        let request = self
            .client
            .post(&self.endpoint)
            .header("X-VPNADMIN-HUBNAME", &self.hub)
            .header("X-VPNADMIN-PASSWORD", &self.admin_password)
            .json(&body);

        let text = HttpUtils::execute_request(request, SERVICE, method).await?;
        check_rpc_error(&text, method)?;
        Ok(text)
    }
}

fn check_rpc_error(text: &str, method: &str) -> CoreResult<Option<Value>> {
    let response: RpcResponse = HttpUtils::parse_json(text, SERVICE)?;
    if let Some(error) = response.error {
        return Err(CoreError::ExternalService {
            service: SERVICE.to_string(),
            detail: format!("{method} failed ({}): {}", error.code, error.message),
        });
    }
    Ok(response.result)
}

/// Last valid day expressed as its final second, in the API's timestamp format.
fn expiry_timestamp(expiry: NaiveDate) -> String {
    format!("{expiry}T23:59:59.000Z")
}

fn parse_users(text: &str) -> CoreResult<Vec<ExternalUser>> {
    let result = check_rpc_error(text, "EnumUser")?.unwrap_or(Value::Null);
    let list: UserList = serde_json::from_value(result).map_err(|e| CoreError::ExternalService {
        service: SERVICE.to_string(),
        detail: format!("unexpected EnumUser result: {e}"),
    })?;
    Ok(list
        .users
        .into_iter()
        .map(|u| ExternalUser {
            name: u.name,
            note: u.note,
            expires: u.expires,
        })
        .collect())
}

#[async_trait]
impl ExternalAccountService for SoftEtherClient {
    async fn create_user(
        &self,
        username: &str,
        description: &str,
        secret: &str,
        expiry: NaiveDate,
    ) -> CoreResult<String> {
        self.call(
            "CreateUser",
            json!({
                "HubName_str": self.hub,
                "Name_str": username,
                "Realname_utf": username,
                "Note_utf": description,
                "ExpireTime_dt": expiry_timestamp(expiry),
                "AuthType_u32": AUTH_PASSWORD,
                "Auth_Password_str": secret,
            }),
        )
        .await
    }

    async fn delete_user(&self, username: &str) -> CoreResult<String> {
        self.call(
            "DeleteUser",
            json!({
                "HubName_str": self.hub,
                "Name_str": username,
            }),
        )
        .await
    }

    async fn list_users(&self) -> CoreResult<Vec<ExternalUser>> {
        let text = self
            .call("EnumUser", json!({ "HubName_str": self.hub }))
            .await?;
        parse_users(&text)
    }
}

/// Stand-in used when no SSTP endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredExternalService;

impl UnconfiguredExternalService {
    fn error() -> CoreError {
        CoreError::ExternalService {
            service: SERVICE.to_string(),
            detail: "no SSTP endpoint configured".to_string(),
        }
    }
}

#[async_trait]
impl ExternalAccountService for UnconfiguredExternalService {
    async fn create_user(&self, _: &str, _: &str, _: &str, _: NaiveDate) -> CoreResult<String> {
        Err(Self::error())
    }

    async fn delete_user(&self, _: &str) -> CoreResult<String> {
        Err(Self::error())
    }

    async fn list_users(&self) -> CoreResult<Vec<ExternalUser>> {
        Err(Self::error())
    }
}
