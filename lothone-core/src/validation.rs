//! Credential allocator & validator
//!
//! Turns raw console forms into normalized, typed mutation candidates. Every
//! check here runs before any side effect.

use serde_json::Map;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{
    AccountForm, AccountRecord, DeleteForm, DeleteTarget, Protocol, ValidatedAccount,
    ValidatedDelete, DEFAULT_ALTER_ID, DEFAULT_USERNAME,
};
use crate::utils::date;

/// Field delimiter of the SSTP admin backend
const SSTP_USERNAME_DELIMITER: char = '/';

/// Username the console submits to request the default sentinel
const DEFAULT_USERNAME_MARKER: &str = "-";

fn require<'a>(value: &'a str, field: &str) -> CoreResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "is required"));
    }
    Ok(value)
}

fn check_uuid(value: &str, field: &str) -> CoreResult<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| CoreError::validation(field, "invalid UUID format"))
}

fn check_optional_uuid(value: &str, field: &str) -> CoreResult<()> {
    if value.is_empty() {
        Ok(())
    } else {
        check_uuid(value, field)
    }
}

/// Validates a create/edit form into one normalized record.
pub fn validate_account(form: &AccountForm) -> CoreResult<ValidatedAccount> {
    let username = require(&form.username, "username")?;
    let account_type = require(&form.account_type, "type")?;
    let device_id = require(&form.device_id, "deviceId")?;
    let start = require(&form.start_date, "startDate")?;
    let expire = require(&form.expire_date, "expireDate")?;

    let identifier = form.identifier.trim();
    let credential = form.credential.trim();
    if identifier.is_empty() && credential.is_empty() {
        return Err(CoreError::validation(
            "identifier",
            "identifier and credential can't both be empty",
        ));
    }
    check_optional_uuid(identifier, "identifier")?;
    check_optional_uuid(credential, "credential")?;

    let protocol: Protocol = account_type.parse()?;
    match protocol {
        Protocol::Vmess if identifier.is_empty() => {
            return Err(CoreError::validation(
                "identifier",
                "vmess accounts are addressed by identifier",
            ));
        }
        Protocol::Shadowsocks if credential.is_empty() => {
            return Err(CoreError::validation(
                "credential",
                "shadowsocks accounts are addressed by credential",
            ));
        }
        _ => {}
    }

    let username = if username == DEFAULT_USERNAME_MARKER {
        DEFAULT_USERNAME
    } else {
        username
    };

    // Expiry before start is accepted.
    let start_date = date::parse(start)
        .ok_or_else(|| CoreError::validation("startDate", "invalid date format"))?;
    let expire_date = date::parse(expire)
        .ok_or_else(|| CoreError::validation("expireDate", "invalid date format"))?;

    check_uuid(device_id, "deviceId")?;

    if protocol == Protocol::Sstp && username.contains(SSTP_USERNAME_DELIMITER) {
        return Err(CoreError::validation(
            "username",
            "'/' is not allowed in sstp usernames",
        ));
    }

    let record = AccountRecord {
        id: identifier.to_string(),
        alter_id: (protocol == Protocol::Vmess).then_some(DEFAULT_ALTER_ID),
        username: username.to_string(),
        device_id: device_id.to_string(),
        start_date,
        expire_date,
        password: credential.to_string(),
        extra: Map::new(),
    };

    Ok(ValidatedAccount {
        protocol,
        record,
        description: form.description.trim().to_string(),
    })
}

/// Validates a delete form into a typed target.
pub fn validate_delete(form: &DeleteForm) -> CoreResult<ValidatedDelete> {
    let device_id = require(&form.device_id, "deviceId")?;
    let account_type = require(&form.account_type, "type")?;

    let identifier = form.identifier.trim();
    let username = form.username.trim();
    if identifier.is_empty() && username.is_empty() {
        return Err(CoreError::validation(
            "identifier",
            "identifier and username can't both be empty",
        ));
    }
    check_optional_uuid(identifier, "identifier")?;
    check_uuid(device_id, "deviceId")?;

    let protocol: Protocol = account_type.parse()?;
    let target = match protocol.key_for(identifier) {
        Some(key) => {
            if identifier.is_empty() {
                return Err(CoreError::validation("identifier", "is required"));
            }
            DeleteTarget::Record {
                key,
                device_id: device_id.to_string(),
            }
        }
        None => DeleteTarget::ExternalUser {
            username: require(username, "username")?.to_string(),
        },
    };

    Ok(ValidatedDelete { protocol, target })
}
