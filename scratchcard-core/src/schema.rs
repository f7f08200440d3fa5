//! Normalization of stored records into the canonical types.
//!
//! Rows written by older integrations use different field casings
//! (`iswinning`, `userCpf`, `date`, `whatsappnumber`) and sometimes numeric
//! ids. Everything that crosses the persistence boundary goes through here so
//! only the canonical shape reaches the game logic.

use crate::error::{Result, ScratchError};
use crate::types::{PlatformClient, Prize, StoreConfig, Winner};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
struct RawPrize {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "isWinning")]
    is_winning_camel: Option<bool>,
    #[serde(default)]
    iswinning: Option<bool>,
    #[serde(default)]
    is_winning: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWinner {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "userName", alias = "user_name")]
    user_name: Option<String>,
    #[serde(default, rename = "userIdentity")]
    user_identity: Option<String>,
    #[serde(default, rename = "userCpf", alias = "user_cpf")]
    user_cpf: Option<String>,
    #[serde(default, rename = "prizeName", alias = "prize_name")]
    prize_name: Option<String>,
    #[serde(default, rename = "prizeCode", alias = "prize_code")]
    prize_code: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "logoUrl", alias = "logo_url")]
    logo_url: Option<String>,
    #[serde(default, rename = "primaryColor", alias = "primary_color")]
    primary_color: Option<String>,
    #[serde(default, rename = "whatsappNumber")]
    whatsapp_camel: Option<String>,
    #[serde(default)]
    whatsappnumber: Option<String>,
    #[serde(default, rename = "adminPassword")]
    admin_password: Option<String>,
    #[serde(default, rename = "adminContactNumber")]
    admin_contact_number: Option<String>,
    #[serde(default, rename = "globalAdminPassword")]
    global_admin_password: Option<String>,
    #[serde(default, rename = "platformClients")]
    platform_clients: Option<Vec<Value>>,
}

fn id_from(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub fn parse_prize(value: Value) -> Result<Prize> {
    if !value.is_object() {
        return Err(ScratchError::invalid_record("prize is not an object"));
    }
    let raw: RawPrize = serde_json::from_value(value)?;
    let name = non_empty(raw.name)
        .ok_or_else(|| ScratchError::invalid_record("prize without a name"))?;

    Ok(Prize {
        id: id_from(raw.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
        name,
        description: raw.description.unwrap_or_default(),
        is_winning: raw
            .is_winning_camel
            .or(raw.iswinning)
            .or(raw.is_winning)
            .unwrap_or(false),
    })
}

/// Unknown or unusable entries are dropped with a warning.
pub fn parse_prizes(value: Value) -> Result<Vec<Prize>> {
    let Value::Array(items) = value else {
        return Err(ScratchError::invalid_record("prize pool is not an array"));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match parse_prize(item) {
            Ok(prize) => Some(prize),
            Err(e) => {
                tracing::warn!("Skipping prize record: {}", e);
                None
            }
        })
        .collect())
}

/// Missing fields become empty strings; eligibility skips such entries.
pub fn parse_winner(value: Value) -> Result<Winner> {
    if !value.is_object() {
        return Err(ScratchError::invalid_record("winner is not an object"));
    }
    let raw: RawWinner = serde_json::from_value(value)?;

    Ok(Winner {
        id: id_from(raw.id).unwrap_or_default(),
        user_name: raw.user_name.unwrap_or_default(),
        user_identity: raw.user_identity.or(raw.user_cpf).unwrap_or_default(),
        prize_name: raw.prize_name.unwrap_or_default(),
        prize_code: raw.prize_code.unwrap_or_default(),
        timestamp: raw.timestamp.or(raw.date).unwrap_or_default(),
    })
}

pub fn parse_winners(value: Value) -> Result<Vec<Winner>> {
    let Value::Array(items) = value else {
        return Err(ScratchError::invalid_record("winner ledger is not an array"));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match parse_winner(item) {
            Ok(winner) => Some(winner),
            Err(e) => {
                tracing::warn!("Skipping winner record: {}", e);
                None
            }
        })
        .collect())
}

/// Every field missing from the record keeps its documented default.
pub fn parse_config(value: Value) -> Result<StoreConfig> {
    if !value.is_object() {
        return Err(ScratchError::invalid_record("config is not an object"));
    }
    let raw: RawConfig = serde_json::from_value(value)?;
    let defaults = StoreConfig::default();

    let platform_clients = raw
        .platform_clients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|client| serde_json::from_value::<PlatformClient>(client).ok())
        .collect();

    Ok(StoreConfig {
        name: non_empty(raw.name).unwrap_or(defaults.name),
        logo_url: non_empty(raw.logo_url).unwrap_or(defaults.logo_url),
        primary_color: non_empty(raw.primary_color).unwrap_or(defaults.primary_color),
        whatsapp_number: non_empty(raw.whatsapp_camel)
            .or(non_empty(raw.whatsappnumber))
            .unwrap_or(defaults.whatsapp_number),
        admin_password: non_empty(raw.admin_password).unwrap_or(defaults.admin_password),
        admin_contact_number: non_empty(raw.admin_contact_number)
            .unwrap_or(defaults.admin_contact_number),
        global_admin_password: non_empty(raw.global_admin_password)
            .unwrap_or(defaults.global_admin_password),
        platform_clients,
    })
}
