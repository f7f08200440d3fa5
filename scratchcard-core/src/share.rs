//! Shareable-state links and messaging deep links.

use crate::error::{Result, ScratchError};
use crate::identity::normalize_identity;
use crate::schema;
use crate::types::{Prize, StoreConfig};
use base64::{engine::general_purpose, Engine as _};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SHARED_STATE_PARAM: &str = "s";
const WHATSAPP_BASE: &str = "https://wa.me/";

/// Snapshot of branding and prize pool carried in a link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<String>,
    /// Raw prize rows; decoded through the schema adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<Value>,
}

impl SharedState {
    pub fn capture(config: &StoreConfig, prizes: &[Prize]) -> Result<Self> {
        Ok(Self {
            n: Some(config.name.clone()),
            l: Some(config.logo_url.clone()),
            c: Some(config.primary_color.clone()),
            w: Some(config.whatsapp_number.clone()),
            p: Some(serde_json::to_value(prizes)?),
        })
    }

    /// Base64 of the JSON document.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn decode(payload: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD.decode(payload.trim())?;
        let state: SharedState = serde_json::from_slice(&bytes)
            .map_err(|e| ScratchError::decode(format!("invalid JSON: {}", e)))?;
        Ok(state)
    }

    /// Overlay the shared fields on the current state. Missing or empty
    /// fields keep the current value.
    pub fn apply(&self, config: &StoreConfig, prizes: &[Prize]) -> (StoreConfig, Vec<Prize>) {
        let pick = |shared: &Option<String>, current: &String| {
            shared
                .as_ref()
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| current.clone())
        };

        let merged = StoreConfig {
            name: pick(&self.n, &config.name),
            logo_url: pick(&self.l, &config.logo_url),
            primary_color: pick(&self.c, &config.primary_color),
            whatsapp_number: pick(&self.w, &config.whatsapp_number),
            ..config.clone()
        };

        let prizes = match &self.p {
            Some(rows) => schema::parse_prizes(rows.clone()).unwrap_or_else(|e| {
                tracing::warn!("Shared prize list unusable, keeping current: {}", e);
                prizes.to_vec()
            }),
            None => prizes.to_vec(),
        };

        (merged, prizes)
    }
}

/// `<base>?mode=client&s=<payload>`
pub fn share_link(base_url: &str, config: &StoreConfig, prizes: &[Prize]) -> Result<String> {
    let payload = SharedState::capture(config, prizes)?.encode()?;

    let mut url = Url::parse(base_url).map_err(ScratchError::invalid_url)?;
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair("mode", "client")
        .append_pair(SHARED_STATE_PARAM, &payload);

    Ok(url.into())
}

/// Accepts either a full link or a bare payload.
fn extract_payload(input: &str) -> Option<String> {
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == SHARED_STATE_PARAM)
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(input.to_string()).filter(|s| !s.trim().is_empty()),
    }
}

/// Starting state for a session.
#[derive(Debug, Clone)]
pub struct InitialState {
    pub config: StoreConfig,
    pub prizes: Vec<Prize>,
    pub from_link: bool,
}

/// Shared state wins over the cached one. A malformed payload is logged and
/// treated as absent.
pub fn resolve_initial_state(
    link_or_payload: Option<&str>,
    config: &StoreConfig,
    prizes: &[Prize],
) -> InitialState {
    let cached = || InitialState {
        config: config.clone(),
        prizes: prizes.to_vec(),
        from_link: false,
    };

    let Some(payload) = link_or_payload.and_then(extract_payload) else {
        return cached();
    };

    match SharedState::decode(&payload) {
        Ok(shared) => {
            let (config, prizes) = shared.apply(config, prizes);
            InitialState {
                config,
                prizes,
                from_link: true,
            }
        }
        Err(e) => {
            tracing::warn!("Ignoring shared state: {}", e);
            cached()
        }
    }
}

fn whatsapp_link(phone: &str, text: &str) -> Result<String> {
    let digits = normalize_identity(phone);
    if digits.is_empty() {
        return Err(ScratchError::config("Contact number has no digits"));
    }

    let mut url = Url::parse(WHATSAPP_BASE)
        .and_then(|base| base.join(&digits))
        .map_err(ScratchError::invalid_url)?;
    url.query_pairs_mut().append_pair("text", text);
    Ok(url.into())
}

/// Message the customer sends to the store to redeem a prize.
pub fn redemption_link(
    config: &StoreConfig,
    customer_name: &str,
    identity: &str,
    prize_name: &str,
    code: &str,
) -> Result<String> {
    let message = format!(
        "🎟️ RESGATE - {}\n👤 Cliente: {}\n📄 CPF: {}\n🎁 Prêmio: {}\n🔑 Código: {}",
        config.name,
        customer_name,
        normalize_identity(identity),
        prize_name,
        code
    );
    whatsapp_link(&config.whatsapp_number, &message)
}

/// Message a visiting merchant sends to ask for their own scratch card.
pub fn lead_link(config: &StoreConfig) -> Result<String> {
    let store = if config.name.trim().is_empty() {
        "minha loja"
    } else {
        config.name.as_str()
    };
    let message = format!(
        "Olá! Vi a raspadinha da loja \"{}\" e quero fazer a minha. Pode me ajudar?",
        store
    );
    whatsapp_link(&config.admin_contact_number, &message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::default_prizes;

    fn store() -> StoreConfig {
        StoreConfig {
            name: "Padaria Sol".to_string(),
            logo_url: "https://img.example/logo.png".to_string(),
            primary_color: "#ff8800".to_string(),
            whatsapp_number: "+55 (11) 98888-7777".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_link_roundtrip() {
        let prizes = vec![
            Prize::new("a", "Café grátis", "Um café", true),
            Prize::new("b", "Tente Novamente", "", false),
        ];
        let link = share_link("https://raspa.example/app?old=1#top", &store(), &prizes).unwrap();
        assert!(link.starts_with("https://raspa.example/app?mode=client&s="));

        let state = resolve_initial_state(Some(&link), &StoreConfig::default(), &[]);
        assert!(state.from_link);
        assert_eq!(state.config.name, "Padaria Sol");
        assert_eq!(state.config.logo_url, "https://img.example/logo.png");
        assert_eq!(state.config.primary_color, "#ff8800");
        assert_eq!(state.config.whatsapp_number, "+55 (11) 98888-7777");
        assert_eq!(state.prizes, prizes);
    }

    #[test]
    fn test_missing_keys_fall_back_per_field() {
        let payload = general_purpose::STANDARD.encode(r#"{"n":"Mercado","c":""}"#);
        let current = store();
        let state = resolve_initial_state(Some(&payload), &current, &default_prizes());

        assert!(state.from_link);
        assert_eq!(state.config.name, "Mercado");
        assert_eq!(state.config.primary_color, current.primary_color);
        assert_eq!(state.config.logo_url, current.logo_url);
        assert_eq!(state.prizes, default_prizes());
    }

    #[test]
    fn test_legacy_prize_casing_in_payload() {
        let payload = general_purpose::STANDARD
            .encode(r#"{"p":[{"id":"1","name":"Brinde","description":"","iswinning":true}]}"#);
        let state = resolve_initial_state(Some(&payload), &store(), &[]);
        assert!(state.prizes[0].is_winning);
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let current = store();
        for bad in ["%%%", "bm90IGpzb24=", "https://raspa.example/?s=%%%"] {
            let state = resolve_initial_state(Some(bad), &current, &default_prizes());
            assert!(!state.from_link, "payload {bad} should be ignored");
            assert_eq!(state.config, current);
        }

        let none = resolve_initial_state(None, &current, &[]);
        assert!(!none.from_link);
    }

    #[test]
    fn test_redemption_link() {
        let link = redemption_link(&store(), "Ana", "529.982.247-25", "Café grátis", "AB12C")
            .unwrap();
        let url = Url::parse(&link).unwrap();

        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/5511988887777");

        let text = url
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(text.contains("CPF: 52998224725"));
        assert!(text.contains("Código: AB12C"));
        assert!(text.starts_with("🎟️ RESGATE - Padaria Sol"));
    }

    #[test]
    fn test_lead_link_uses_admin_contact() {
        let link = lead_link(&store()).unwrap();
        assert!(link.starts_with("https://wa.me/5564993408657?text="));
    }
}
