use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger timestamps are stored as `dd/mm/yyyy, HH:MM:SS` strings. The date
/// portion before the comma is what same-day eligibility compares against.
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";
pub const LEDGER_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_winning: bool,
}

impl Prize {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        is_winning: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            is_winning,
        }
    }
}

/// Pool used whenever the configured one is empty.
pub fn default_prizes() -> Vec<Prize> {
    vec![
        Prize::new("1", "10% de Desconto", "Ganhou 10% na próxima compra!", true),
        Prize::new("2", "Brinde Surpresa", "Retire um brinde no balcão!", true),
        Prize::new("3", "Vale R$ 20,00", "Desconto direto no caixa.", true),
        Prize::new("4", "Tente Novamente", "Não foi dessa vez!", false),
    ]
}

/// One persisted outcome of a completed play. Prize fields are a snapshot
/// taken at reveal time, not a reference into the prize pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub id: String,
    pub user_name: String,
    pub user_identity: String,
    pub prize_name: String,
    pub prize_code: String,
    pub timestamp: String,
}

impl Winner {
    /// Date portion of the stored timestamp, if it has one.
    pub fn date_portion(&self) -> Option<&str> {
        let date = self.timestamp.split(',').next()?.trim();
        if date.is_empty() {
            None
        } else {
            Some(date)
        }
    }
}

pub fn ledger_timestamp(at: NaiveDateTime) -> String {
    at.format(LEDGER_TIMESTAMP_FORMAT).to_string()
}

pub fn ledger_date(at: NaiveDateTime) -> String {
    at.format(LEDGER_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformClient {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub monthly_value: f64,
    pub start_date: String,
    pub is_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub name: String,
    pub logo_url: String,
    pub primary_color: String,
    /// Number that receives redemption messages.
    pub whatsapp_number: String,
    pub admin_password: String,
    /// Number that receives "I want my own scratch card" leads.
    pub admin_contact_number: String,
    pub global_admin_password: String,
    pub platform_clients: Vec<PlatformClient>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "JG".to_string(),
            logo_url: "https://cdn-icons-png.flaticon.com/512/606/606547.png".to_string(),
            primary_color: "#4f46e5".to_string(),
            whatsapp_number: "5564993071404".to_string(),
            admin_password: "admin".to_string(),
            admin_contact_number: "5564993408657".to_string(),
            global_admin_password: "123".to_string(),
            platform_clients: Vec::new(),
        }
    }
}

/// The three synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Config,
    Prizes,
    Winners,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Config, Collection::Prizes, Collection::Winners];

    /// Key under which the collection is kept in the local fallback store.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Collection::Config => "scratch_config",
            Collection::Prizes => "scratch_prizes",
            Collection::Winners => "scratch_winners",
        }
    }

    /// Remote table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Config => "store_config",
            Collection::Prizes => "prizes",
            Collection::Winners => "winners",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// In-memory view of all three collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub config: StoreConfig,
    pub prizes: Vec<Prize>,
    pub winners: Vec<Winner>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_ledger_timestamp_format() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();

        assert_eq!(ledger_timestamp(at), "07/03/2026, 09:05:01");
        assert_eq!(ledger_date(at), "07/03/2026");
    }

    #[test]
    fn test_date_portion() {
        let mut winner = Winner {
            id: "1".to_string(),
            user_name: "Ana".to_string(),
            user_identity: "52998224725".to_string(),
            prize_name: "Brinde".to_string(),
            prize_code: "AB12C".to_string(),
            timestamp: "07/03/2026, 09:05:01".to_string(),
        };
        assert_eq!(winner.date_portion(), Some("07/03/2026"));

        winner.timestamp = String::new();
        assert_eq!(winner.date_portion(), None);
    }

    #[test]
    fn test_default_pool_not_empty() {
        let pool = default_prizes();
        assert_eq!(pool.len(), 4);
        assert!(pool.iter().any(|p| !p.is_winning));
    }
}
