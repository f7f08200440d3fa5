use crate::{PlayError, Result};
use chrono::NaiveDateTime;
use scratchcard_core::identity::{is_valid_cpf, normalize_identity};
use scratchcard_core::types::ledger_date;
use scratchcard_core::Winner;

/// Whether `identity` may start a play on the calendar day of `now`.
///
/// Only same-day records disqualify. Ledger entries without an identity or
/// a dated timestamp are ignored.
pub fn may_play(identity: &str, ledger: &[Winner], now: NaiveDateTime) -> bool {
    let identity = normalize_identity(identity);
    let today = ledger_date(now);

    !ledger.iter().any(|entry| {
        let entry_identity = normalize_identity(&entry.user_identity);
        !entry_identity.is_empty()
            && entry_identity == identity
            && entry.date_portion() == Some(today.as_str())
    })
}

/// Digits-only identity, rejected unless it is a well-formed CPF.
pub fn validate_identity(raw: &str) -> Result<String> {
    let identity = normalize_identity(raw);
    if identity.is_empty() {
        return Err(PlayError::invalid_claim("identity is required"));
    }
    if !is_valid_cpf(&identity) {
        return Err(PlayError::invalid_claim(format!(
            "identity {} is not a valid CPF",
            identity
        )));
    }
    Ok(identity)
}

pub fn check_eligibility(identity: &str, ledger: &[Winner], now: NaiveDateTime) -> Result<()> {
    if may_play(identity, ledger, now) {
        Ok(())
    } else {
        tracing::info!("Rejected replay for identity {}", normalize_identity(identity));
        Err(PlayError::AlreadyPlayedToday {
            identity: normalize_identity(identity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    fn entry(identity: &str, timestamp: &str) -> Winner {
        Winner {
            id: "1".to_string(),
            user_name: "Ana".to_string(),
            user_identity: identity.to_string(),
            prize_name: "Brinde".to_string(),
            prize_code: "AB12C".to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_same_day_blocks() {
        let ledger = vec![entry("52998224725", "18/10/2026, 08:00:00")];

        assert!(!may_play("52998224725", &ledger, at(18, 23)));
        assert!(!may_play("529.982.247-25", &ledger, at(18, 0)));
        assert!(check_eligibility("52998224725", &ledger, at(18, 9)).is_err());
    }

    #[test]
    fn test_other_days_and_identities_pass() {
        let ledger = vec![entry("52998224725", "17/10/2026, 23:59:59")];

        assert!(may_play("52998224725", &ledger, at(18, 0)));
        assert!(may_play("11144477735", &ledger, at(17, 12)));
        assert!(may_play("52998224725", &[], at(18, 12)));
    }

    #[test]
    fn test_formatted_ledger_identity_matches() {
        let ledger = vec![entry("529.982.247-25", "18/10/2026, 08:00:00")];
        assert!(!may_play("52998224725", &ledger, at(18, 10)));
    }

    #[test]
    fn test_validate_identity() {
        assert_eq!(validate_identity("529.982.247-25").unwrap(), "52998224725");
        assert!(matches!(
            validate_identity("123.456.789-00"),
            Err(PlayError::InvalidClaim(_))
        ));
        assert!(matches!(
            validate_identity("abc"),
            Err(PlayError::InvalidClaim(_))
        ));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let ledger = vec![
            entry("", "18/10/2026, 08:00:00"),
            entry("52998224725", ""),
            entry("52998224725", ", 08:00:00"),
        ];

        assert!(may_play("52998224725", &ledger, at(18, 10)));
        assert!(may_play("", &ledger, at(18, 10)));
    }
}
