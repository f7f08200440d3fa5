use rand::Rng;
use scratchcard_core::types::default_prizes;
use scratchcard_core::Prize;
use serde::{Deserialize, Serialize};

pub const CODE_LENGTH: usize = 5;
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Prize drawn for one attempt together with its redemption code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub prize: Prize,
    pub code: String,
}

pub fn allocate(pool: &[Prize]) -> Allocation {
    allocate_with(pool, &mut rand::thread_rng())
}

/// Uniform draw over `pool`; an empty pool is replaced by the default one.
pub fn allocate_with<R: Rng + ?Sized>(pool: &[Prize], rng: &mut R) -> Allocation {
    let fallback;
    let pool = if pool.is_empty() {
        tracing::debug!("Prize pool empty, drawing from default pool");
        fallback = default_prizes();
        fallback.as_slice()
    } else {
        pool
    };

    let prize = pool[rng.gen_range(0..pool.len())].clone();

    Allocation {
        prize,
        code: redemption_code(rng),
    }
}

/// Short uppercase alphanumeric code. Not checked against the ledger.
pub fn redemption_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_code(code: &str) -> bool {
        code.len() == CODE_LENGTH
            && code
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    }

    #[test]
    fn test_empty_pool_uses_default() {
        let allocation = allocate(&[]);
        assert!(default_prizes().contains(&allocation.prize));
        assert!(is_code(&allocation.code));
    }

    #[test]
    fn test_draw_stays_in_pool() {
        let pool = vec![
            Prize::new("a", "A", "", true),
            Prize::new("b", "B", "", false),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_a = false;
        let mut seen_b = false;

        for _ in 0..200 {
            let allocation = allocate_with(&pool, &mut rng);
            assert!(pool.contains(&allocation.prize));
            assert!(is_code(&allocation.code));
            seen_a |= allocation.prize.id == "a";
            seen_b |= allocation.prize.id == "b";
        }

        assert!(seen_a && seen_b);
    }
}
