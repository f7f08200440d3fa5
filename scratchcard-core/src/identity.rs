//! Identity number handling (Brazilian CPF).

/// Strip everything except ASCII digits.
pub fn normalize_identity(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check-digit validation. Punctuation is ignored.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = normalize_identity(raw)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

fn check_digit(slice: &[u32]) -> u32 {
    let factor = slice.len() as u32 + 1;
    let sum: u32 = slice
        .iter()
        .enumerate()
        .map(|(idx, digit)| digit * (factor - idx as u32))
        .sum();
    let result = (sum * 10) % 11;
    if result == 10 {
        0
    } else {
        result
    }
}
