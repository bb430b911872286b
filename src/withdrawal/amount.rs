use super::WithdrawalError;
use std::fmt;

/// Decimals of both supported tokens.
pub const TOKEN_DECIMALS: u32 = 18;

/// An amount in base units (`10^-18` of a token).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn from_base_units(units: u128) -> Self {
        TokenAmount(units)
    }

    pub fn base_units(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parses a decimal string such as `"1.25"` into base units. Fraction
    /// digits past [`TOKEN_DECIMALS`] are dropped.
    pub fn parse_decimal(input: &str) -> Result<Self, WithdrawalError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WithdrawalError::EmptyAmount);
        }
        if !is_amount_input(input) || input == "." {
            return Err(WithdrawalError::InvalidAmount(input.to_string()));
        }
        let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
        let whole_units = if whole.is_empty() {
            0u128
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| WithdrawalError::InvalidAmount(input.to_string()))?
        };
        let fraction: String = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(TOKEN_DECIMALS as usize)
            .collect();
        let fraction_units = fraction
            .parse::<u128>()
            .map_err(|_| WithdrawalError::InvalidAmount(input.to_string()))?;
        whole_units
            .checked_mul(one_token())
            .and_then(|units| units.checked_add(fraction_units))
            .map(TokenAmount)
            .ok_or_else(|| WithdrawalError::InvalidAmount(input.to_string()))
    }

    /// Approximate value in whole tokens, for price estimates.
    pub fn as_tokens_f64(self) -> f64 {
        self.0 as f64 / one_token() as f64
    }

    /// Whole tokens with exactly `places` decimals, truncated.
    pub fn format_fixed(self, places: u32) -> String {
        let places = places.min(TOKEN_DECIMALS);
        let whole = self.0 / one_token();
        if places == 0 {
            return whole.to_string();
        }
        let fraction = self.0 % one_token();
        let scaled = fraction / 10u128.pow(TOKEN_DECIMALS - places);
        format!("{whole}.{scaled:0width$}", width = places as usize)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / one_token();
        let fraction = self.0 % one_token();
        if fraction == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{:018}", fraction);
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

fn one_token() -> u128 {
    10u128.pow(TOKEN_DECIMALS)
}

/// Whether `input` is acceptable as (partial) amount text: digits with at
/// most one decimal point. The empty string is accepted so the field can be
/// cleared.
pub fn is_amount_input(input: &str) -> bool {
    let mut seen_point = false;
    for c in input.chars() {
        match c {
            '0'..='9' => {}
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    true
}

/// USD value of the typed amount at `price`; 0 when the text is not a number.
pub fn usd_estimate(input: &str, price: f64) -> f64 {
    match TokenAmount::parse_decimal(input) {
        Ok(amount) => {
            let value = amount.as_tokens_f64() * price;
            if value.is_finite() { value } else { 0.0 }
        }
        Err(_) => 0.0,
    }
}
