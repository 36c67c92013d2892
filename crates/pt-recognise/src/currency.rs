/// Currencies a pot amount may be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Btc,
    Eth,
    Chips,
}

impl Currency {
    /// Matches a leading or trailing currency marker, falling back to
    /// `Chips` when none is present (play-money tables rarely show one).
    pub fn detect(raw: &str) -> Currency {
        let trimmed = raw.trim();
        if trimmed.contains('$') {
            Currency::Usd
        } else if trimmed.contains('€') {
            Currency::Eur
        } else if trimmed.contains('£') {
            Currency::Gbp
        } else if trimmed.contains('₿') {
            Currency::Btc
        } else if trimmed.contains('Ξ') {
            Currency::Eth
        } else {
            Currency::Chips
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Chips => "CHIPS",
        };
        write!(f, "{symbol}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_symbols() {
        assert_eq!(Currency::detect("$12.50"), Currency::Usd);
        assert_eq!(Currency::detect("€12,50"), Currency::Eur);
        assert_eq!(Currency::detect("1,200"), Currency::Chips);
    }
}
