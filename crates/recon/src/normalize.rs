use serde::Deserialize;

/// Separator between the invoice and order parts of a composite key.
pub const KEY_SEPARATOR: &str = "|";

/// How id cells are cleaned before they become part of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Trim, then drop every non-digit ("001-A" -> "001"). Alphanumeric ids
    /// lose their letters and may collapse to an empty string.
    #[default]
    DigitsOnly,
    /// Trim surrounding whitespace only. Ids may then contain the key
    /// separator, and "1|2" + "3" builds the same key as "1" + "2|3"; the
    /// engine counts such rows and warns.
    Trimmed,
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DigitsOnly => write!(f, "digits_only"),
            Self::Trimmed => write!(f, "trimmed"),
        }
    }
}

impl std::str::FromStr for KeyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "digits_only" | "digits" => Ok(Self::DigitsOnly),
            "trimmed" | "trim" => Ok(Self::Trimmed),
            other => Err(format!("unknown key mode '{other}' (expected digits_only or trimmed)")),
        }
    }
}

/// Normalize one id cell. Idempotent for both modes.
pub fn normalize_id(value: &str, mode: KeyMode) -> String {
    let trimmed = value.trim();
    match mode {
        KeyMode::DigitsOnly => trimmed.chars().filter(|c| c.is_ascii_digit()).collect(),
        KeyMode::Trimmed => trimmed.to_string(),
    }
}

/// `invoice + separator + order`, both parts already normalized.
pub fn composite_key(invoice: &str, order: &str, separator: &str) -> String {
    let mut key = String::with_capacity(invoice.len() + separator.len() + order.len());
    key.push_str(invoice);
    key.push_str(separator);
    key.push_str(order);
    key
}
