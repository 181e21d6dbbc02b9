use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps contact details (phone numbers, emails) so that `Debug` and
/// `Display` only ever show the last four characters.
///
/// Serialization emits the real value: API responses go to the owner of the
/// data, log macros do not.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let value = self.0.as_ref();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }

    pub fn expose(&self) -> &str {
        self.0.as_ref()
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_last_four() {
        let phone = Masked("9876543210".to_string());
        assert_eq!(phone.to_string(), "******3210");
        assert_eq!(format!("{:?}", phone), "Masked(******3210)");
    }

    #[test]
    fn test_short_values_fully_hidden() {
        let code = Masked("123".to_string());
        assert_eq!(code.to_string(), "****");
    }

    #[test]
    fn test_serializes_real_value() {
        let phone = Masked("9876543210".to_string());
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"9876543210\"");
    }
}
