use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer data so it never reaches log output in clear.
///
/// `Debug` and `Display` mask the value; serialization passes it through
/// because API responses and commit payloads need the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(self.0.as_ref()))
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(self.0.as_ref()))
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

/// Keeps the first character of the local part and the whole domain of an
/// e-mail address; anything else is fully masked.
fn mask(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        _ => "********".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_partially_masked() {
        let email = Masked("jane.doe@example.com".to_string());
        assert_eq!(format!("{email}"), "j***@example.com");
        assert_eq!(format!("{email:?}"), "j***@example.com");
    }

    #[test]
    fn test_non_email_is_fully_masked() {
        assert_eq!(format!("{}", Masked("+64 21 555 0100")), "********");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let email = Masked("jane@example.com");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"jane@example.com\"");
    }
}
