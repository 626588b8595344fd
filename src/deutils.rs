// src/deutils.rs
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn default_false() -> bool { false }

pub fn deserialize_bool_from_anything<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    let s = v.to_string().trim_matches('"').trim().to_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "y" | "t" => Ok(true),
        "0" | "false" | "no"  | "n" | "f" | "null" => Ok(false),
        _ => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Str(s.as_str()),
            &"expected boolean representation",
        )),
    }
}

/// Address attribute as written by the operator.
///
/// Quoted text is kept verbatim so "0x70" and "112" both survive; a bare YAML
/// or JSON integer is turned back into decimal text. Parsing into a bus
/// address happens later, in validation.
pub fn deserialize_address_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => n
            .as_u64()
            .map(|n| Some(n.to_string()))
            .ok_or_else(|| D::Error::custom("address must be a non-negative integer")),
        other => Err(D::Error::custom(format!("address must be text or an integer, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_address_text")]
        address: Option<String>,
        #[serde(default = "default_false", deserialize_with = "deserialize_bool_from_anything")]
        flag: bool,
    }

    #[test]
    fn test_address_text_kept_verbatim() {
        let p: Probe = serde_json::from_str(r#"{"address": "0x70"}"#).unwrap();
        assert_eq!(p.address.as_deref(), Some("0x70"));
        assert!(!p.flag);
    }

    #[test]
    fn test_address_integer_becomes_decimal_text() {
        let p: Probe = serde_yaml::from_str("address: 0x71\nflag: yes\n").unwrap();
        assert_eq!(p.address.as_deref(), Some("113"));
        assert!(p.flag);
    }

    #[test]
    fn test_address_rejects_negative() {
        assert!(serde_json::from_str::<Probe>(r#"{"address": -1}"#).is_err());
    }

    #[test]
    fn test_bool_rejects_garbage() {
        assert!(serde_json::from_str::<Probe>(r#"{"flag": "maybe"}"#).is_err());
    }
}
