use std::collections::HashMap;

use thiserror::Error;

/// Keys understood by `add`-style input, e.g. `pri:high due:tomorrow`.
pub const TASK_KEYS: &[&str] = &["due", "priority", "status"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub text: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    #[error("unknown key: '{0}'")]
    Unknown(String),
    #[error("ambiguous key: '{0}' matches {1:?}")]
    Ambiguous(String, Vec<String>),
}

/// Splits free words from `key:value` tokens.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut words = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                metadata.insert(key.to_lowercase(), value.to_string());
                continue;
            }
        }
        words.push(arg.as_str());
    }

    ParsedInput {
        text: words.join(" "),
        metadata,
    }
}

/// Expands a key by exact match or unique prefix.
pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String, KeyError> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<String> = candidates
        .iter()
        .filter(|c| c.starts_with(key))
        .map(|c| c.to_string())
        .collect();

    match matches.len() {
        1 => Ok(matches[0].clone()),
        0 => Err(KeyError::Unknown(key.to_string())),
        _ => Err(KeyError::Ambiguous(key.to_string(), matches)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let args = vec![
            "Buy".to_string(),
            "milk".to_string(),
            "due:tomorrow".to_string(),
            "Pri:high".to_string(),
        ];
        let parsed = parse_args(&args);
        assert_eq!(parsed.text, "Buy milk");
        assert_eq!(parsed.metadata.get("due"), Some(&"tomorrow".to_string()));
        assert_eq!(parsed.metadata.get("pri"), Some(&"high".to_string()));
    }

    #[test]
    fn test_words_with_colons_stay_in_text() {
        let args = vec!["Call".to_string(), "at".to_string(), "10:30".to_string(), ":)".to_string()];
        let parsed = parse_args(&args);
        assert_eq!(parsed.text, "Call at 10:30 :)");
        assert!(parsed.metadata.is_empty());
    }

    #[test]
    fn test_expand_key() {
        assert_eq!(expand_key("d", TASK_KEYS).unwrap(), "due");
        assert_eq!(expand_key("due", TASK_KEYS).unwrap(), "due");
        assert_eq!(expand_key("pri", TASK_KEYS).unwrap(), "priority");
        assert_eq!(expand_key("st", TASK_KEYS).unwrap(), "status");

        assert_eq!(expand_key("x", TASK_KEYS), Err(KeyError::Unknown("x".to_string())));

        let candidates = ["project", "priority"];
        assert!(matches!(expand_key("pr", &candidates), Err(KeyError::Ambiguous(..))));
    }
}
