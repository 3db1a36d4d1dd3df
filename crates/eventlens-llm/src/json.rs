//! Locate and decode the structured part of a free-text model reply.
//!
//! Models wrap JSON in prose or code fences. The first balanced `{...}`
//! span is taken; braces inside string literals do not count.

use eventlens_core::{Error, Result};
use serde::de::DeserializeOwned;

/// First balanced brace-delimited span in `text`, if any.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode the first JSON span of `reply` as `T`.
///
/// A missing span and an undecodable span are both `Error::Parse`.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let span = extract_json_span(reply)
        .ok_or_else(|| Error::Parse("no JSON object found in reply".into()))?;
    serde_json::from_str(span).map_err(|e| Error::Parse(format!("invalid JSON in reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_span_inside_prose_and_fence() {
        let reply = "Sure:\n```json\n{\"a\": {\"b\": 1}}\n```\nAnything else? {\"c\": 2}";
        assert_eq!(extract_json_span(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let reply = r#"{"reason": "uses {curly} and \"quotes\" }"} trailing"#;
        assert_eq!(
            extract_json_span(reply),
            Some(r#"{"reason": "uses {curly} and \"quotes\" }"}"#)
        );
    }

    #[test]
    fn test_unbalanced_or_missing() {
        assert_eq!(extract_json_span("no json here"), None);
        assert_eq!(extract_json_span("{\"open\": 1"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Reply {
        items: Vec<u32>,
    }

    #[test]
    fn test_parse_errors_are_parse_variant() {
        assert!(matches!(parse_json_reply::<Reply>("nothing"), Err(Error::Parse(_))));
        assert!(matches!(
            parse_json_reply::<Reply>("{\"other\": true}"),
            Err(Error::Parse(_))
        ));
        let ok: Reply = parse_json_reply("result: {\"items\": [1, 2]}").unwrap();
        assert_eq!(ok.items, vec![1, 2]);
    }
}
