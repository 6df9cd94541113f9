//! JSON body decoding.

use super::Payload;
use crate::error::{CatalogError, PayloadFormat};

/// Parse a JSON body into a [`Payload`], failing fast on malformed syntax.
pub(super) fn parse(body: &str) -> Result<Payload, CatalogError> {
    serde_json::from_str::<serde_json::Value>(body)
        .map(Payload::from)
        .map_err(|e| CatalogError::decode(PayloadFormat::Json, e.to_string(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let payload = parse(r#"{"response":{"numFound":2,"docs":[{"id":"a"},{"id":"b"}]}}"#)
            .unwrap();
        let docs = payload.get_path("response.docs").unwrap().items();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].field_text("id"), "b");
    }

    #[test]
    fn test_malformed_json_carries_snippet() {
        let err = parse(r#"{"response": {"docs": [}"#).unwrap_err();
        match err {
            CatalogError::Decode { format, snippet, .. } => {
                assert_eq!(format, PayloadFormat::Json);
                assert!(snippet.contains("docs"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_is_an_error() {
        assert!(parse("").is_err());
    }
}
