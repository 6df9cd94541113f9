//! Build normalized collections out of decoded Solr replies.
//!
//! Solr serializes its named lists differently depending on `json.nl`:
//! `arrarr` gives `[[name, value], ...]`, `flat` gives `[name, value, ...]`
//! and `map` gives an object. All three are accepted here.

use crate::models::{NormalizedRecord, RecordCollection, Spellcheck, SpellingSuggestion, TermCount, Terms};
use crate::payload::Payload;

/// Entries of a Solr named list in any of its JSON shapes
fn named_entries(node: &Payload) -> Vec<(String, &Payload)> {
    match node {
        Payload::Map(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Payload::List(items) => {
            let pairs: Option<Vec<_>> = items
                .iter()
                .map(|item| match item {
                    Payload::List(pair) if pair.len() == 2 => pair[0].as_str().map(|name| (name.to_string(), &pair[1])),
                    _ => None,
                })
                .collect();
            if let Some(pairs) = pairs {
                return pairs;
            }

            if items.len() % 2 == 0 {
                let flat: Option<Vec<_>> = items
                    .chunks(2)
                    .map(|chunk| chunk[0].as_str().map(|name| (name.to_string(), &chunk[1])))
                    .collect();
                if let Some(flat) = flat {
                    return flat;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn entry<'a>(entries: &[(String, &'a Payload)], name: &str) -> Option<&'a Payload> {
    entries.iter().find(|(key, _)| key == name).map(|(_, value)| *value)
}

/// Engine-reported `responseHeader.QTime`, in any named list shape
pub fn query_time(payload: &Payload) -> Option<u64> {
    payload
        .get("responseHeader")
        .and_then(|header| entry(&named_entries(header), "QTime"))
        .and_then(Payload::as_u64)
}

/// Create a record collection from a decoded select reply.
///
/// Documents without a value for `unique_key` are skipped.
pub fn record_collection(payload: &Payload, unique_key: &str) -> RecordCollection {
    let mut collection = RecordCollection::default();

    if let Some(response) = payload.get("response") {
        collection.total = response.get("numFound").and_then(Payload::as_u64).unwrap_or(0);
        collection.offset = response.get("start").and_then(Payload::as_u64).unwrap_or(0);

        for doc in response.get("docs").map(Payload::items).unwrap_or_default() {
            let Some(fields) = doc.as_map() else {
                continue;
            };
            let id = doc.field_text(unique_key);
            if id.is_empty() {
                tracing::warn!(unique_key, "Skipping document without a key");
                continue;
            }
            let mut record = NormalizedRecord::new(id);
            record.fields = fields.clone();
            collection.add(record);
        }
    }

    collection.query_time = query_time(payload);

    if let Some(block) = payload.get("spellcheck") {
        collection.spellcheck = spellcheck(block);
    }

    collection
}

/// Parse the `spellcheck` block of a reply
pub fn spellcheck(block: &Payload) -> Spellcheck {
    let mut result = Spellcheck::default();
    let Some(suggestions) = block.get("suggestions") else {
        return result;
    };

    for (term, info) in named_entries(suggestions) {
        if term == "correctlySpelled" || term.starts_with("collation") {
            continue;
        }
        let info = named_entries(info);
        let words: Vec<String> = entry(&info, "suggestion")
            .map(Payload::items)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|word| match word {
                Payload::String(s) => Some(s.clone()),
                // extendedResults: {word, freq}
                other => entry(&named_entries(other), "word").and_then(Payload::text),
            })
            .collect();
        let num_found = entry(&info, "numFound")
            .and_then(Payload::as_u64)
            .unwrap_or(words.len() as u64);

        result.suggestions.push(SpellingSuggestion {
            term,
            num_found,
            suggestions: words,
        });
    }
    result
}

/// Parse the `terms` block of a terms handler reply
pub fn terms(payload: &Payload) -> Terms {
    let mut result = Terms::default();
    let Some(block) = payload.get("terms") else {
        return result;
    };

    for (field, list) in named_entries(block) {
        let counts = named_entries(list)
            .into_iter()
            .map(|(term, count)| TermCount {
                term,
                count: count.as_u64().unwrap_or(0),
            })
            .collect();
        result.fields.insert(field, counts);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_collection_from_select_reply() {
        let payload = Payload::from(json!({
            "responseHeader": [["status", 0], ["QTime", 12]],
            "response": {
                "numFound": 42,
                "start": 10,
                "docs": [
                    {"id": "wbm-1", "title": ["Bleak House"]},
                    {"title": "no key"},
                    {"id": "wbm-2", "title": "Hard Times"}
                ]
            }
        }));

        let collection = record_collection(&payload, "id");
        assert_eq!(collection.total, 42);
        assert_eq!(collection.offset, 10);
        assert_eq!(collection.query_time, Some(12));
        assert_eq!(collection.ids(), vec!["wbm-1", "wbm-2"]);
        assert_eq!(collection.records[0].title().as_deref(), Some("Bleak House"));
        assert!(collection.spellcheck.is_empty());
    }

    #[test]
    fn test_spellcheck_arrarr_form() {
        let block = Payload::from(json!({
            "suggestions": [
                ["histroy", [["numFound", 2], ["startOffset", 0], ["suggestion", ["history", "histology"]]]],
                ["correctlySpelled", false]
            ]
        }));

        let parsed = spellcheck(&block);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.suggestions[0].term, "histroy");
        assert_eq!(parsed.suggestions[0].num_found, 2);
        assert_eq!(parsed.suggestions[0].suggestions, vec!["history", "histology"]);
    }

    #[test]
    fn test_spellcheck_extended_results() {
        let block = Payload::from(json!({
            "suggestions": {
                "hte": {"numFound": 1, "suggestion": [{"word": "the", "freq": 900}]}
            }
        }));

        let parsed = spellcheck(&block);
        assert_eq!(parsed.suggestions[0].suggestions, vec!["the"]);
    }

    #[test]
    fn test_terms_arrarr_and_flat_forms() {
        let arrarr = Payload::from(json!({"terms": [["title", [["bleak", 3], ["house", 1]]]]}));
        let flat = Payload::from(json!({"terms": {"title": ["bleak", 3, "house", 1]}}));

        for payload in [arrarr, flat] {
            let parsed = terms(&payload);
            let title = parsed.field("title");
            assert_eq!(title.len(), 2);
            assert_eq!(title[0].term, "bleak");
            assert_eq!(title[0].count, 3);
            assert_eq!(title[1].term, "house");
        }
    }

    #[test]
    fn test_missing_blocks_give_empty_results() {
        let payload = Payload::from(json!({"responseHeader": {"status": 0}}));
        assert!(record_collection(&payload, "id").is_empty());
        assert!(terms(&payload).fields.is_empty());
    }
}
