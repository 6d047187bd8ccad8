//! Conversion of API response bodies into nested `serde_json::Value` documents.
//!
//! XML maps onto JSON the same way for every resource:
//!
//! - an element becomes a key in its parent object
//! - repeated sibling elements become an array under one key
//! - attributes become `@name` keys
//! - text of an element without attributes or children becomes a string;
//!   text next to attributes or children is kept under `#text`
//! - an empty element becomes `null`

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::FantasyApiError;

/// Root element wrapping every fantasy API response
pub const ROOT_ELEMENT: &str = "fantasy_content";

fn document_error(err: impl std::fmt::Display) -> FantasyApiError {
    FantasyApiError::Document(err.to_string())
}

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn root() -> Self {
        Self {
            name: String::new(),
            fields: Map::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, FantasyApiError> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(document_error)?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value().map_err(document_error)?;
            fields.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn into_value(mut self) -> Value {
        if self.fields.is_empty() {
            if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            }
        } else {
            if !self.text.is_empty() {
                self.fields.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(self.fields)
        }
    }
}

fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn close(stack: &mut Vec<Frame>, frame: Frame) -> Result<(), FantasyApiError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| document_error("unbalanced closing tag"))?;
    let name = frame.name.clone();
    insert_child(&mut parent.fields, name, frame.into_value());
    Ok(())
}

/// Parse an XML body into a document whose single top-level key is the
/// root element
pub fn xml_to_document(xml: &str) -> Result<Value, FantasyApiError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Frame::root()];
    loop {
        match reader.read_event().map_err(document_error)? {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let frame = Frame::open(&start)?;
                close(&mut stack, frame)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(document_error("unbalanced closing tag"));
                }
                if let Some(frame) = stack.pop() {
                    close(&mut stack, frame)?;
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(document_error)?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match stack.pop() {
        Some(root) if stack.is_empty() => Ok(Value::Object(root.fields)),
        _ => Err(document_error("unexpected end of document")),
    }
}

/// Pick the resource element out of a full response document.
///
/// Unwraps [`ROOT_ELEMENT`], descends through `nest`, then returns the child
/// named `tag`, or the current node when there is no such child.
pub fn extract(document: Value, tag: &str, nest: &[&str]) -> Value {
    let mut content = match document {
        Value::Object(mut map) if map.contains_key(ROOT_ELEMENT) => {
            map.remove(ROOT_ELEMENT).unwrap_or(Value::Null)
        }
        other => other,
    };

    for key in nest {
        content = match content {
            Value::Object(mut map) => map.remove(*key).unwrap_or(Value::Null),
            _ => Value::Null,
        };
    }

    match content {
        Value::Object(mut map) if map.contains_key(tag) => map.remove(tag).unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STANDINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fantasy_content xml:lang="en-US" yahoo:uri="/fantasy/v2/league/423.l.1/standings" time="31ms">
  <league>
    <league_key>423.l.1</league_key>
    <name>Bench &amp; Bourbon</name>
    <draft_status/>
    <standings>
      <teams count="2">
        <team><team_key>423.l.1.t.1</team_key><name>Alpha</name></team>
        <team><team_key>423.l.1.t.2</team_key><name>Bravo</name></team>
      </teams>
    </standings>
  </league>
</fantasy_content>"#;

    #[test]
    fn converts_nested_elements_attributes_and_repeats() {
        let doc = xml_to_document(STANDINGS_XML).unwrap();
        let league = &doc["fantasy_content"]["league"];

        assert_eq!(doc["fantasy_content"]["@xml:lang"], "en-US");
        assert_eq!(league["name"], "Bench & Bourbon");
        assert_eq!(league["draft_status"], Value::Null);

        let teams = &league["standings"]["teams"];
        assert_eq!(teams["@count"], "2");
        assert_eq!(teams["team"][1]["name"], "Bravo");
        assert_eq!(teams["team"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn keeps_text_beside_attributes() {
        let doc = xml_to_document(r#"<points type="week">102.5</points>"#).unwrap();
        assert_eq!(doc, json!({"points": {"@type": "week", "#text": "102.5"}}));
    }

    #[test]
    fn extract_unwraps_root_and_nest() {
        let doc = xml_to_document(STANDINGS_XML).unwrap();

        let standings = extract(doc.clone(), "standings", &["league"]);
        assert_eq!(standings["teams"]["@count"], "2");

        let league = extract(doc, "league", &[]);
        assert_eq!(league["league_key"], "423.l.1");
    }

    #[test]
    fn extract_returns_node_when_tag_is_missing() {
        let doc = json!({"fantasy_content": {"users": {"count": "1"}}});
        assert_eq!(extract(doc, "league", &[]), json!({"users": {"count": "1"}}));
    }

    #[test]
    fn rejects_truncated_xml() {
        assert!(xml_to_document("<fantasy_content><league>").is_err());
    }
}
