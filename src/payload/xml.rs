//! XML body decoding using quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;

use super::{Payload, TEXT_KEY};
use crate::error::{CatalogError, PayloadFormat};

/// An element whose end tag has not been reached yet
#[derive(Debug)]
struct OpenElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Payload)>,
    text: String,
}

impl OpenElement {
    fn start(e: &BytesStart<'_>, body: &str) -> Result<Self, CatalogError> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| xml_error(e, body))?;
            let raw_key = attr.key.as_ref();
            if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error(e, body))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn finish(self) -> (String, Payload) {
        if self.children.is_empty() && self.attributes.is_empty() {
            return (self.name, Payload::String(self.text));
        }

        let mut map = BTreeMap::new();
        for (key, value) in self.attributes {
            map.insert(format!("@{}", key), Payload::String(value));
        }
        for (name, child) in self.children {
            // Elements never finish as lists, so an existing list is a group
            // of same-named siblings.
            let merged = match map.remove(&name) {
                None => child,
                Some(Payload::List(mut items)) => {
                    items.push(child);
                    Payload::List(items)
                }
                Some(previous) => Payload::List(vec![previous, child]),
            };
            map.insert(name, merged);
        }
        // Mixed content: whitespace between child elements is layout
        let text = self.text.trim();
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Payload::String(text.to_string()));
        }
        (self.name, Payload::Map(map))
    }
}

fn xml_error(err: impl std::fmt::Display, body: &str) -> CatalogError {
    CatalogError::decode(PayloadFormat::Xml, err.to_string(), body)
}

/// Attach a finished element to its parent, or make it the document root.
fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<(String, Payload)>,
    element: OpenElement,
    body: &str,
) -> Result<(), CatalogError> {
    let finished = element.finish();
    match stack.last_mut() {
        Some(parent) => parent.children.push(finished),
        None if root.is_none() => *root = Some(finished),
        None => return Err(xml_error("multiple root elements", body)),
    }
    Ok(())
}

/// Parse an XML document into a [`Payload`].
pub(super) fn parse(body: &str) -> Result<Payload, CatalogError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Payload)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(OpenElement::start(&e, body)?),
            Ok(Event::Empty(e)) => {
                let element = OpenElement::start(&e, body)?;
                attach(&mut stack, &mut root, element, body)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("unexpected closing tag", body))?;
                attach(&mut stack, &mut root, element, body)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| xml_error(e, body))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctype
            Ok(_) => {}
            Err(e) => return Err(xml_error(e, body)),
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(format!("unclosed element <{}>", open.name), body));
    }

    let (name, node) = root.ok_or_else(|| xml_error("document has no root element", body))?;
    let mut document = BTreeMap::new();
    document.insert(name, node);
    Ok(Payload::Map(document))
}
