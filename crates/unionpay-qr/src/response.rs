//! Decoding of gateway replies.
//!
//! Replies are dispatched on their declared content type. JSON is the
//! documented format; XML is flattened into the same mapping shape.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Decoded gateway reply.
pub type GatewayResponse = Map<String, Value>;

/// Decode `body` according to its declared `content_type`.
///
/// `json`/`javascript` types are checked first, then `xml`. Anything else,
/// or a body that does not decode to a mapping, yields `None`.
pub fn decode_response(content_type: &str, body: &[u8]) -> Option<GatewayResponse> {
    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("json") || content_type.contains("javascript") {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "gateway reply is not valid JSON");
                None
            }
        }
    } else if content_type.contains("xml") {
        match decode_xml(body) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::debug!(error = %e, "gateway reply is not valid XML");
                None
            }
        }
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error)]
enum XmlError {
    #[error(transparent)]
    Parse(#[from] quick_xml::Error),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("no root element")]
    NoRoot,
}

/// Element under construction.
struct Node {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.insert(key, Value::String(value));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> Value {
        let text = self.text.trim().to_string();

        if self.children.is_empty() && self.attributes.is_empty() {
            return Value::String(text);
        }

        let mut map = self.children;
        if !self.attributes.is_empty() {
            map.insert("@attributes".to_string(), Value::Object(self.attributes));
        }
        if map.len() == 1 && !text.is_empty() && map.contains_key("@attributes") {
            map.insert("#text".to_string(), Value::String(text));
        }
        Value::Object(map)
    }
}

/// Add a child value, turning repeated names into an array.
fn attach(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn decode_xml(body: &[u8]) -> Result<GatewayResponse, XmlError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Value> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(Node::open(&e)?),
            Event::Empty(e) => {
                let node = Node::open(&e)?;
                let name = node.name.clone();
                let value = node.into_value();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.children, name, value),
                    None => root = Some(value),
                }
            }
            Event::Text(e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    let name = node.name.clone();
                    let value = node.into_value();
                    match stack.last_mut() {
                        Some(parent) => attach(&mut parent.children, name, value),
                        None => root = Some(value),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }

    match root {
        Some(Value::Object(map)) => Ok(map),
        Some(text) => {
            let mut map = Map::new();
            map.insert("#text".to_string(), text);
            Ok(map)
        }
        None => Err(XmlError::NoRoot),
    }
}
