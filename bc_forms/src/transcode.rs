use log::warn;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::io::Cursor;

/// Wire format of a structured text-area field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
}

impl DataFormat {
    pub fn parse(code: Option<&str>) -> Self {
        match code {
            Some("xml") => DataFormat::Xml,
            _ => DataFormat::Json,
        }
    }
}

/// Decodes a field payload string into a plain object tree for the
/// structured editor. Malformed payloads are logged and substituted with an
/// empty object; this path never fails.
pub fn decode_field(raw: &str, format: DataFormat) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    let decoded = match format {
        DataFormat::Json => serde_json::from_str(raw).map_err(|err| err.to_string()),
        DataFormat::Xml => xml_to_value(raw),
    };
    match decoded {
        Ok(value) => value,
        Err(err) => {
            warn!("malformed {format:?} field payload, substituting empty object: {err}");
            Value::Object(Map::new())
        }
    }
}

/// Encodes an edited object tree back into the field's wire format string.
pub fn encode_field(value: &Value, format: DataFormat) -> String {
    match format {
        DataFormat::Json => value.to_string(),
        DataFormat::Xml => value_to_xml(value),
    }
}

fn xml_to_value(raw: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(raw);
    // Stack of open elements: name, object children, pending text content.
    let mut stack: Vec<(String, Map<String, Value>, Option<String>)> = Vec::new();
    let mut root = Map::new();

    loop {
        match reader.read_event().map_err(|err| err.to_string())? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                stack.push((name, Map::new(), None));
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|err| err.to_string())?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some((_, _, slot)) = stack.last_mut() {
                        *slot = Some(trimmed.to_string());
                    }
                }
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                let value = Value::String(String::new());
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.1, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::End(_) => {
                let (name, children, text) = stack.pop().ok_or("unbalanced closing tag")?;
                let value = if !children.is_empty() {
                    Value::Object(children)
                } else {
                    Value::String(text.unwrap_or_default())
                };
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.1, name, value),
                    None => insert_child(&mut root, name, value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unclosed element".to_string());
    }
    Ok(Value::Object(root))
}

/// Repeated sibling elements collapse into an array under one key.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

fn value_to_xml(value: &Value) -> String {
    fn write_pair(
        writer: &mut Writer<Cursor<Vec<u8>>>,
        name: &str,
        value: &Value,
    ) -> Result<(), String> {
        match value {
            Value::Array(items) => {
                for item in items {
                    write_pair(writer, name, item)?;
                }
            }
            Value::Object(map) => {
                writer
                    .write_event(Event::Start(BytesStart::new(name)))
                    .map_err(|err| err.to_string())?;
                for (key, child) in map {
                    write_pair(writer, key, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(|err| err.to_string())?;
            }
            scalar => {
                let text = match scalar {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                writer
                    .write_event(Event::Start(BytesStart::new(name)))
                    .map_err(|err| err.to_string())?;
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(|err| err.to_string())?;
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(|err| err.to_string())?;
            }
        }
        Ok(())
    }

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let written = match value {
        Value::Object(map) => map
            .iter()
            .try_for_each(|(key, child)| write_pair(&mut writer, key, child)),
        other => write_pair(&mut writer, "value", other),
    };
    if let Err(err) = written {
        warn!("failed to encode field payload as xml: {err}");
        return String::new();
    }
    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}
