//! Reply parsing and payload extraction.
//!
//! SOAP replies are turned into a `serde_json::Value` tree first so SOAP and
//! OData replies share one navigation and mapping path. The tree follows the
//! usual XML-to-JSON conventions: namespace prefixes and attributes are
//! dropped, text-only elements become strings, empty elements become `""` and
//! repeated sibling elements collapse into an array.

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::portals::{OutputField, ResultShape};
use crate::sap::convert;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("missing {0}")]
    MissingNode(String),

    #[error("{0} is not a record")]
    NotRecord(String),
}

static EMPTY: Value = Value::Null;

struct Frame {
    name: String,
    text: String,
    children: Map<String, Value>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Map::new(),
        }
    }

    fn finish(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            Value::String(self.text)
        } else {
            Value::Object(self.children)
        };
        (self.name, value)
    }
}

fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
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

fn local_name(name: QName<'_>) -> Result<String, ExtractError> {
    std::str::from_utf8(name.local_name().as_ref())
        .map(str::to_owned)
        .map_err(|e| ExtractError::Xml(e.to_string()))
}

/// Parses an XML document; the result is an object with the root element as its only key.
pub fn parse_xml(body: &str) -> Result<Value, ExtractError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Xml(e.to_string()))?;
        let finished = match event {
            Event::Start(start) => {
                stack.push(Frame::new(local_name(start.name())?));
                None
            }
            Event::Empty(start) => Some((local_name(start.name())?, Value::String(String::new()))),
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| ExtractError::Xml(e.to_string()))?;
                    frame.text.push_str(&text);
                }
                None
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
                None
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ExtractError::Xml("unbalanced end tag".to_string()))?;
                Some(frame.finish())
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, value)) = finished {
            match stack.last_mut() {
                Some(parent) => insert_child(&mut parent.children, name, value),
                None if root.is_none() => {
                    let mut document = Map::new();
                    document.insert(name, value);
                    root = Some(Value::Object(document));
                }
                None => return Err(ExtractError::Xml("multiple root elements".to_string())),
            }
        }
    }

    if !stack.is_empty() {
        return Err(ExtractError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| ExtractError::Xml("document has no root element".to_string()))
}

pub fn parse_json(body: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(body).map_err(|e| ExtractError::Json(e.to_string()))
}

/// Follows `path` from `root`, failing on the first absent segment.
pub fn navigate<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Result<&'a Value, ExtractError> {
    let mut node = root;
    for (depth, segment) in path.iter().enumerate() {
        node = node.get(segment.as_ref()).ok_or_else(|| {
            let walked: Vec<&str> = path[..=depth].iter().map(AsRef::as_ref).collect();
            ExtractError::MissingNode(walked.join("/"))
        })?;
    }
    Ok(node)
}

/// Items below a list container: an array yields each element, a single
/// record yields itself, an absent or empty node yields nothing.
pub fn normalize_items(node: Option<&Value>) -> Vec<&Value> {
    match node {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(record @ Value::Object(_)) => vec![record],
        _ => Vec::new(),
    }
}

/// Rows of one table node. Only an empty table (`<IT_SALES/>`) has no item
/// node; a populated table without one is a structure mismatch.
fn table_items<'a>(
    container: &'a Value,
    item: &str,
    path: &[&str],
) -> Result<Vec<&'a Value>, ExtractError> {
    match container {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.is_empty() => Ok(Vec::new()),
        _ => match container.get(item) {
            Some(rows) => Ok(normalize_items(Some(rows))),
            None => Err(ExtractError::MissingNode(format!("{}/{}", path.join("/"), item))),
        },
    }
}

/// Projects one SAP record onto the output names; absent fields become `""`.
pub fn map_record(record: &Value, fields: &[OutputField]) -> Value {
    let mut mapped = Map::with_capacity(fields.len());
    for field in fields {
        let value = record
            .get(field.source)
            .map(|raw| convert::from_sap(field.kind, raw))
            .unwrap_or_else(|| Value::String(String::new()));
        mapped.insert(field.target.to_string(), value);
    }
    Value::Object(mapped)
}

/// Locates the payload of a parsed reply and maps it onto the output names.
///
/// `root` is the path to the response element (`Envelope/Body/<F>Response` or `d`);
/// the shape's path continues from there.
pub fn extract<S: AsRef<str>>(
    document: &Value,
    root: &[S],
    shape: &ResultShape,
    fields: &[OutputField],
) -> Result<Value, ExtractError> {
    let mut path: Vec<&str> = root.iter().map(AsRef::as_ref).collect();

    match shape {
        ResultShape::Record(rest) => {
            path.extend_from_slice(rest);
            let node = navigate(document, &path)?;
            let record = match node {
                Value::Array(items) => items.first().unwrap_or(&EMPTY),
                Value::String(text) if !text.is_empty() => {
                    return Err(ExtractError::NotRecord(path.join("/")))
                }
                Value::Object(_) | Value::String(_) | Value::Null => node,
                _ => return Err(ExtractError::NotRecord(path.join("/"))),
            };
            Ok(map_record(record, fields))
        }
        ResultShape::List(rest) => {
            let Some((item, container)) = rest.split_last() else {
                return Err(ExtractError::NotRecord(path.join("/")));
            };
            path.extend_from_slice(container);
            let container = navigate(document, &path)?;
            let items: Vec<&Value> = match container {
                Value::Array(containers) => {
                    let mut items = Vec::new();
                    for container in containers {
                        items.extend(table_items(container, item, &path)?);
                    }
                    items
                }
                other => table_items(other, item, &path)?,
            };
            Ok(Value::Array(
                items.into_iter().map(|record| map_record(record, fields)).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portals::FieldKind;
    use assert_matches::assert_matches;
    use serde_json::json;

    const ITEM_FIELDS: &[OutputField] = &[
        OutputField::new("VBELN", "documentNumber", FieldKind::Alpha(10)),
        OutputField::new("NETWR", "netValue", FieldKind::Amount),
    ];

    fn soap_reply(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/">
  <soap-env:Header/>
  <soap-env:Body>
    <n0:ZFM_TESTResponse xmlns:n0="urn:sap-com:document:sap:rfc:functions">{}</n0:ZFM_TESTResponse>
  </soap-env:Body>
</soap-env:Envelope>"#,
            inner
        )
    }

    const ROOT: [&str; 3] = ["Envelope", "Body", "ZFM_TESTResponse"];

    #[test]
    fn xml_tree_drops_prefixes_and_attributes() {
        let doc = parse_xml(&soap_reply("<E_STATUS>S</E_STATUS><E_NAME/>")).unwrap();
        let response = navigate(&doc, &ROOT).unwrap();
        assert_eq!(response, &json!({"E_STATUS": "S", "E_NAME": ""}));
    }

    #[test]
    fn repeated_items_become_arrays() {
        let doc = parse_xml(&soap_reply(
            "<IT_SALES><item><VBELN>1</VBELN></item><item><VBELN>2</VBELN></item></IT_SALES>",
        ))
        .unwrap();
        let items = navigate(&doc, &["Envelope", "Body", "ZFM_TESTResponse", "IT_SALES", "item"])
            .unwrap();
        assert_eq!(items.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let doc = parse_xml("<r><a>Smith &amp; Sons</a><b><![CDATA[<raw>]]></b></r>").unwrap();
        assert_eq!(doc, json!({"r": {"a": "Smith & Sons", "b": "<raw>"}}));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        assert_matches!(parse_xml("<a><b></a>"), Err(ExtractError::Xml(_)));
        assert_matches!(parse_xml("<a>"), Err(ExtractError::Xml(_)));
        assert_matches!(parse_xml("not xml at all"), Err(ExtractError::Xml(_)));
    }

    #[test]
    fn single_item_is_normalized_to_one_element_list() {
        let doc = parse_xml(&soap_reply(
            "<IT_SALES><item><VBELN>0000000042</VBELN><NETWR>10.00-</NETWR></item></IT_SALES>",
        ))
        .unwrap();
        let list = extract(&doc, &ROOT, &ResultShape::List(&["IT_SALES", "item"]), ITEM_FIELDS)
            .unwrap();
        assert_eq!(list, json!([{"documentNumber": "42", "netValue": "-10.00"}]));
    }

    #[test]
    fn empty_table_yields_empty_list() {
        let doc = parse_xml(&soap_reply("<IT_SALES/>")).unwrap();
        let list = extract(&doc, &ROOT, &ResultShape::List(&["IT_SALES", "item"]), ITEM_FIELDS)
            .unwrap();
        assert_eq!(list, json!([]));
    }

    #[test]
    fn missing_container_is_an_error_naming_the_path() {
        let doc = parse_xml(&soap_reply("<E_STATUS>S</E_STATUS>")).unwrap();
        let err = extract(&doc, &ROOT, &ResultShape::List(&["IT_SALES", "item"]), ITEM_FIELDS)
            .unwrap_err();
        assert_matches!(
            err,
            ExtractError::MissingNode(path) if path == "Envelope/Body/ZFM_TESTResponse/IT_SALES"
        );
    }

    #[test]
    fn missing_response_element_is_an_error() {
        let doc = parse_xml(
            r#"<soap:Envelope xmlns:soap="x"><soap:Body><soap:Fault><faultstring>boom</faultstring></soap:Fault></soap:Body></soap:Envelope>"#,
        )
        .unwrap();
        assert_matches!(
            extract(&doc, &ROOT, &ResultShape::Record(&[]), ITEM_FIELDS),
            Err(ExtractError::MissingNode(_))
        );
    }

    #[test]
    fn absent_record_fields_default_to_empty_strings() {
        let doc = parse_xml(&soap_reply("<ES_PROFILE><VBELN>7</VBELN></ES_PROFILE>")).unwrap();
        let record =
            extract(&doc, &ROOT, &ResultShape::Record(&["ES_PROFILE"]), ITEM_FIELDS).unwrap();
        assert_eq!(record, json!({"documentNumber": "7", "netValue": ""}));
    }

    #[test]
    fn text_where_a_record_is_expected_is_rejected() {
        let doc = parse_xml(&soap_reply("<ES_PROFILE>oops</ES_PROFILE>")).unwrap();
        assert_matches!(
            extract(&doc, &ROOT, &ResultShape::Record(&["ES_PROFILE"]), ITEM_FIELDS),
            Err(ExtractError::NotRecord(_))
        );
    }

    #[test]
    fn odata_results_are_mapped() {
        let doc = parse_json(
            r#"{"d":{"results":[{"__metadata":{},"VBELN":"0000000001","NETWR":"5.00"}]}}"#,
        )
        .unwrap();
        let list = extract(&doc, &["d"], &ResultShape::List(&["results"]), ITEM_FIELDS).unwrap();
        assert_eq!(list, json!([{"documentNumber": "1", "netValue": "5.00"}]));
    }

    #[test]
    fn populated_table_without_item_node_is_an_error() {
        let doc = parse_xml(&soap_reply(
            "<IT_INQUIRY><row><VBELN>1</VBELN></row></IT_INQUIRY>",
        ))
        .unwrap();
        let err = extract(&doc, &ROOT, &ResultShape::List(&["IT_INQUIRY", "item"]), ITEM_FIELDS)
            .unwrap_err();
        assert_matches!(
            err,
            ExtractError::MissingNode(path)
                if path == "Envelope/Body/ZFM_TESTResponse/IT_INQUIRY/item"
        );
    }

    #[test]
    fn odata_entity_without_results_is_an_error() {
        let doc = parse_json(r#"{"d":{"Werks":"1000","Name1":"Plant"}}"#).unwrap();
        assert_matches!(
            extract(&doc, &["d"], &ResultShape::List(&["results"]), ITEM_FIELDS),
            Err(ExtractError::MissingNode(path)) if path == "d/results"
        );

        let empty = parse_json(r#"{"d":{"results":[]}}"#).unwrap();
        let list = extract(&empty, &["d"], &ResultShape::List(&["results"]), ITEM_FIELDS).unwrap();
        assert_eq!(list, json!([]));
    }
}
