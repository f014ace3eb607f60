//! SOAP 1.1 request envelopes for RFC function modules.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

#[derive(Debug, thiserror::Error)]
#[error("failed to write SOAP envelope: {0}")]
pub struct EnvelopeError(String);

fn write_failed(err: impl Display) -> EnvelopeError {
    EnvelopeError(err.to_string())
}

/// Builds the envelope calling `function` in `namespace` with one child element per field.
///
/// Field values are XML-escaped; fields are written in the order given.
///
/// ```text
/// <soapenv:Envelope xmlns:soapenv="..." xmlns:urn="urn:sap-com:document:sap:rfc:functions">
///   <soapenv:Header/>
///   <soapenv:Body>
///     <urn:ZFM_CUST_PROFILE>
///       <I_KUNNR>0000001000</I_KUNNR>
///     </urn:ZFM_CUST_PROFILE>
///   </soapenv:Body>
/// </soapenv:Envelope>
/// ```
pub fn build_envelope<'a, I>(
    namespace: &str,
    function: &str,
    fields: I,
) -> Result<String, EnvelopeError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_failed)?;

    let mut envelope = BytesStart::new("soapenv:Envelope");
    envelope.push_attribute(("xmlns:soapenv", SOAP_ENVELOPE_NS));
    envelope.push_attribute(("xmlns:urn", namespace));
    writer
        .write_event(Event::Start(envelope))
        .map_err(write_failed)?;
    writer
        .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
        .map_err(write_failed)?;
    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Body")))
        .map_err(write_failed)?;

    let call = format!("urn:{}", function);
    writer
        .write_event(Event::Start(BytesStart::new(call.as_str())))
        .map_err(write_failed)?;
    for (name, value) in fields {
        writer
            .create_element(name)
            .write_text_content(BytesText::new(value))
            .map_err(write_failed)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(call.as_str())))
        .map_err(write_failed)?;

    writer
        .write_event(Event::End(BytesEnd::new("soapenv:Body")))
        .map_err(write_failed)?;
    writer
        .write_event(Event::End(BytesEnd::new("soapenv:Envelope")))
        .map_err(write_failed)?;

    String::from_utf8(writer.into_inner()).map_err(write_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portals::RFC_FUNCTIONS;
    use crate::sap::extract::parse_xml;
    use serde_json::json;

    #[test]
    fn envelope_wraps_fields_in_function_element() {
        let xml = build_envelope(
            RFC_FUNCTIONS,
            "ZFM_CUST_PROFILE",
            [("I_KUNNR", "0000001000")],
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "xmlns:urn=\"urn:sap-com:document:sap:rfc:functions\""
        ));
        assert!(xml.contains("<soapenv:Header/>"));
        assert!(xml.contains("<urn:ZFM_CUST_PROFILE>"));
        assert!(xml.contains("<I_KUNNR>0000001000</I_KUNNR>"));
    }

    #[test]
    fn field_values_are_escaped() {
        let xml = build_envelope(
            RFC_FUNCTIONS,
            "ZFM_CUST_LOGIN",
            [("I_KUNNR", "1000"), ("I_PASSWORD", "a<b&c\"d")],
        )
        .unwrap();

        assert!(xml.contains("a&lt;b&amp;c"));
        let parsed = parse_xml(&xml).unwrap();
        assert_eq!(
            parsed["Envelope"]["Body"]["ZFM_CUST_LOGIN"]["I_PASSWORD"],
            json!("a<b&c\"d")
        );
    }

    #[test]
    fn function_without_fields_is_still_well_formed() {
        let xml = build_envelope(RFC_FUNCTIONS, "ZFM_PING", std::iter::empty()).unwrap();
        let parsed = parse_xml(&xml).unwrap();
        assert_eq!(parsed["Envelope"]["Body"]["ZFM_PING"], json!(""));
    }
}
