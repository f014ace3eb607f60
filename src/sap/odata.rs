//! OData v2 read URLs for SAP Gateway services.

use std::collections::HashMap;
use url::Url;

/// Substitutes `{name}` placeholders with quoted-string-safe values.
///
/// Single quotes are doubled as OData string literals require. Placeholders
/// without a value render as empty strings.
pub fn render_filter(template: &str, values: &HashMap<&str, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        rendered.push_str(&rest[..start]);
        let name = &rest[start + 1..start + len];
        if let Some(value) = values.get(name) {
            rendered.push_str(&value.replace('\'', "''"));
        }
        rest = &rest[start + len + 1..];
    }
    rendered.push_str(rest);
    rendered
}

/// Appends path segments to `base` without dropping any path the base already carries.
pub fn join_path(base: &Url, path: &str) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// `{base}/sap/opu/odata/sap/{service}/{entity_set}?$filter=..&$format=json&sap-client=..`
pub fn build_odata_url(
    base: &Url,
    service: &str,
    entity_set: &str,
    filter: &str,
    client: &str,
) -> Result<Url, String> {
    let mut url = join_path(base, &format!("sap/opu/odata/sap/{}/{}", service, entity_set))?;
    {
        let mut query = url.query_pairs_mut();
        if !filter.is_empty() {
            query.append_pair("$filter", filter);
        }
        query
            .append_pair("$format", "json")
            .append_pair("sap-client", client);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn placeholders_are_replaced_and_quotes_doubled() {
        let filter = render_filter(
            "Iwerk eq '{plant}' and Pernr eq '{empId}'",
            &values(&[("plant", "1000"), ("empId", "O'Brien")]),
        );
        assert_eq!(filter, "Iwerk eq '1000' and Pernr eq 'O''Brien'");
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        assert_eq!(render_filter("Werks eq '{plant}'", &values(&[])), "Werks eq ''");
        assert_eq!(render_filter("no placeholders", &values(&[])), "no placeholders");
    }

    #[test]
    fn url_carries_service_entity_set_and_client() {
        let base = Url::parse("http://sap.local:8000").unwrap();
        let url = build_odata_url(&base, "ZPM_MAINT_SRV", "PlantSet", "Pernr eq '42'", "100").unwrap();
        assert_eq!(url.path(), "/sap/opu/odata/sap/ZPM_MAINT_SRV/PlantSet");
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["$filter"], "Pernr eq '42'");
        assert_eq!(pairs["$format"], "json");
        assert_eq!(pairs["sap-client"], "100");
    }

    #[test]
    fn base_path_prefix_is_preserved() {
        let base = Url::parse("https://gateway.example.com/proxy/").unwrap();
        let url = join_path(&base, "sap/bc/srt/scs/sap/zcust_portal").unwrap();
        assert_eq!(url.path(), "/proxy/sap/bc/srt/scs/sap/zcust_portal");
    }
}
