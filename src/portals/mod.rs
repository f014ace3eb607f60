//! Operation descriptor table.
//!
//! Every business endpoint of every portal is one [`Operation`]: which inputs
//! it accepts, which SAP service it forwards to, where the payload sits in the
//! reply and how SAP field names map onto the names the frontend reads. The
//! generic proxy in [`crate::sap::proxy`] interprets these records; there are
//! no per-endpoint handlers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod customer;
pub mod employee;
pub mod maintenance;
pub mod shop_floor;
pub mod vendor;

/// SOAP namespace of RFC-enabled function modules exposed as web services.
pub const RFC_FUNCTIONS: &str = "urn:sap-com:document:sap:rfc:functions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Portal {
    Customer,
    Vendor,
    Maintenance,
    ShopFloor,
    Employee,
}

impl Portal {
    pub const ALL: [Portal; 5] = [
        Portal::Customer,
        Portal::Vendor,
        Portal::Maintenance,
        Portal::ShopFloor,
        Portal::Employee,
    ];

    /// Path prefix the portal's routes are mounted under.
    pub fn slug(&self) -> &'static str {
        match self {
            Portal::Customer => "customer",
            Portal::Vendor => "vendor",
            Portal::Maintenance => "maintenance",
            Portal::ShopFloor => "shop-floor",
            Portal::Employee => "employee",
        }
    }

    /// Request field carrying the correlation key for every call of this portal.
    pub fn identifier(&self) -> &'static str {
        match self {
            Portal::Customer => "customerId",
            Portal::Vendor => "vendorId",
            Portal::Maintenance | Portal::ShopFloor | Portal::Employee => "empId",
        }
    }

    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Portal::Customer => customer::OPERATIONS,
            Portal::Vendor => vendor::OPERATIONS,
            Portal::Maintenance => maintenance::OPERATIONS,
            Portal::ShopFloor => shop_floor::OPERATIONS,
            Portal::Employee => employee::OPERATIONS,
        }
    }

    pub fn operation(&self, name: &str) -> Option<&'static Operation> {
        self.operations().iter().find(|op| op.name == name)
    }

    pub fn login_operation(&self) -> Option<&'static Operation> {
        self.operations().iter().find(|op| op.login.is_some())
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Portal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Portal::ALL
            .into_iter()
            .find(|portal| portal.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown portal '{}'; expected one of: customer, vendor, maintenance, shop-floor, employee",
                    s
                )
            })
    }
}

/// Value conversion applied between the frontend and SAP representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "width")]
pub enum FieldKind {
    Text,
    /// Sent exactly as received; never trimmed.
    Secret,
    /// `YYYY-MM-DD` on the frontend side, `YYYYMMDD` or `/Date(ms)/` on the SAP side.
    Date,
    /// Decimal amount; SAP renders negatives with a trailing minus.
    Amount,
    /// Zero-padded numeric key of the given width (SAP ALPHA conversion).
    Alpha(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    /// Name in the JSON body or query string.
    pub name: &'static str,
    /// Element name in the envelope, or placeholder name in an OData filter.
    pub sap: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl InputField {
    pub const fn required(name: &'static str, sap: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            sap,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, sap: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            sap,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub source: &'static str,
    pub target: &'static str,
    pub kind: FieldKind,
}

impl OutputField {
    pub const fn new(source: &'static str, target: &'static str, kind: FieldKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "protocol")]
pub enum Upstream {
    /// RFC function module published as a SOAP service.
    Soap {
        service: &'static str,
        namespace: &'static str,
        function: &'static str,
    },
    /// Gateway OData entity set; `filter` holds `{sap}` placeholders of the inputs.
    #[serde(rename = "odata")]
    OData {
        service: &'static str,
        entity_set: &'static str,
        filter: &'static str,
    },
}

/// Location and cardinality of the payload below the response root.
///
/// For SOAP the root is `Envelope/Body/<Function>Response`, for OData it is `d`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "shape", content = "path")]
pub enum ResultShape {
    Record(&'static [&'static str]),
    /// The last segment names the repeating item node.
    List(&'static [&'static str]),
}

/// How a login reply signals success.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCheck {
    /// Output field holding the status flag.
    pub status: &'static str,
    /// Flag value meaning "authenticated", compared case-insensitively.
    pub success: &'static str,
    /// Output field holding SAP's explanation on failure.
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub portal: Portal,
    pub name: &'static str,
    pub route: &'static str,
    pub method: Method,
    pub summary: &'static str,
    pub inputs: &'static [InputField],
    pub upstream: Upstream,
    pub result: ResultShape,
    pub fields: &'static [OutputField],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginCheck>,
}

impl Operation {
    pub fn is_login(&self) -> bool {
        self.login.is_some()
    }

    /// Full route including the portal prefix, e.g. `/customer/api/profile`.
    pub fn path(&self) -> String {
        format!("/{}{}", self.portal.slug(), self.route)
    }

    pub fn input(&self, name: &str) -> Option<&'static InputField> {
        self.inputs.iter().find(|field| field.name == name)
    }

    /// Output names of fields rendered as dates.
    pub fn date_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.kind == FieldKind::Date)
            .map(|field| field.target)
    }
}

/// Every operation of every portal.
pub fn catalog() -> impl Iterator<Item = &'static Operation> {
    Portal::ALL
        .into_iter()
        .flat_map(|portal| portal.operations().iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_lower_camel(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && name.chars().all(|c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn every_operation_belongs_to_the_portal_listing_it() {
        for portal in Portal::ALL {
            for op in portal.operations() {
                assert_eq!(op.portal, portal, "{} listed under {}", op.name, portal);
            }
        }
    }

    #[test]
    fn routes_are_unique_per_method() {
        let mut seen = HashSet::new();
        for op in catalog() {
            assert!(
                seen.insert((op.path(), op.method)),
                "duplicate route {} {:?}",
                op.path(),
                op.method
            );
        }
    }

    #[test]
    fn every_portal_has_exactly_one_login() {
        for portal in Portal::ALL {
            let logins = portal.operations().iter().filter(|op| op.is_login()).count();
            assert_eq!(logins, 1, "{} should expose one login", portal);
        }
    }

    #[test]
    fn every_operation_requires_the_portal_identifier() {
        for op in catalog() {
            let input = op
                .input(op.portal.identifier())
                .unwrap_or_else(|| panic!("{} lacks {}", op.path(), op.portal.identifier()));
            assert!(input.required);
        }
    }

    #[test]
    fn output_names_share_one_casing_convention() {
        for op in catalog() {
            for field in op.fields {
                assert!(
                    is_lower_camel(field.target),
                    "{} maps {} to non-camelCase {}",
                    op.path(),
                    field.source,
                    field.target
                );
            }
        }
    }

    #[test]
    fn list_results_name_an_item_node() {
        for op in catalog() {
            if let ResultShape::List(path) = op.result {
                assert!(!path.is_empty(), "{} has an empty list path", op.path());
            }
        }
    }

    #[test]
    fn odata_filters_only_reference_declared_inputs() {
        for op in catalog() {
            if let Upstream::OData { filter, .. } = op.upstream {
                let mut rest = filter;
                while let Some(start) = rest.find('{') {
                    let end = rest[start..].find('}').expect("unterminated placeholder") + start;
                    let name = &rest[start + 1..end];
                    assert!(
                        op.inputs.iter().any(|input| input.sap == name),
                        "{} filter references undeclared {}",
                        op.path(),
                        name
                    );
                    rest = &rest[end + 1..];
                }
            }
        }
    }

    #[test]
    fn portal_parses_from_slug() {
        assert_eq!("shop-floor".parse::<Portal>().unwrap(), Portal::ShopFloor);
        assert_eq!("Customer".parse::<Portal>().unwrap(), Portal::Customer);
        assert!("warehouse".parse::<Portal>().is_err());
    }
}
