//! OpenAPI document generated from the operation catalog.

use utoipa::openapi::path::{
    HttpMethod, Operation as PathOperation, OperationBuilder, ParameterBuilder, ParameterIn,
    PathItem,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, Schema, Type};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::{ComponentsBuilder, ContentBuilder, Ref, RefOr, Required, ResponseBuilder};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::portals::{self, Method, Operation, ResultShape};

const ERROR_STATUSES: [(&str, &str); 4] = [
    ("400", "A required input is missing or malformed"),
    ("401", "Invalid credentials or session"),
    ("403", "Session does not cover the requested identifier"),
    ("500", "SAP unreachable or replied with an unexpected structure"),
];

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SAP Portal API",
        description = r#"
Backend for the customer, vendor, maintenance, shop-floor and employee portals.

Every business endpoint forwards to one SAP function module (SOAP) or Gateway
entity set (OData) and returns the payload with SAP field names mapped to
camelCase. SAP error statuses are passed through with the SAP body in `details`.

Login endpoints return a session token; send it as `Authorization: Bearer <token>`
to have the portal identifier filled in from the session.
"#
    ),
    tags(
        (name = "customer", description = "Customer portal"),
        (name = "vendor", description = "Vendor portal"),
        (name = "maintenance", description = "Maintenance portal"),
        (name = "shop-floor", description = "Shop-floor portal"),
        (name = "employee", description = "Employee portal")
    ),
    components(schemas(crate::errors::ErrorResponse)),
    modifiers(&CatalogPaths)
)]
pub struct ApiDoc;

/// Adds one path per catalog operation plus the bearer scheme.
struct CatalogPaths;

impl Modify for CatalogPaths {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(|| ComponentsBuilder::new().build());
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

        for operation in portals::catalog() {
            let method = match operation.method {
                Method::Get => HttpMethod::Get,
                Method::Post => HttpMethod::Post,
            };
            openapi.paths.paths.insert(
                operation.path(),
                PathItem::new(method, describe(operation)),
            );
        }
    }
}

fn string_schema() -> Schema {
    Schema::Object(ObjectBuilder::new().schema_type(Type::String).build())
}

fn record_schema(operation: &Operation) -> Schema {
    let mut record = ObjectBuilder::new().schema_type(Type::Object);
    for field in operation.fields {
        record = record.property(field.target, string_schema());
    }
    if operation.is_login() {
        record = record
            .property("token", string_schema())
            .property("tokenType", string_schema())
            .property(
                "expiresIn",
                Schema::Object(ObjectBuilder::new().schema_type(Type::Integer).build()),
            );
    }
    Schema::Object(record.build())
}

fn describe(operation: &Operation) -> PathOperation {
    let record = record_schema(operation);
    let payload = match operation.result {
        ResultShape::Record(_) => record,
        ResultShape::List(_) => Schema::Array(ArrayBuilder::new().items(RefOr::T(record)).build()),
    };

    let mut builder = OperationBuilder::new()
        .operation_id(Some(format!("{}-{}", operation.portal.slug(), operation.name)))
        .summary(Some(operation.summary))
        .tag(operation.portal.slug())
        .response(
            "200",
            ResponseBuilder::new()
                .description("Mapped SAP payload")
                .content(
                    "application/json",
                    ContentBuilder::new().schema(Some(payload)).build(),
                )
                .build(),
        );

    for (status, description) in ERROR_STATUSES {
        builder = builder.response(
            status,
            ResponseBuilder::new()
                .description(description)
                .content(
                    "application/json",
                    ContentBuilder::new()
                        .schema(Some(RefOr::Ref(Ref::from_schema_name("ErrorResponse"))))
                        .build(),
                )
                .build(),
        );
    }

    if !operation.is_login() {
        builder = builder
            .security(SecurityRequirement::default())
            .security(SecurityRequirement::new("bearer_auth", Vec::<String>::new()));
    }

    match operation.method {
        Method::Get => {
            for input in operation.inputs {
                builder = builder.parameter(
                    ParameterBuilder::new()
                        .name(input.name)
                        .parameter_in(ParameterIn::Query)
                        .required(if input.required {
                            Required::True
                        } else {
                            Required::False
                        })
                        .schema(Some(string_schema()))
                        .build(),
                );
            }
        }
        Method::Post => {
            let mut body = ObjectBuilder::new().schema_type(Type::Object);
            for input in operation.inputs {
                body = body.property(input.name, string_schema());
                if input.required {
                    body = body.required(input.name);
                }
            }
            builder = builder.request_body(Some(
                RequestBodyBuilder::new()
                    .content(
                        "application/json",
                        ContentBuilder::new()
                            .schema(Some(Schema::Object(body.build())))
                            .build(),
                    )
                    .required(Some(Required::True))
                    .build(),
            ));
        }
    }

    builder.build()
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
