use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};
use url::Url;

use super::client::{SapRequest, SapTransport};
use super::{convert, envelope, extract, odata};
use crate::config::SapConfig;
use crate::errors::ServiceError;
use crate::portals::{FieldKind, InputField, LoginCheck, Operation, Upstream};

/// Request parameters keyed by their frontend names.
pub type Inputs = HashMap<String, String>;

/// Executes descriptor-driven calls against one SAP system.
pub struct SapProxy {
    transport: Arc<dyn SapTransport>,
    base_url: Url,
    client: String,
}

impl SapProxy {
    pub fn new(transport: Arc<dyn SapTransport>, config: &SapConfig) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::RequestSetup(format!("invalid SAP base URL: {}", e)))?;
        Ok(Self {
            transport,
            base_url,
            client: config.client.clone(),
        })
    }

    /// Runs the full cycle for one operation: validate, build, invoke, extract.
    ///
    /// Required inputs are checked before anything is sent, so a missing
    /// identifier never reaches SAP.
    #[instrument(skip(self, inputs), fields(operation = %operation.path()))]
    pub async fn execute(
        &self,
        operation: &'static Operation,
        inputs: &Inputs,
    ) -> Result<Value, ServiceError> {
        let values = resolve_inputs(operation, inputs)?;
        let request = self.build_request(operation, &values)?;

        let started = Instant::now();
        let body = self.transport.send(request).await?;

        let (document, root) = match &operation.upstream {
            Upstream::Soap { function, .. } => (
                extract::parse_xml(&body),
                vec![
                    "Envelope".to_string(),
                    "Body".to_string(),
                    format!("{}Response", function),
                ],
            ),
            Upstream::OData { .. } => (extract::parse_json(&body), vec!["d".to_string()]),
        };
        let document = document.map_err(|err| {
            error!(error = %err, body = %body, "SAP reply could not be parsed");
            ServiceError::from(err)
        })?;

        let payload = extract::extract(&document, &root, &operation.result, operation.fields)
            .map_err(|err| {
                error!(error = %err, payload = %document, "unexpected SAP response structure");
                ServiceError::from(err)
            })?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            records = payload.as_array().map(Vec::len).unwrap_or(1),
            "SAP operation completed"
        );

        if let Some(check) = &operation.login {
            verify_login(check, &payload)?;
        }
        Ok(payload)
    }

    /// Prepares the outbound request for `operation` from already converted values.
    pub fn build_request(
        &self,
        operation: &'static Operation,
        values: &[(&'static InputField, String)],
    ) -> Result<SapRequest, ServiceError> {
        match &operation.upstream {
            Upstream::Soap {
                service,
                namespace,
                function,
            } => {
                let mut url = odata::join_path(&self.base_url, &format!("sap/bc/srt/scs/sap/{}", service))
                    .map_err(ServiceError::RequestSetup)?;
                url.query_pairs_mut().append_pair("sap-client", &self.client);

                let envelope = envelope::build_envelope(
                    namespace,
                    function,
                    values.iter().map(|(field, value)| (field.sap, value.as_str())),
                )?;

                Ok(SapRequest::Soap {
                    url,
                    action: format!("{}:{}", namespace, function),
                    envelope,
                })
            }
            Upstream::OData {
                service,
                entity_set,
                filter,
            } => {
                let substitutions: HashMap<&str, String> = values
                    .iter()
                    .map(|(field, value)| (field.sap, value.clone()))
                    .collect();
                let filter = odata::render_filter(filter, &substitutions);
                let url = odata::build_odata_url(
                    &self.base_url,
                    service,
                    entity_set,
                    &filter,
                    &self.client,
                )
                .map_err(ServiceError::RequestSetup)?;
                Ok(SapRequest::OData { url })
            }
        }
    }
}

/// Looks up every declared input, failing on the first missing required one.
///
/// Blank values count as missing, except for secrets where only an empty
/// value does. Returned values are already converted to their SAP
/// representation, in declaration order; absent optional inputs are left out.
pub fn resolve_inputs(
    operation: &'static Operation,
    inputs: &Inputs,
) -> Result<Vec<(&'static InputField, String)>, ServiceError> {
    let mut values = Vec::with_capacity(operation.inputs.len());
    for field in operation.inputs {
        let value = inputs.get(field.name).filter(|value| match field.kind {
            FieldKind::Secret => !value.is_empty(),
            _ => !value.trim().is_empty(),
        });
        match value {
            Some(value) => {
                let converted = convert::to_sap(field.kind, field.name, value)
                    .map_err(ServiceError::BadRequest)?;
                values.push((field, converted));
            }
            None if field.required => return Err(ServiceError::MissingField(field.name.to_string())),
            None => {}
        }
    }
    Ok(values)
}

fn verify_login(check: &LoginCheck, payload: &Value) -> Result<(), ServiceError> {
    let status = payload
        .get(check.status)
        .and_then(Value::as_str)
        .unwrap_or_default();
    if status.eq_ignore_ascii_case(check.success) {
        return Ok(());
    }

    let message = payload
        .get(check.message)
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or("Invalid credentials");
    Err(ServiceError::InvalidCredentials(message.to_string()))
}
