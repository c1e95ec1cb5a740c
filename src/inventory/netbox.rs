//! NetBox REST API client.
//!
//! Blocking `reqwest` client with per-call timeouts. Listing follows the
//! `next` links of NetBox's paginated envelope until the requested limit is
//! reached.

use super::models::{CableRecord, Device, NestedRef, TerminationRecord, decode};
use super::{Cable, Endpoint, InventoryBackend, ListQuery, PortKind};
use crate::config::NetboxSettings;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Page size requested from NetBox.
const PAGE_SIZE: usize = 250;

/// Paginated list envelope.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

/// Client for the NetBox REST API.
pub struct NetboxClient {
    base_url: String,
    token: SecretString,
    client: reqwest::blocking::Client,
}

impl NetboxClient {
    /// Creates a client for `url` (with or without a trailing `/api`).
    #[must_use]
    pub fn new(url: &str, token: SecretString, settings: &NetboxSettings) -> Self {
        let trimmed = url.trim_end_matches('/');
        let base_url = trimmed
            .strip_suffix("/api")
            .unwrap_or(trimmed)
            .to_string();

        Self {
            base_url,
            token,
            client: build_http_client(settings),
        }
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/api/{}/", self.base_url, endpoint.path())
    }

    /// Issues one GET and returns the decoded body, or `None` on 404.
    fn get_json(&self, endpoint: Endpoint, url: &str, query: &[(String, String)]) -> Result<Option<Value>> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header(
                "Authorization",
                format!("Token {}", self.token.expose_secret()),
            )
            .header("Accept", "application/json")
            .query(query)
            .send()
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else if e.is_request() {
                    "request"
                } else {
                    "unknown"
                };
                tracing::warn!(
                    endpoint = %endpoint,
                    error = %e,
                    error_kind = error_kind,
                    "NetBox request failed"
                );
                metrics::counter!(
                    "netbox_requests_total",
                    "endpoint" => endpoint.path(),
                    "status" => error_kind
                )
                .increment(1);
                Error::Unavailable(format!("{error_kind} error: {e}"))
            })?;

        let status = response.status();
        metrics::counter!(
            "netbox_requests_total",
            "endpoint" => endpoint.path(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        metrics::histogram!("netbox_request_duration_ms", "endpoint" => endpoint.path())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Unavailable(format!(
                "NetBox rejected the API token ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(endpoint = %endpoint, status = %status, body = %body, "NetBox returned error status");
            return Err(Error::OperationFailed {
                operation: "netbox_request".to_string(),
                cause: format!("{endpoint} returned status {status}: {body}"),
            });
        }

        response.json::<Value>().map(Some).map_err(|e| Error::MalformedRecord {
            kind: "response",
            cause: e.to_string(),
        })
    }

    /// Lists records across pages until `limit` records are collected.
    fn fetch_all(
        &self,
        endpoint: Endpoint,
        filters: &[(String, String)],
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let page_size = limit.map_or(PAGE_SIZE, |l| l.clamp(1, PAGE_SIZE));
        let mut query: Vec<(String, String)> = filters.to_vec();
        query.push(("limit".to_string(), page_size.to_string()));

        let mut results = Vec::new();
        let mut next_url = Some(self.endpoint_url(endpoint));
        let mut first = true;

        while let Some(url) = next_url.take() {
            // `next` links already carry the query string.
            let params: &[(String, String)] = if first { &query } else { &[] };
            first = false;

            let Some(body) = self.get_json(endpoint, &url, params)? else {
                break;
            };
            let page: Page = decode("page", body)?;
            results.extend(page.results);

            if limit.is_some_and(|l| results.len() >= l) {
                break;
            }
            next_url = page.next;
        }

        if let Some(l) = limit {
            results.truncate(l);
        }
        Ok(results)
    }

    fn get_by_id(&self, endpoint: Endpoint, id: u64) -> Result<Option<Value>> {
        let url = format!("{}{id}/", self.endpoint_url(endpoint));
        self.get_json(endpoint, &url, &[])
    }

    /// Decodes raw records, skipping the ones that do not match.
    fn decode_terminations(kind: &'static str, object_type: &str, raw: Vec<Value>) -> Vec<TerminationRecord> {
        raw.into_iter()
            .filter_map(|value| match decode::<TerminationRecord>(kind, value) {
                Ok(mut record) => {
                    record.object_type = Some(object_type.to_string());
                    Some(record)
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed {kind} record");
                    None
                },
            })
            .collect()
    }

    /// Fills in the pairing a port record does not carry itself.
    ///
    /// Front ports already reference their rear port. Rear ports need a reverse
    /// lookup of the front ports pointing at them.
    fn hydrate_port(&self, kind: PortKind, mut record: TerminationRecord) -> Result<TerminationRecord> {
        record.object_type = Some(kind.object_type().to_string());
        if kind == PortKind::Rear && record.front_ports.is_none() {
            if let Some(id) = record.id {
                let raw = self.fetch_all(
                    Endpoint::FrontPorts,
                    &[("rear_port_id".to_string(), id.to_string())],
                    None,
                )?;
                let fronts = raw
                    .into_iter()
                    .filter_map(|value| decode::<NestedRef>("front port", value).ok())
                    .collect();
                record.front_ports = Some(fronts);
            }
        }
        Ok(record)
    }

    fn lookup_one(&self, endpoint: Endpoint, filters: &[(String, String)]) -> Result<Option<Value>> {
        Ok(self.fetch_all(endpoint, filters, Some(1))?.into_iter().next())
    }
}

/// Hydrates each port, dropping only the ports whose lookup fails.
fn hydrate_each(
    records: Vec<TerminationRecord>,
    mut hydrate: impl FnMut(TerminationRecord) -> Result<TerminationRecord>,
) -> Vec<TerminationRecord> {
    records
        .into_iter()
        .filter_map(|record| {
            let name = record.name.clone().unwrap_or_default();
            hydrate(record)
                .map_err(|e| tracing::warn!(port = %name, error = %e, "Skipping port with failed pairing lookup"))
                .ok()
        })
        .collect()
}

impl InventoryBackend for NetboxClient {
    fn name(&self) -> &'static str {
        "netbox"
    }

    fn find_device(&self, name: &str) -> Result<Option<Device>> {
        self.lookup_one(Endpoint::Devices, &[("name".to_string(), name.to_string())])?
            .map(|value| decode("device", value))
            .transpose()
    }

    fn list_cabled_interfaces(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        let raw = self.fetch_all(
            Endpoint::Interfaces,
            &[
                ("device".to_string(), device_name.to_string()),
                ("cabled".to_string(), "true".to_string()),
            ],
            None,
        )?;
        Ok(Self::decode_terminations("interface", "dcim.interface", raw))
    }

    fn list_cabled_ports(&self, device_name: &str) -> Result<Vec<TerminationRecord>> {
        let mut ports = Vec::new();
        for kind in [PortKind::Front, PortKind::Rear] {
            let raw = self.fetch_all(
                kind.endpoint(),
                &[
                    ("device".to_string(), device_name.to_string()),
                    ("cabled".to_string(), "true".to_string()),
                ],
                None,
            )?;
            let records = Self::decode_terminations("port", kind.object_type(), raw);
            ports.extend(hydrate_each(records, |record| self.hydrate_port(kind, record)));
        }
        Ok(ports)
    }

    fn get_interface(
        &self,
        device_name: &str,
        interface_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        let Some(value) = self.lookup_one(
            Endpoint::Interfaces,
            &[
                ("device".to_string(), device_name.to_string()),
                ("name".to_string(), interface_name.to_string()),
            ],
        )?
        else {
            return Ok(None);
        };
        let mut record: TerminationRecord = decode("interface", value)?;
        record.object_type = Some("dcim.interface".to_string());
        Ok(Some(record))
    }

    fn get_port(
        &self,
        kind: PortKind,
        device_name: &str,
        port_name: &str,
    ) -> Result<Option<TerminationRecord>> {
        let Some(value) = self.lookup_one(
            kind.endpoint(),
            &[
                ("device".to_string(), device_name.to_string()),
                ("name".to_string(), port_name.to_string()),
            ],
        )?
        else {
            return Ok(None);
        };
        let record = decode("port", value)?;
        self.hydrate_port(kind, record).map(Some)
    }

    fn get_cable(&self, id: u64) -> Result<Option<Cable>> {
        let Some(value) = self.get_by_id(Endpoint::Cables, id)? else {
            return Ok(None);
        };
        let mut cable: Cable = decode::<CableRecord>("cable", value)?.into();

        // Nested terminations omit port pairings; refetch ports in full.
        for record in cable
            .a_terminations
            .iter_mut()
            .chain(cable.b_terminations.iter_mut())
        {
            let kind = match record.object_type.as_deref() {
                Some("dcim.frontport") => PortKind::Front,
                Some("dcim.rearport") => PortKind::Rear,
                _ => continue,
            };
            let Some(port_id) = record.id else { continue };
            if let Some(full) = self.get_by_id(kind.endpoint(), port_id)? {
                let full: TerminationRecord = decode("port", full)?;
                *record = self.hydrate_port(kind, full)?;
            }
        }

        Ok(Some(cable))
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Value>> {
        tracing::debug!(endpoint = %query.endpoint, filters = ?query.filters, "Listing NetBox records");
        self.fetch_all(query.endpoint, &query.filters, query.limit)
    }
}

/// Builds the blocking HTTP client with configured timeouts.
fn build_http_client(settings: &NetboxSettings) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(concat!("netbox-mcp/", env!("CARGO_PKG_VERSION")));
    if settings.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(settings.timeout_ms));
    }
    if settings.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(settings.connect_timeout_ms));
    }
    if !settings.verify_tls {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build NetBox HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> NetboxClient {
        NetboxClient::new(
            url,
            SecretString::from("token".to_string()),
            &NetboxSettings::default(),
        )
    }

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(client("https://netbox.local").base_url, "https://netbox.local");
        assert_eq!(client("https://netbox.local/").base_url, "https://netbox.local");
        assert_eq!(client("https://netbox.local/api/").base_url, "https://netbox.local");
    }

    #[test]
    fn test_endpoint_url() {
        let c = client("https://netbox.local");
        assert_eq!(
            c.endpoint_url(Endpoint::RearPorts),
            "https://netbox.local/api/dcim/rear-ports/"
        );
    }

    #[test]
    fn test_decode_terminations_skips_malformed() {
        let raw = vec![
            serde_json::json!({"id": 1, "name": "eth0", "device": {"id": 1, "name": "sw1"}, "cable": {"id": 4}}),
            serde_json::json!({"id": "bad"}),
        ];
        let records = NetboxClient::decode_terminations("interface", "dcim.interface", raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object_type.as_deref(), Some("dcim.interface"));
        assert_eq!(records[0].cable_id(), Some(4));
    }

    #[test]
    fn test_failed_pairing_drops_only_that_port() {
        let records = NetboxClient::decode_terminations(
            "port",
            "dcim.rearport",
            vec![
                serde_json::json!({"id": 7, "name": "R1", "device": {"id": 2, "name": "pp1"}, "cable": {"id": 11}}),
                serde_json::json!({"id": 8, "name": "R2", "device": {"id": 2, "name": "pp1"}, "cable": {"id": 12}}),
            ],
        );

        let hydrated = hydrate_each(records, |record| {
            if record.id == Some(7) {
                return Err(Error::Unavailable("front port lookup timed out".to_string()));
            }
            Ok(record)
        });
        assert_eq!(hydrated.len(), 1);
        assert_eq!(hydrated[0].name.as_deref(), Some("R2"));
    }

    #[test]
    fn test_unreachable_host_is_unavailable() {
        let settings = NetboxSettings {
            timeout_ms: 500,
            connect_timeout_ms: 200,
            ..NetboxSettings::default()
        };
        let c = NetboxClient::new(
            "http://127.0.0.1:9",
            SecretString::from("token".to_string()),
            &settings,
        );
        let err = c.find_device("sw1").unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)), "got {err:?}");
    }
}
