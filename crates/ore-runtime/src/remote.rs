//! Lookup through an HTTP proxy that forwards the game's player API.
//!
//! The transport is pluggable: the embedding app supplies the HTTP client
//! (or a canned source) through [`Transport`]; this module owns the request
//! URL and the decoding of the proxy's response.

use crate::import::{EquipmentLevel, EquipmentLookup, LookupError, PlayerProfile};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Raw response: status code and body text.
pub type RawResponse = (u16, String);

/// Performs a GET request; `Err` means the server could not be reached.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse, String>>;
}

/// [`EquipmentLookup`] backed by a proxy endpoint taking a `tag` parameter.
#[derive(Debug, Clone)]
pub struct ProxyLookup<T> {
    endpoint: String,
    transport: T,
}

impl<T: Transport> ProxyLookup<T> {
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    pub fn url_for(&self, tag: &str) -> String {
        format!("{}?tag={}", self.endpoint, encode_component(tag))
    }
}

impl<T: Transport> EquipmentLookup for ProxyLookup<T> {
    async fn fetch_player(&self, tag: &str) -> Result<PlayerProfile, LookupError> {
        let url = self.url_for(tag);
        debug!(%url, "fetching player");
        let (status, body) = self.transport.get(&url).await.map_err(|e| {
            warn!(error = %e, "player lookup unreachable");
            LookupError::Network(e)
        })?;
        decode_lookup_response(tag, status, &body)
    }
}

/// Decode a proxy response into a player profile.
///
/// The equipment list is read from `heroEquipment`, then `equipment`, then
/// the top-level array. Only home-village entries (or entries with a missing
/// or empty village) are kept. A `reason` field marks an error forwarded by the proxy.
pub fn decode_lookup_response(
    tag: &str,
    status: u16,
    body: &str,
) -> Result<PlayerProfile, LookupError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if !(200..300).contains(&status) {
        return Err(match parsed {
            Some(v) => reason_error(&v).unwrap_or(LookupError::Unknown),
            None => LookupError::Status(status),
        });
    }
    let data = parsed.ok_or(LookupError::Malformed)?;
    if let Some(err) = reason_error(&data) {
        return Err(err);
    }

    let list = data
        .get("heroEquipment")
        .or_else(|| data.get("equipment"))
        .or_else(|| data.is_array().then_some(&data))
        .ok_or(LookupError::Malformed)?
        .as_array()
        .ok_or(LookupError::Malformed)?;

    let mut equipment = Vec::with_capacity(list.len());
    for entry in list {
        let village = entry.get("village").and_then(Value::as_str);
        if !matches!(village, None | Some("") | Some("home")) {
            continue;
        }
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or(LookupError::Malformed)?;
        let level = entry
            .get("level")
            .and_then(Value::as_u64)
            .and_then(|l| u32::try_from(l).ok())
            .ok_or(LookupError::Malformed)?;
        equipment.push(EquipmentLevel {
            name: name.to_string(),
            level,
        });
    }

    let name = data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(tag)
        .to_string();
    Ok(PlayerProfile { name, equipment })
}

fn reason_error(data: &Value) -> Option<LookupError> {
    let reason = data.get("reason")?.as_str()?;
    Some(match reason {
        "notFound" => LookupError::NotFound,
        other => LookupError::Remote(other.to_string()),
    })
}

/// Percent-encode everything outside the URI-component safe set.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 3);
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
