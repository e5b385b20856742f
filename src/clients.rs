//! Client directory: maps a client slug (or a raw sheet id) to the CSV export
//! URL of its published Google Sheet.
//!
//! The directory is an explicit value handed to [`ClientDirectory::resolve`],
//! loaded from JSON shaped like:
//!
//! ```json
//! { "acme": { "name": "Acme Co", "sheetId": "2PACX-...", "gid": "0" } }
//! ```

use crate::error::{DashboardError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_GID: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEntry {
    pub name: String,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub gid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientDirectory {
    clients: BTreeMap<String, ClientEntry>,
}

/// What the caller asked for, typically taken from query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSelector {
    pub client: Option<String>,
    pub sheet: Option<String>,
    pub gid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLocator {
    pub url: String,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub slug: String,
    pub name: String,
    pub has_sheet: bool,
}

/// CSV export URL of a published sheet tab.
pub fn build_sheet_url(sheet_id: &str, gid: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/e/{}/pub?gid={}&single=true&output=csv",
        sheet_id, gid
    )
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl SheetSelector {
    /// Reads `client`, `sheet` and `gid` out of a URL query string
    /// (`?client=acme` or `sheet=2PACX-xxx&gid=123`). Values are
    /// percent-decoded and `+` reads as a space.
    pub fn from_query(query: &str) -> Self {
        let mut selector = SheetSelector::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match &*key {
                "client" => selector.client = Some(value.to_string()),
                "sheet" => selector.sheet = Some(value.to_string()),
                "gid" => selector.gid = Some(value.to_string()),
                _ => {}
            }
        }
        selector
    }
}

impl ClientDirectory {
    pub fn new(clients: BTreeMap<String, ClientEntry>) -> Self {
        Self { clients }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn get(&self, slug: &str) -> Option<&ClientEntry> {
        self.clients.get(slug)
    }

    /// Resolves a selector to a sheet locator.
    ///
    /// A client slug takes priority over a direct sheet id. `Ok(None)` means
    /// nothing was selected (demo mode).
    pub fn resolve(&self, selector: &SheetSelector) -> Result<Option<SheetLocator>> {
        if let Some(slug) = non_blank(selector.client.as_ref()) {
            let client = self
                .clients
                .get(slug)
                .ok_or_else(|| DashboardError::UnknownClient(slug.to_string()))?;

            let sheet_id = non_blank(client.sheet_id.as_ref())
                .ok_or_else(|| DashboardError::ClientWithoutSheet(client.name.clone()))?;
            let gid = non_blank(client.gid.as_ref()).unwrap_or(DEFAULT_GID);

            debug!("Resolved client '{}' to sheet {}", slug, sheet_id);
            return Ok(Some(SheetLocator {
                url: build_sheet_url(sheet_id, gid),
                client_name: Some(client.name.clone()),
            }));
        }

        if let Some(sheet_id) = non_blank(selector.sheet.as_ref()) {
            let gid = non_blank(selector.gid.as_ref()).unwrap_or(DEFAULT_GID);
            return Ok(Some(SheetLocator {
                url: build_sheet_url(sheet_id, gid),
                client_name: None,
            }));
        }

        Ok(None)
    }

    pub fn configured_clients(&self) -> Vec<ClientSummary> {
        self.clients
            .iter()
            .map(|(slug, client)| ClientSummary {
                slug: slug.clone(),
                name: client.name.clone(),
                has_sheet: non_blank(client.sheet_id.as_ref()).is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ClientDirectory {
        ClientDirectory::from_json(
            r#"{
                "acme": { "name": "Acme Co", "sheetId": "2PACX-acme", "gid": "42" },
                "globex": { "name": "Globex", "sheetId": "2PACX-globex" },
                "initech": { "name": "Initech", "sheetId": "" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_client_slug() {
        let selector = SheetSelector::from_query("?client=acme");
        let locator = directory().resolve(&selector).unwrap().unwrap();
        assert_eq!(
            locator.url,
            "https://docs.google.com/spreadsheets/d/e/2PACX-acme/pub?gid=42&single=true&output=csv"
        );
        assert_eq!(locator.client_name.as_deref(), Some("Acme Co"));

        let selector = SheetSelector::from_query("client=globex");
        let locator = directory().resolve(&selector).unwrap().unwrap();
        assert!(locator.url.contains("gid=0&"));
    }

    #[test]
    fn test_unknown_client_and_missing_sheet() {
        let err = directory()
            .resolve(&SheetSelector::from_query("client=hooli"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::UnknownClient(ref s) if s == "hooli"));

        let err = directory()
            .resolve(&SheetSelector::from_query("client=initech"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::ClientWithoutSheet(ref s) if s == "Initech"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_direct_sheet_and_demo_mode() {
        let locator = directory()
            .resolve(&SheetSelector::from_query("sheet=2PACX-direct&gid=7"))
            .unwrap()
            .unwrap();
        assert!(locator.url.contains("/2PACX-direct/pub?gid=7&"));
        assert!(locator.client_name.is_none());

        // Client slug wins over a direct sheet id.
        let locator = directory()
            .resolve(&SheetSelector::from_query("sheet=2PACX-direct&client=acme"))
            .unwrap()
            .unwrap();
        assert!(locator.url.contains("2PACX-acme"));

        assert!(directory().resolve(&SheetSelector::default()).unwrap().is_none());
    }

    #[test]
    fn test_query_values_are_decoded() {
        let selector = SheetSelector::from_query("?client=acme%2Dco&gid=1%32");
        assert_eq!(selector.client.as_deref(), Some("acme-co"));
        assert_eq!(selector.gid.as_deref(), Some("12"));

        let selector = SheetSelector::from_query("client=acme+co&sheet=%20");
        assert_eq!(selector.client.as_deref(), Some("acme co"));
        assert_eq!(selector.sheet, None);

        let directory = ClientDirectory::from_json(
            r#"{ "acme-co": { "name": "Acme Co", "sheetId": "2PACX-acme" } }"#,
        )
        .unwrap();
        let locator = directory
            .resolve(&SheetSelector::from_query("?client=acme%2Dco"))
            .unwrap()
            .unwrap();
        assert_eq!(locator.client_name.as_deref(), Some("Acme Co"));
    }

    #[test]
    fn test_configured_clients() {
        let clients = directory().configured_clients();
        assert_eq!(clients.len(), 3);
        assert_eq!(clients[0].slug, "acme");
        assert!(clients[0].has_sheet);
        assert_eq!(clients[2].slug, "initech");
        assert!(!clients[2].has_sheet);
    }
}
