use crate::clients::SheetLocator;
use crate::error::{DashboardError, Result};
use crate::ingestion::{parse_csv_records, ParseOptions};
use crate::schema::PerformanceRecord;
use crate::state::{ApplyOutcome, DatasetState};
use log::info;
use reqwest::Client;
use tokio::sync::Mutex;

/// Downloads published sheet exports and turns them into canonical records.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    options: ParseOptions,
}

impl SheetsClient {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            client: Client::new(),
            options,
        }
    }

    pub fn with_client(client: Client, options: ParseOptions) -> Self {
        Self { client, options }
    }

    pub async fn fetch_csv(&self, url: &str) -> Result<String> {
        let res = self.client.get(url).send().await?;
        let status = res.status();

        if !status.is_success() {
            return Err(DashboardError::FetchFailed {
                status: status.as_u16(),
            });
        }

        Ok(res.text().await?)
    }

    pub async fn fetch_records(&self, locator: &SheetLocator) -> Result<Vec<PerformanceRecord>> {
        let text = self.fetch_csv(&locator.url).await?;
        let records = parse_csv_records(&text, &self.options)?;

        info!(
            "Loaded {} records for {}",
            records.len(),
            locator.client_name.as_deref().unwrap_or("direct sheet")
        );

        Ok(records)
    }

    /// Fetches `locator` and applies the outcome to `state`. The lock is only
    /// held to take a ticket and to apply the result, so several refreshes can
    /// be in flight at once; results of a fetch that a newer one has
    /// overtaken are dropped.
    pub async fn refresh(&self, state: &Mutex<DatasetState>, locator: &SheetLocator) -> ApplyOutcome {
        let ticket = state.lock().await.begin_fetch();
        let result = self.fetch_records(locator).await;
        state.lock().await.complete(ticket, result)
    }
}

impl Default for SheetsClient {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}
