//! Hugging Face datasets-server client.
//!
//! `GET {base}/rows?dataset=..&config=..&split=..&offset=..&length=..` returns
//! at most 100 rows per page, so a full split is fetched page by page.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::corpus::{CorpusError, RawRow, Review};

/// Server-side maximum for `length`.
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row_idx: usize,
    row: RawRow,
    /// Cells the server shortened to fit the response size limit.
    #[serde(default)]
    truncated_cells: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HubError {
    error: String,
}

pub struct HubClient {
    client: Client,
    rows_url: String,
    token: Option<String>,
}

impl HubClient {
    pub fn new(config: &Config) -> Result<Self, CorpusError> {
        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            rows_url: format!("{}/rows", config.hf_datasets_url.trim_end_matches('/')),
            token: config.hf_token.clone(),
        })
    }

    /// Fetches every row of `dataset/config[split]`, in row order.
    pub async fn fetch_split(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
    ) -> Result<Vec<Review>, CorpusError> {
        let mut reviews = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(dataset, config, split, offset).await?;
            let fetched = page.rows.len();

            for entry in page.rows {
                // a shortened review would be scored as if it were complete
                if !entry.truncated_cells.is_empty() {
                    return Err(CorpusError::TruncatedRow {
                        row: entry.row_idx,
                        cells: entry.truncated_cells,
                    });
                }
                reviews.push(Review::new(entry.row.text, entry.row.label, entry.row_idx)?);
            }

            offset += fetched;
            debug!("Fetched {offset}/{} rows", page.num_rows_total);

            if fetched == 0 || offset >= page.num_rows_total {
                break;
            }
        }

        Ok(reviews)
    }

    async fn fetch_page(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
        offset: usize,
    ) -> Result<RowsPage, CorpusError> {
        let offset = offset.to_string();
        let length = PAGE_SIZE.to_string();

        let mut request = self.client.get(&self.rows_url).query(&[
            ("dataset", dataset),
            ("config", config),
            ("split", split),
            ("offset", offset.as_str()),
            ("length", length.as_str()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HubError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(CorpusError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
