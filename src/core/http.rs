use std::{
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::Path,
    time::Duration,
};

use reqwest::{
    blocking::{
        Client,
        Response,
    },
    header::{
        ACCEPT_ENCODING,
        USER_AGENT,
    },
};
use serde::Serialize;
use tracing::warn;

use crate::core::NplusError;

const MAX_ATTEMPTS: usize = 3;
const AGENT: &str = "nplusone/0.1 (+reqwest)";

pub fn http_client(timeout: Duration) -> Result<Client, NplusError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NplusError::Custom(format!("HTTP client build failed: {e}")))
}

fn backoff(attempt: usize) {
    std::thread::sleep(Duration::from_secs(2 * attempt as u64));
}

pub fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<(), NplusError> {
    let mut attempts: usize = 0;
    loop {
        attempts += 1;

        let resp = client
            .get(url)
            .header(USER_AGENT, AGENT)
            .header(ACCEPT_ENCODING, "identity")
            .send();

        let mut resp = match resp {
            Ok(r) => r,
            Err(e) => {
                if attempts < MAX_ATTEMPTS {
                    warn!(url, attempt = attempts, error = %e, "download failed, retrying");
                    backoff(attempts);
                    continue;
                }
                return Err(NplusError::Custom(format!("Failed HTTP GET {}: {}", url, e)));
            }
        };

        ensure_success(&resp)?;

        let mut writer = BufWriter::new(File::create(path).map_err(|e| {
            NplusError::Custom(format!("Create download file {:?} failed: {}", path, e))
        })?);

        match resp.copy_to(&mut writer) {
            Ok(n) if n > 0 => {
                writer.flush()?;
                return Ok(());
            }
            Ok(_) | Err(_) => {
                if attempts < MAX_ATTEMPTS {
                    backoff(attempts);
                    continue;
                }
                return Err(NplusError::Custom(
                    "Failed to copy response body to file".to_string(),
                ));
            }
        }
    }
}

/// POSTs `body` as JSON and returns the decoded JSON reply. Transport errors
/// are retried; HTTP error statuses are not.
pub fn post_json<B: Serialize>(
    client: &Client,
    url: &str,
    bearer: &str,
    body: &B,
) -> Result<serde_json::Value, NplusError> {
    let mut attempts: usize = 0;
    loop {
        attempts += 1;

        let resp = client
            .post(url)
            .header(USER_AGENT, AGENT)
            .bearer_auth(bearer)
            .json(body)
            .send();

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                if attempts < MAX_ATTEMPTS {
                    warn!(url, attempt = attempts, error = %e, "request failed, retrying");
                    backoff(attempts);
                    continue;
                }
                return Err(NplusError::Custom(format!("Failed HTTP POST {}: {}", url, e)));
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(NplusError::Custom(format!("HTTP error {} from {}: {}", status, url, text)));
        }

        return Ok(resp.json()?);
    }
}

fn ensure_success(resp: &Response) -> Result<(), NplusError> {
    if !resp.status().is_success() {
        return Err(NplusError::Custom(format!(
            "HTTP error {} from {}",
            resp.status(),
            resp.url()
        )));
    }
    Ok(())
}
