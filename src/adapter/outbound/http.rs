//! Response handling shared by the HTTP provider clients.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// Longest response body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Decode a JSON body, turning non-2xx statuses into [`ProviderError::Status`].
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Malformed(e.to_string()))
}
