//! TEI (Text Embeddings Inference) client used by the Qdrant-backed memory.

use serde::Serialize;

use crate::error::ReportError;

/// Maximum number of texts per /embed call.
const BATCH_SIZE: usize = 64;

#[derive(Debug)]
pub(crate) struct TeiClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
}

impl TeiClient {
    #[must_use]
    pub(crate) fn new(client: reqwest::Client, tei_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/embed", tei_url.trim_end_matches('/')),
        }
    }

    /// One embedding per input text, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Upstream`] if a request fails, returns a
    /// non-success status, or yields the wrong number of vectors.
    pub(crate) async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ReportError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let response = self
                .client
                .post(&self.url)
                .json(&EmbedRequest { inputs: batch })
                .send()
                .await
                .map_err(|e| ReportError::Upstream(format!("TEI request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(ReportError::Upstream(format!(
                    "TEI returned status {}",
                    response.status()
                )));
            }

            let embeddings: Vec<Vec<f32>> = response
                .json()
                .await
                .map_err(|e| ReportError::Upstream(format!("TEI response parse error: {e}")))?;

            if embeddings.len() != batch.len() {
                return Err(ReportError::Upstream(format!(
                    "TEI returned {} embeddings for {} inputs",
                    embeddings.len(),
                    batch.len()
                )));
            }

            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    /// Embedding of a single text.
    pub(crate) async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ReportError> {
        self.embed(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ReportError::Upstream("TEI returned no embedding".to_string()))
    }
}
