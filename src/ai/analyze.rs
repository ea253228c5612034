use anyhow::Result;
use tracing::{info, instrument};

use crate::ai::common::BackendClient;
use crate::ai::types::{AnalyzeRequest, AnalyzeResponse};

impl BackendClient {
    /// Break a reference image down into tagged modules.
    #[instrument(level = "trace", skip(self, image_data, gemini_api_key))]
    pub async fn analyze_image(
        &self,
        image_data: &str,
        gemini_api_key: &str,
    ) -> Result<AnalyzeResponse> {
        let body = AnalyzeRequest {
            image_data: image_data.to_string(),
            gemini_api_key: gemini_api_key.to_string(),
        };
        let resp: AnalyzeResponse = self
            .post_json("analyze", &body, self.config().analyze_timeout)
            .await?;
        info!(modules = resp.modules.len(), "Image analyzed");
        Ok(resp)
    }
}
