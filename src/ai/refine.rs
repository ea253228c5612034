use anyhow::Result;
use tracing::{info, instrument};

use crate::ai::common::BackendClient;
use crate::ai::types::{RefineRequest, RefineResponse};
use crate::merge::RemoteModule;

impl BackendClient {
    /// Ask the backend to rewrite modules according to `instruction`.
    ///
    /// Locked modules are sent too so the backend has context; the merge on
    /// our side keeps them untouched whatever comes back.
    #[instrument(level = "trace", skip(self, modules, gemini_api_key))]
    pub async fn refine_modules(
        &self,
        modules: Vec<RemoteModule>,
        instruction: &str,
        gemini_api_key: &str,
    ) -> Result<RefineResponse> {
        let body = RefineRequest {
            modules,
            instruction: instruction.to_string(),
            gemini_api_key: gemini_api_key.to_string(),
        };
        let resp: RefineResponse = self
            .post_json("refine", &body, self.config().refine_timeout)
            .await?;
        info!(modules = resp.modules.len(), "Modules refined");
        Ok(resp)
    }
}
