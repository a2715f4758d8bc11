//! Deploy request handler.
//!
//! One invocation walks a strictly linear path:
//! validate the request, provision a site, upload the artifact, respond.
//! There are no retries; the first failure ends the invocation and is
//! reported as a single `{ success: false, error }` body.

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use sitedrop_core::types::DEPLOY_SUCCESS_MESSAGE;
use sitedrop_core::{
    DeployArtifact, DeployConfig, DeployError, DeployRequest, DeployResult, DeploySummary,
    RemoteSite, Result,
};

use crate::HostingApi;
use crate::netlify::NetlifyClient;

/// Where an invocation is in its lifecycle, carried in log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    ValidatingRequest,
    ProvisioningSite,
    UploadingArtifact,
    Responding,
}

impl DeployStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidatingRequest => "validating_request",
            Self::ProvisioningSite => "provisioning_site",
            Self::UploadingArtifact => "uploading_artifact",
            Self::Responding => "responding",
        }
    }
}

/// HTTP-style outcome of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl HandlerResponse {
    fn deployed(summary: DeploySummary) -> Self {
        Self {
            status: StatusCode::OK,
            body: json_body(&DeployResult::Deployed(summary)),
        }
    }

    fn from_error(err: &DeployError) -> Self {
        match err {
            DeployError::MethodNotAllowed => Self {
                status: StatusCode::METHOD_NOT_ALLOWED,
                body: json!({ "error": err.to_string() }),
            },
            DeployError::MissingConfiguration(_)
            | DeployError::InvalidInput { .. }
            | DeployError::UpstreamFailure { .. }
            | DeployError::Transport(_)
            | DeployError::Archive(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: json_body(&DeployResult::failed(err.to_string())),
            },
        }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn json_body<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }))
}

/// Provisions a site and uploads content to it.
///
/// The hosting client is built once from the injected configuration. When
/// no credential is configured the handler still answers requests, but every
/// deploy fails with a configuration error before anything is sent upstream.
pub struct DeployHandler<A = NetlifyClient> {
    api: Option<A>,
    config: DeployConfig,
}

impl DeployHandler<NetlifyClient> {
    pub fn from_config(config: DeployConfig) -> Result<Self> {
        let api = config
            .api_token
            .as_deref()
            .map(|token| NetlifyClient::new(token, &config.api_base))
            .transpose()?;
        Ok(Self { api, config })
    }
}

impl<A: HostingApi> DeployHandler<A> {
    pub fn with_api(api: Option<A>, config: DeployConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Handle one raw invocation: method check, validation, deploy, response shaping
    pub async fn handle(&self, method: &Method, body: &[u8]) -> HandlerResponse {
        if *method != Method::POST {
            tracing::debug!(%method, "Rejecting non-POST deploy request");
            return HandlerResponse::from_error(&DeployError::MethodNotAllowed);
        }

        tracing::debug!(
            stage = DeployStage::ValidatingRequest.as_str(),
            bytes = body.len(),
            "Validating deploy request"
        );
        match self.process(body).await {
            Ok(summary) => HandlerResponse::deployed(summary),
            Err(err) => {
                tracing::error!(
                    stage = DeployStage::Responding.as_str(),
                    kind = err.error_type(),
                    error = %err,
                    "Deploy error"
                );
                HandlerResponse::from_error(&err)
            }
        }
    }

    async fn process(&self, body: &[u8]) -> Result<DeploySummary> {
        // A missing credential is reported even when the body is also bad
        self.api()?;
        let request = DeployRequest::from_json(body)?;
        self.deploy(&request).await
    }

    /// Provision a site for the request, then package and upload its payload
    #[tracing::instrument(skip_all, fields(website = %request.website_name))]
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeploySummary> {
        let api = self.api()?;
        let site = self.provision(api, &request.website_name).await?;

        let artifact = match DeployArtifact::from_request(request) {
            Ok(artifact) => artifact,
            Err(err) => return Err(self.abandon(api, &site, err).await),
        };

        self.upload(api, &request.website_name, site, artifact).await
    }

    /// Provision a site and upload an already packaged archive
    #[tracing::instrument(skip_all, fields(website = %website_name))]
    pub async fn deploy_artifact(
        &self,
        website_name: &str,
        artifact: DeployArtifact,
    ) -> Result<DeploySummary> {
        let api = self.api()?;
        let site = self.provision(api, website_name).await?;
        self.upload(api, website_name, site, artifact).await
    }

    fn api(&self) -> Result<&A> {
        self.api.as_ref().ok_or_else(|| {
            DeployError::MissingConfiguration(format!(
                "API key not found ({} is not set)",
                sitedrop_core::config::API_TOKEN_VAR
            ))
        })
    }

    async fn provision(&self, api: &A, website_name: &str) -> Result<RemoteSite> {
        let slug = sitedrop_core::site_slug(website_name);
        tracing::info!(stage = DeployStage::ProvisioningSite.as_str(), %slug, "Creating site");

        let site = api.create_site(&slug).await?;
        tracing::info!(site_id = %site.id, url = %site.url, "Site created");
        Ok(site)
    }

    async fn upload(
        &self,
        api: &A,
        website_name: &str,
        site: RemoteSite,
        artifact: DeployArtifact,
    ) -> Result<DeploySummary> {
        tracing::info!(
            stage = DeployStage::UploadingArtifact.as_str(),
            site_id = %site.id,
            bytes = artifact.len(),
            "Uploading deploy archive"
        );

        let deploy = match api.create_deploy(&site.id, artifact).await {
            Ok(deploy) => deploy,
            Err(err) => return Err(self.abandon(api, &site, err).await),
        };
        tracing::info!(
            site_id = %site.id,
            deploy_id = %deploy.id,
            state = deploy.state.as_deref().unwrap_or("unknown"),
            "Deploy uploaded"
        );

        Ok(DeploySummary {
            url: site.url,
            admin_url: self.config.admin_url(website_name),
            site_id: site.id,
            deploy_id: deploy.id,
            message: DEPLOY_SUCCESS_MESSAGE.to_string(),
        })
    }

    /// A site exists upstream but its content never arrived.
    /// Optionally delete it, then hand back the original error.
    async fn abandon(&self, api: &A, site: &RemoteSite, err: DeployError) -> DeployError {
        if !self.config.cleanup_on_failure {
            tracing::warn!(site_id = %site.id, "Deploy failed; site left in place without content");
            return err;
        }

        match api.delete_site(&site.id).await {
            Ok(()) => tracing::info!(site_id = %site.id, "Removed site after failed deploy"),
            Err(cleanup_err) => tracing::warn!(
                site_id = %site.id,
                error = %cleanup_err,
                "Could not remove site after failed deploy"
            ),
        }
        err
    }
}
