// Netlify REST API client

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sitedrop_core::artifact::ZIP_CONTENT_TYPE;
use sitedrop_core::{DeployArtifact, DeployError, RemoteDeploy, RemoteSite, Result};

use crate::HostingApi;

/// Netlify API client
#[derive(Debug, Clone)]
pub struct NetlifyClient {
    client: reqwest::Client,
    api_base: String,
}

/// Site info from API
#[derive(Debug, Deserialize)]
struct SiteResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ssl_url: Option<String>,
}

/// Deploy info from API
#[derive(Debug, Deserialize)]
struct DeployResponse {
    id: String,
    #[serde(default)]
    state: Option<String>,
}

impl NetlifyClient {
    /// Create new Netlify API client
    pub fn new(api_token: &str, api_base: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_token)).map_err(|_| {
            DeployError::MissingConfiguration(
                "API key contains characters not allowed in a header".to_string(),
            )
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

#[async_trait]
impl HostingApi for NetlifyClient {
    async fn create_site(&self, name: &str) -> Result<RemoteSite> {
        #[derive(Serialize)]
        struct CreateSiteRequest<'a> {
            name: &'a str,
        }

        let response = self
            .client
            .post(self.endpoint("/sites"))
            .json(&CreateSiteRequest { name })
            .send()
            .await
            .map_err(transport)?;

        let site: SiteResponse = read_json(response).await?;
        let url = site
            .ssl_url
            .filter(|u| !u.is_empty())
            .or(site.url.filter(|u| !u.is_empty()))
            .unwrap_or_else(|| format!("https://{}.netlify.app", name));

        tracing::debug!(site_id = %site.id, %url, "Netlify site created");
        Ok(RemoteSite { id: site.id, url })
    }

    async fn create_deploy(&self, site_id: &str, artifact: DeployArtifact) -> Result<RemoteDeploy> {
        let size = artifact.len();
        let response = self
            .client
            .post(self.endpoint(&format!("/sites/{}/deploys", site_id)))
            .header(CONTENT_TYPE, ZIP_CONTENT_TYPE)
            .body(artifact.into_bytes())
            .send()
            .await
            .map_err(transport)?;

        let deploy: DeployResponse = read_json(response).await?;
        tracing::debug!(site_id, deploy_id = %deploy.id, bytes = size, "Netlify deploy created");
        Ok(RemoteDeploy {
            id: deploy.id,
            state: deploy.state,
        })
    }

    async fn delete_site(&self, site_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/sites/{}", site_id)))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status, &body));
        }
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> DeployError {
    DeployError::Transport(err.to_string())
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(upstream_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| DeployError::UpstreamFailure {
        status: status.as_u16(),
        message: format!("Unexpected response from Netlify: {}", e),
    })
}

/// Prefer the platform's own explanation over a generic status line
fn upstream_error(status: StatusCode, body: &str) -> DeployError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    DeployError::UpstreamFailure {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_uses_message_field() {
        let err = upstream_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"message":"name taken"}"#,
        );
        assert_eq!(
            err,
            DeployError::UpstreamFailure {
                status: 422,
                message: "name taken".to_string()
            }
        );
    }

    #[test]
    fn test_upstream_error_ignores_error_field() {
        // Only `message` is forwarded; anything else gets the status line
        let err = upstream_error(StatusCode::UNAUTHORIZED, r#"{"error":"invalid token"}"#);
        assert_eq!(err.to_string(), "Request failed with status code 401");
    }

    #[test]
    fn test_upstream_error_generic_when_body_is_not_json() {
        let err = upstream_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.to_string(), "Request failed with status code 502");
    }

    #[test]
    fn test_new_rejects_token_with_newline() {
        let err = NetlifyClient::new("abc\ndef", "https://api.netlify.com/api/v1").unwrap_err();
        assert_eq!(err.error_type(), "configuration_error");
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = NetlifyClient::new("token", "https://api.netlify.com/api/v1/").unwrap();
        assert_eq!(
            client.endpoint("/sites"),
            "https://api.netlify.com/api/v1/sites"
        );
    }
}
