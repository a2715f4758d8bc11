// Deployment targets and the request handler that drives them

pub mod handler;
pub mod netlify;

use async_trait::async_trait;
use sitedrop_core::{DeployArtifact, RemoteDeploy, RemoteSite, Result};

pub use handler::{DeployHandler, HandlerResponse};
pub use netlify::NetlifyClient;

/// Remote hosting platform a site can be provisioned on and deployed to
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Create a new, empty site under the given slug
    async fn create_site(&self, name: &str) -> Result<RemoteSite>;

    /// Upload an archive as a new deploy of an existing site
    async fn create_deploy(&self, site_id: &str, artifact: DeployArtifact) -> Result<RemoteDeploy>;

    async fn delete_site(&self, site_id: &str) -> Result<()>;
}
