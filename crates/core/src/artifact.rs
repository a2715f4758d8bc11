use crate::error::{DeployError, Result};
use crate::types::DeployRequest;
use serde::Serialize;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Name of the deploy configuration file Netlify reads from the archive root
pub const MANIFEST_FILE_NAME: &str = "netlify.toml";

/// Entry page of a single-file site
pub const INDEX_FILE_NAME: &str = "index.html";

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// ZIP bytes ready to upload as a deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArtifact {
    bytes: Vec<u8>,
}

/// netlify.toml contents for a single-page site
#[derive(Debug, Serialize)]
struct Manifest {
    build: BuildSettings,
    redirects: Vec<Redirect>,
}

#[derive(Debug, Serialize)]
struct BuildSettings {
    publish: String,
}

#[derive(Debug, Serialize)]
struct Redirect {
    from: String,
    to: String,
    status: u16,
}

impl DeployArtifact {
    /// Use an existing archive as-is
    pub fn from_zip_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Pick the packaging for a request: ZIP payloads pass through
    /// untouched, anything else is treated as the page's HTML.
    pub fn from_request(request: &DeployRequest) -> Result<Self> {
        if request.is_zip() {
            Ok(Self::from_zip_bytes(request.file_bytes.clone()))
        } else {
            Self::single_page(&String::from_utf8_lossy(&request.file_bytes))
        }
    }

    /// Wrap one HTML document into an archive that serves it for every path
    pub fn single_page(html: &str) -> Result<Self> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(INDEX_FILE_NAME, options)?;
        zip.write_all(html.as_bytes())?;

        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(single_page_manifest()?.as_bytes())?;

        let bytes = zip.finish()?.into_inner();
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Publish from the archive root and route every path to index.html
fn single_page_manifest() -> Result<String> {
    let manifest = Manifest {
        build: BuildSettings {
            publish: ".".to_string(),
        },
        redirects: vec![Redirect {
            from: "/*".to_string(),
            to: format!("/{INDEX_FILE_NAME}"),
            status: 200,
        }],
    };
    toml::to_string(&manifest).map_err(|e| DeployError::Archive(e.to_string()))
}
