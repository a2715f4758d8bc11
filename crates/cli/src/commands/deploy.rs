use anyhow::{Context, Result};
use sitedrop_core::{DeployArtifact, DeployConfig, DeployRequest, DeployResult};
use sitedrop_deployer::DeployHandler;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// What gets uploaded for a local path
enum LocalPayload {
    /// Single file, packaged the same way as an HTTP request
    File(DeployRequest),
    /// Directory, zipped here
    Directory(DeployArtifact),
}

/// Deploy a local file or directory as a new site
pub async fn run(name: String, path: PathBuf) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let config = DeployConfig::from_env().context("Failed to load configuration")?;
    let handler = DeployHandler::from_config(config).context("Failed to create Netlify client")?;

    println!("🚀 Deploying {} as \"{}\"...", path.display(), name);
    let payload = load_payload(&name, &path)?;

    let outcome = match payload {
        LocalPayload::File(request) => handler.deploy(&request).await,
        LocalPayload::Directory(artifact) => handler.deploy_artifact(&name, artifact).await,
    };

    let result = match outcome {
        Ok(summary) => DeployResult::Deployed(summary),
        Err(err) => DeployResult::failed(err.to_string()),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );

    if !result.is_success() {
        anyhow::bail!("Deployment failed");
    }
    Ok(())
}

fn load_payload(name: &str, path: &Path) -> Result<LocalPayload> {
    if path.is_dir() {
        let artifact = zip_directory(path)?;
        println!("   ✓ Packaged directory ({} bytes)", artifact.len());
        return Ok(LocalPayload::Directory(artifact));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid file name")?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(LocalPayload::File(DeployRequest::new(name, file_name, bytes)))
}

/// Zip a directory tree in memory, paths relative to its root
fn zip_directory(dir: &Path) -> Result<DeployArtifact> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut files = 0;
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let relative_path = path
            .strip_prefix(dir)
            .context("Failed to get relative path")?;

        // Archive paths always use forward slashes
        let entry_name = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(entry_name, options)?;
        let contents =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        zip.write_all(&contents)?;
        files += 1;
    }

    if files == 0 {
        anyhow::bail!("Directory {} contains no files to deploy", dir.display());
    }

    let bytes = zip.finish()?.into_inner();
    Ok(DeployArtifact::from_zip_bytes(bytes))
}
