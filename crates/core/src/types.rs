use crate::error::{DeployError, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Confirmation text returned with every successful deploy
pub const DEPLOY_SUCCESS_MESSAGE: &str = "Website deployed successfully!";

/// Standard alphabet, padding optional
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A validated deploy request with its payload already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Display name exactly as the caller sent it
    pub website_name: String,
    pub file_name: String,
    pub file_bytes: Vec<u8>,
}

impl DeployRequest {
    pub fn new(
        website_name: impl Into<String>,
        file_name: impl Into<String>,
        file_bytes: Vec<u8>,
    ) -> Self {
        Self {
            website_name: website_name.into(),
            file_name: file_name.into(),
            file_bytes,
        }
    }

    /// Parse and validate a raw `{ websiteName, fileName, fileData }` body.
    ///
    /// Nothing is sent anywhere until this succeeds, so a malformed body
    /// always fails with `InvalidInput` naming the offending field.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| DeployError::invalid_input("body", format!("not valid JSON ({e})")))?;
        let object = value
            .as_object()
            .ok_or_else(|| DeployError::invalid_input("body", "expected a JSON object"))?;

        let website_name = non_empty_field(object, "websiteName")?;
        let file_name = non_empty_field(object, "fileName")?;
        let file_bytes = decode_payload(string_field(object, "fileData")?)?;

        Ok(Self::new(website_name, file_name, file_bytes))
    }

    /// Remote-platform-safe site name derived from the display name
    pub fn site_slug(&self) -> String {
        site_slug(&self.website_name)
    }

    /// Whether the payload is already a ZIP archive
    pub fn is_zip(&self) -> bool {
        // Case-insensitive on purpose: "SITE.ZIP" is an archive, not a page
        self.file_name.to_ascii_lowercase().ends_with(".zip")
    }
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    match object.get(field) {
        None | Some(Value::Null) => Err(DeployError::invalid_input(field, "field is required")),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(DeployError::invalid_input(field, "expected a string")),
    }
}

fn non_empty_field<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    let value = string_field(object, field)?;
    if value.is_empty() {
        return Err(DeployError::invalid_input(field, "must not be empty"));
    }
    Ok(value)
}

/// Decode base64 file data, ignoring embedded whitespace and missing padding
pub fn decode_payload(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    PAYLOAD_ENGINE
        .decode(compact)
        .map_err(|e| DeployError::invalid_input("fileData", format!("not valid base64 ({e})")))
}

/// Derive a site name the hosting platform accepts.
///
/// Lowercases the name, then replaces every character outside `[a-z0-9-]`
/// with `-`, one per UTF-16 code unit, so characters outside the Basic
/// Multilingual Plane become two hyphens. Nothing is collapsed or trimmed.
/// Example: "My Site!" -> "my-site-"
pub fn site_slug(website_name: &str) -> String {
    let lowered = website_name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
        } else {
            slug.extend(std::iter::repeat_n('-', c.len_utf16()));
        }
    }
    slug
}

/// Site as provisioned by the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSite {
    pub id: String,
    /// Public URL, HTTPS preferred
    pub url: String,
}

/// Deploy created by uploading an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDeploy {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Everything the caller learns about a successful deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySummary {
    pub url: String,
    pub admin_url: String,
    pub site_id: String,
    pub deploy_id: String,
    pub message: String,
}

/// Response body of a deploy invocation.
///
/// Serializes as either `{ success: true, url, adminUrl, siteId, deployId,
/// message }` or `{ success: false, error }`, never a mix of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployResult {
    Deployed(DeploySummary),
    Failed { error: String },
}

impl DeployResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deployed(_))
    }
}

impl Serialize for DeployResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            success: bool,
            #[serde(flatten)]
            summary: Option<&'a DeploySummary>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let body = match self {
            Self::Deployed(summary) => Body {
                success: true,
                summary: Some(summary),
                error: None,
            },
            Self::Failed { error } => Body {
                success: false,
                summary: None,
                error: Some(error.as_str()),
            },
        };
        body.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_site_slug_basic() {
        assert_eq!(site_slug("My Site!"), "my-site-");
    }

    #[test]
    fn test_site_slug_keeps_digits_and_hyphens() {
        assert_eq!(site_slug("shop-2024"), "shop-2024");
    }

    #[test]
    fn test_site_slug_replaces_one_for_one() {
        // No collapsing of runs and no trimming
        assert_eq!(site_slug("  a__b  "), "--a--b--");
        assert_eq!(site_slug("Caf\u{e9} Tacvba"), "caf--tacvba");
    }

    #[test]
    fn test_site_slug_charset_and_length() {
        let names = ["My Site!", "ÄÖÜ shop", "dots.and_underscores", "UPPER", "x/y?z=1", "emoji 🚀"];
        for name in names {
            let slug = site_slug(name);
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "slug {slug:?} for {name:?} has disallowed characters"
            );
            assert_eq!(slug.chars().count(), name.to_lowercase().encode_utf16().count());
        }
    }

    #[test]
    fn test_site_slug_astral_chars_take_two_hyphens() {
        assert_eq!(site_slug("emoji 🚀"), "emoji---");
        assert_eq!(site_slug("𝒜b"), "--b");
    }

    #[test]
    fn test_from_json_decodes_payload() {
        let request = DeployRequest::from_json(&body(json!({
            "websiteName": "My Site!",
            "fileName": "index.html",
            "fileData": "PGgxPmhpPC9oMT4=",
        })))
        .unwrap();

        assert_eq!(request.website_name, "My Site!");
        assert_eq!(request.file_name, "index.html");
        assert_eq!(request.file_bytes, b"<h1>hi</h1>");
        assert_eq!(request.site_slug(), "my-site-");
        assert!(!request.is_zip());
    }

    #[test]
    fn test_from_json_accepts_unpadded_and_wrapped_base64() {
        let request = DeployRequest::from_json(&body(json!({
            "websiteName": "a",
            "fileName": "b.html",
            "fileData": "PGgxPmhp\nPC9oMT4",
        })))
        .unwrap();
        assert_eq!(request.file_bytes, b"<h1>hi</h1>");
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = DeployRequest::from_json(b"[1, 2]").unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "body", .. }));

        let err = DeployRequest::from_json(b"not json").unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "body", .. }));
    }

    #[test]
    fn test_from_json_names_missing_field() {
        let err = DeployRequest::from_json(&body(json!({
            "fileName": "index.html",
            "fileData": "",
        })))
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "websiteName", .. }));

        let err = DeployRequest::from_json(&body(json!({
            "websiteName": "site",
            "fileName": "index.html",
        })))
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "fileData", .. }));
    }

    #[test]
    fn test_from_json_rejects_wrong_types_and_empty_names() {
        let err = DeployRequest::from_json(&body(json!({
            "websiteName": 42,
            "fileName": "index.html",
            "fileData": "",
        })))
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "websiteName", .. }));

        let err = DeployRequest::from_json(&body(json!({
            "websiteName": "site",
            "fileName": "",
            "fileData": "",
        })))
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "fileName", .. }));
    }

    #[test]
    fn test_from_json_rejects_bad_base64() {
        let err = DeployRequest::from_json(&body(json!({
            "websiteName": "site",
            "fileName": "site.zip",
            "fileData": "%%%not-base64%%%",
        })))
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput { field: "fileData", .. }));
    }

    #[test]
    fn test_is_zip_ignores_case() {
        assert!(DeployRequest::new("s", "bundle.zip", vec![]).is_zip());
        assert!(DeployRequest::new("s", "BUNDLE.ZIP", vec![]).is_zip());
        assert!(!DeployRequest::new("s", "zip.html", vec![]).is_zip());
    }

    #[test]
    fn test_deploy_result_shapes() {
        let deployed = DeployResult::Deployed(DeploySummary {
            url: "https://my-site-.netlify.app".to_string(),
            admin_url: "https://app.netlify.com/sites/My Site!".to_string(),
            site_id: "site-1".to_string(),
            deploy_id: "deploy-1".to_string(),
            message: DEPLOY_SUCCESS_MESSAGE.to_string(),
        });
        assert_eq!(
            serde_json::to_value(&deployed).unwrap(),
            json!({
                "success": true,
                "url": "https://my-site-.netlify.app",
                "adminUrl": "https://app.netlify.com/sites/My Site!",
                "siteId": "site-1",
                "deployId": "deploy-1",
                "message": DEPLOY_SUCCESS_MESSAGE,
            })
        );

        let failed = DeployResult::failed("name taken");
        assert!(!failed.is_success());
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({ "success": false, "error": "name taken" })
        );
    }
}
