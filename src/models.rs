use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MEDIA_TYPE: &str = "website";
pub const HTML_CONTENT_TYPE: &str = "text/html";

// ── HTTP request body ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

// ── Fetch options ────────────────────────────────────────────────────────────

/// Everything the transport needs to fetch one link.
///
/// `timeout` is accepted for callers that carry one around, but the pipeline
/// always replaces it with its own fixed request timeout.
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

impl PreviewOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<&str> for PreviewOptions {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for PreviewOptions {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<PreviewRequest> for PreviewOptions {
    fn from(req: PreviewRequest) -> Self {
        let mut headers: Vec<(String, String)> = req.headers.into_iter().collect();
        headers.sort();
        Self {
            url: req.url,
            headers,
            ..Default::default()
        }
    }
}

// ── Preview record ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    pub url: String,
    pub secure_url: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub url: String,
    pub load_failed: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub media_type: String,
    pub images: Vec<String>,
    pub videos: Option<Vec<VideoDescriptor>>,
    /// Never filled in; kept so consumers see the same shape as images/videos.
    pub audios: Option<Vec<String>>,
}

impl PreviewResult {
    /// Record for a link whose body could not be obtained.
    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            load_failed: true,
            title: None,
            description: None,
            content_type: None,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            images: Vec::new(),
            videos: None,
            audios: None,
        }
    }

    /// Record for a non-HTML resource classified from its `content-type` header.
    ///
    /// Title and description are empty strings rather than absent here.
    pub fn media(url: impl Into<String>, resolved: &str, content_type: &str) -> Self {
        let is_image = content_type.starts_with("image/");
        Self {
            url: url.into(),
            load_failed: false,
            title: Some(String::new()),
            description: Some(String::new()),
            content_type: Some(content_type.to_string()),
            media_type: if is_image { "photo" } else { DEFAULT_MEDIA_TYPE }.to_string(),
            images: if is_image {
                vec![resolved.to_string()]
            } else {
                Vec::new()
            },
            videos: None,
            audios: None,
        }
    }

    /// Record assembled from a parsed HTML page.
    pub(crate) fn page(
        url: impl Into<String>,
        title: Option<String>,
        description: Option<String>,
        media_type: Option<String>,
        images: Vec<String>,
        videos: Option<Vec<VideoDescriptor>>,
    ) -> Self {
        Self {
            url: url.into(),
            load_failed: false,
            title,
            description,
            content_type: Some(HTML_CONTENT_TYPE.to_string()),
            media_type: media_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            images,
            videos,
            audios: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = PreviewResult::page(
            "https://example.com",
            Some("Title".to_string()),
            None,
            None,
            vec!["https://example.com/a.png".to_string()],
            Some(vec![VideoDescriptor {
                url: "https://example.com/v.mp4".to_string(),
                secure_url: None,
                mime_type: Some("video/mp4".to_string()),
                width: Some("640".to_string()),
                height: None,
            }]),
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "url": "https://example.com",
                "loadFailed": false,
                "title": "Title",
                "description": null,
                "contentType": "text/html",
                "mediaType": "website",
                "images": ["https://example.com/a.png"],
                "videos": [{
                    "url": "https://example.com/v.mp4",
                    "secureUrl": null,
                    "type": "video/mp4",
                    "width": "640",
                    "height": null
                }],
                "audios": null
            })
        );
    }

    #[test]
    fn media_records_for_images_and_other_types() {
        let photo = PreviewResult::media("https://x.test/p.jpg", "https://x.test/p.jpg", "image/jpeg");
        assert_eq!(photo.media_type, "photo");
        assert_eq!(photo.images, vec!["https://x.test/p.jpg"]);
        assert_eq!(photo.title.as_deref(), Some(""));
        assert_eq!(photo.description.as_deref(), Some(""));

        let pdf = PreviewResult::media("https://x.test/a.pdf", "https://x.test/a.pdf", "application/pdf");
        assert_eq!(pdf.media_type, "website");
        assert!(pdf.images.is_empty());
        assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn failed_record_is_empty() {
        let failed = PreviewResult::failed("https://x.test");
        assert!(failed.load_failed);
        assert_eq!(failed.title, None);
        assert_eq!(failed.content_type, None);
        assert!(failed.images.is_empty());
        assert_eq!(failed.videos, None);
    }

    #[test]
    fn request_body_becomes_options() {
        let req: PreviewRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "headers": {"Cookie": "a=b"}}"#,
        )
        .unwrap();
        let options = PreviewOptions::from(req);
        assert_eq!(options.url, "https://example.com");
        assert_eq!(options.headers, vec![("Cookie".to_string(), "a=b".to_string())]);
        assert_eq!(options.timeout, None);
    }
}
