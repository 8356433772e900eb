//! Targeted crawl adapter
//!
//! Fetches one URL and extracts readable text from the HTML body.

use super::{ToolAdapter, ToolError, ToolOptions};
use async_trait::async_trait;
use relay_core::{Evidence, ToolKind};

/// Characters of extracted text retained per page
const MAX_EXTRACT_CHARS: usize = 4000;

/// Adapter that fetches a specific URL
#[derive(Default)]
pub struct TargetedCrawlAdapter {
    client: reqwest::Client,
}

impl TargetedCrawlAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self::default()
    }

    fn target_from(query: &str, options: &ToolOptions) -> Option<String> {
        if let Some(target) = &options.target {
            return Some(target.clone());
        }
        query
            .split_whitespace()
            .find(|word| word.starts_with("http://") || word.starts_with("https://"))
            .map(|word| word.trim_end_matches([',', '.', ')', ']']).to_string())
    }
}

/// Case-insensitive prefix check over a char slice
fn starts_with_ignore_case(chars: &[char], prefix: &str) -> bool {
    let prefix: Vec<char> = prefix.chars().collect();
    chars.len() >= prefix.len()
        && chars[..prefix.len()]
            .iter()
            .zip(&prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Strip tags, scripts and styles from an HTML body
fn extract_text(html: &str) -> String {
    let chars: Vec<char> = html.chars().collect();
    let mut text = String::new();
    let mut i = 0;
    let mut in_tag = false;
    let mut skip_until: Option<&'static str> = None;

    while i < chars.len() {
        if let Some(end) = skip_until {
            if starts_with_ignore_case(&chars[i..], end) {
                i += end.chars().count();
                skip_until = None;
                in_tag = true; // consume the rest of the closing tag
            } else {
                i += 1;
            }
            continue;
        }

        let c = chars[i];
        if in_tag {
            if c == '>' {
                in_tag = false;
                // Tags separate words; the collapse below dedupes spaces.
                text.push(' ');
            }
            i += 1;
            continue;
        }

        if c == '<' {
            if starts_with_ignore_case(&chars[i..], "<script") {
                skip_until = Some("</script");
            } else if starts_with_ignore_case(&chars[i..], "<style") {
                skip_until = Some("</style");
            } else {
                in_tag = true;
            }
            i += 1;
            continue;
        }

        text.push(c);
        i += 1;
    }

    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_EXTRACT_CHARS).collect()
}

#[async_trait]
impl ToolAdapter for TargetedCrawlAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::TargetedCrawl
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn execute(&self, query: &str, options: &ToolOptions) -> Result<Vec<Evidence>, ToolError> {
        let target = Self::target_from(query, options)
            .ok_or_else(|| ToolError::InvalidInput("no target URL in query".to_string()))?;

        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| ToolError::transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("crawl target returned {}", status);
            return Err(if status.is_server_error() {
                ToolError::transient(message)
            } else {
                ToolError::permanent(message)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::transient(e.to_string()))?;

        let text = extract_text(&body);
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Evidence::new(text, target)])
    }
}
