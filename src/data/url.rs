// URL-derived page attributes.

use url::Url;

/// Host part of a URL, lowercased. Falls back to splitting on `/` for
/// strings the URL parser rejects (the dataset has a few of those).
fn host(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        Err(_) => {
            let lower = url.to_lowercase();
            let mut parts = lower.split('/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(_), Some(""), Some(host)) => host.to_string(),
                (Some(first), _, _) => first.to_string(),
                _ => String::new(),
            }
        }
    }
}

/// Registered domain of a URL.
///
/// Keeps the last two host labels, or the last three when the second-to-last
/// label is `com` or `co` (so `news.bbc.co.uk` → `bbc.co.uk`).
pub fn extract_domain(url: &str) -> String {
    let host = host(url);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();

    if labels.len() < 2 {
        return labels.join(".");
    }

    let keep = if matches!(labels[labels.len() - 2], "com" | "co") && labels.len() >= 3 {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}
