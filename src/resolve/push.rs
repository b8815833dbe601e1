//! Assets referenced while rendering one response.

use rustc_hash::FxHashSet;
use std::path::Path;

/// Ordered, de-duplicated URLs to announce for HTTP/2 push or preload.
///
/// One accumulator per response; pass it to
/// [`ManifestResolver::asset_path_with`](super::ManifestResolver::asset_path_with).
#[derive(Debug, Clone, Default)]
pub struct PushPromises {
    urls: Vec<String>,
    seen: FxHashSet<String>,
}

impl PushPromises {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url`; repeats keep their first position.
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.seen.clear();
    }

    /// Value for a `Link` response header, `None` when nothing was pushed.
    pub fn link_header(&self) -> Option<String> {
        if self.urls.is_empty() {
            return None;
        }
        let links: Vec<String> = self
            .urls
            .iter()
            .map(|url| match destination(url) {
                Some(kind) => format!("<{url}>; rel=preload; as={kind}"),
                None => format!("<{url}>; rel=preload"),
            })
            .collect();
        Some(links.join(", "))
    }
}

/// The `as=` value for a preload link.
fn destination(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "js" => Some("script"),
        "css" => Some("style"),
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" => Some("image"),
        "woff" | "woff2" | "ttf" | "otf" | "eot" => Some("font"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_dedupes_in_order() {
        let mut push = PushPromises::new();
        push.push("/assets/app.js");
        push.push("/assets/app.css");
        push.push("/assets/app.js");

        assert_eq!(push.len(), 2);
        assert_eq!(push.iter().collect::<Vec<_>>(), ["/assets/app.js", "/assets/app.css"]);

        push.clear();
        assert!(push.is_empty());
        assert!(!push.contains("/assets/app.js"));
    }

    #[test]
    fn test_link_header() {
        let mut push = PushPromises::new();
        assert_eq!(push.link_header(), None);

        push.push("/assets/app-1.js");
        push.push("/assets/app.css?v=2");
        push.push("/assets/font.woff2");
        push.push("/assets/data.json");
        assert_eq!(
            push.link_header().unwrap(),
            "</assets/app-1.js>; rel=preload; as=script, \
             </assets/app.css?v=2>; rel=preload; as=style, \
             </assets/font.woff2>; rel=preload; as=font, \
             </assets/data.json>; rel=preload"
        );
    }
}
