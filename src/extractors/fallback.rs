//! Generic paragraph scrape, the last resort in the strategy chain.
//!
//! Locates the likeliest content container (`<article>`, then a `div` whose
//! class or id mentions "article" or "content", then the whole document),
//! joins its paragraphs, and takes the first three as a naive summary.
//! Script, style, navigation, header, footer and aside content is ignored.

use super::{Extract, ensure_sufficient};
use crate::error::ExtractError;
use crate::fetch::HttpFetcher;
use crate::models::{ExtractionResult, RawExtraction, Strategy};
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("valid selector"));
static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("valid selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").expect("valid selector"));

const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

#[derive(Debug, Clone)]
pub struct FallbackExtractor {
    fetcher: HttpFetcher,
    min_content_chars: usize,
}

impl FallbackExtractor {
    pub fn new(fetcher: HttpFetcher, min_content_chars: usize) -> Self {
        Self {
            fetcher,
            min_content_chars,
        }
    }
}

impl Extract for FallbackExtractor {
    fn name(&self) -> &'static str {
        "fallback"
    }

    #[instrument(level = "info", skip(self))]
    async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        let page = self.fetcher.get_html(url).await?;
        let raw = scrape_paragraphs(&page.body);
        let result = ExtractionResult::normalize(raw, &page.final_url, Strategy::Fallback);
        let result = ensure_sufficient(result, self.min_content_chars)?;
        info!(chars = result.text_len(), "Fallback extraction succeeded");
        Ok(result)
    }
}

fn is_stripped(el: ElementRef) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|a| STRIPPED_TAGS.contains(&a.value().name()))
}

fn mentions_content(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.to_lowercase();
        v.contains("article") || v.contains("content")
    })
}

fn content_container(document: &Html) -> Option<ElementRef<'_>> {
    let visible = |el: &ElementRef| !is_stripped(*el);
    document
        .select(&ARTICLE)
        .find(visible)
        .or_else(|| {
            document
                .select(&DIV)
                .filter(visible)
                .find(|d| mentions_content(d.value().attr("class")))
        })
        .or_else(|| {
            document
                .select(&DIV)
                .filter(visible)
                .find(|d| mentions_content(d.value().id()))
        })
}

/// Scrape paragraph text from raw HTML.
pub fn scrape_paragraphs(html: &str) -> RawExtraction {
    let document = Html::parse_document(html);
    let root = content_container(&document).unwrap_or_else(|| document.root_element());

    let paragraphs = root
        .select(&PARAGRAPH)
        .filter(|p| !is_stripped(*p))
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>();

    let title = document
        .select(&H1)
        .map(|h| collapse_whitespace(&h.text().collect::<String>()))
        .find(|t| !t.is_empty());

    let images = document
        .select(&IMAGE)
        .filter(|img| !is_stripped(*img))
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect();

    let summary = paragraphs.iter().take(3).cloned().collect::<Vec<_>>().join("\n");

    RawExtraction {
        title,
        full_text: paragraphs.join("\n\n"),
        authors: Vec::new(),
        top_image: None,
        images,
        keywords: Vec::new(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_prefers_article_element() {
        let html = r#"<html><body>
            <nav><p>Menu item that should never show up</p></nav>
            <p>Outside paragraph</p>
            <article><h1>Headline</h1><p>Inside one</p><script>var x = 1;</script><p>Inside two</p></article>
        </body></html>"#;
        let raw = scrape_paragraphs(html);
        assert_eq!(raw.full_text, "Inside one\n\nInside two");
        assert_eq!(raw.title.as_deref(), Some("Headline"));
        assert_eq!(raw.summary, "Inside one\nInside two");
    }

    #[test]
    fn test_content_class_container() {
        let html = r#"<html><body>
            <div class="sidebar"><p>Sidebar noise</p></div>
            <div class="post-Content"><p>Real text</p></div>
        </body></html>"#;
        assert_eq!(scrape_paragraphs(html).full_text, "Real text");
    }

    #[test]
    fn test_content_id_container() {
        let html = r#"<html><body>
            <div class="wrapper"><p>Teaser</p></div>
            <div id="article-body"><p>Body text</p></div>
        </body></html>"#;
        assert_eq!(scrape_paragraphs(html).full_text, "Body text");
    }

    #[test]
    fn test_all_paragraphs_without_container() {
        let html = r#"<html><body>
            <header><p>Site header</p></header>
            <div><p>One</p></div><div><p>Two</p><p>Three</p><p>Four</p></div>
            <footer><p>Footer</p></footer>
        </body></html>"#;
        let raw = scrape_paragraphs(html);
        assert_eq!(raw.full_text, "One\n\nTwo\n\nThree\n\nFour");
        assert_eq!(raw.summary, "One\nTwo\nThree");
    }

    #[test]
    fn test_images_are_normalized_by_result() {
        let html = r#"<html><body><article><p>Text</p>
            <img src="/a.jpg"><img src="https://cdn.example/b.jpg"><img src="c.png">
        </article></body></html>"#;
        let raw = scrape_paragraphs(html);
        let result =
            ExtractionResult::normalize(raw, "https://news.example/x/story", Strategy::Fallback);
        assert_eq!(
            result.images,
            vec![
                "https://news.example/a.jpg".to_string(),
                "https://cdn.example/b.jpg".to_string(),
                "https://news.example/x/c.png".to_string(),
            ]
        );
        assert_eq!(result.top_image.as_deref(), Some("https://news.example/a.jpg"));
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        let body = format!(
            "<html><body><article>{}</article></body></html>",
            (0..4)
                .map(|i| format!("<p>Paragraph {i} of a wire story with enough words to matter.</p>"))
                .collect::<String>()
        );
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/wire")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        let fetcher = HttpFetcher::new(10, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let result = FallbackExtractor::new(fetcher, 100)
            .extract(&format!("{}/wire", server.url()))
            .await
            .unwrap();
        assert_eq!(result.strategy, Strategy::Fallback);
        assert!(result.summary.starts_with("Paragraph 0"));
        assert!(!result.summary.contains("Paragraph 3"));
    }

    #[tokio::test]
    async fn test_extract_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(410)
            .create_async()
            .await;
        let fetcher = HttpFetcher::new(10, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let err = FallbackExtractor::new(fetcher, 100)
            .extract(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
