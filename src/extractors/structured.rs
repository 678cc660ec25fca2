//! Structured article extraction.
//!
//! A readability-style pass over the document:
//!
//! - Every paragraph outside boilerplate (navigation, headers, footers,
//!   sidebars, share widgets, ...) is scored by length and comma count.
//! - The score is credited to the paragraph's parent in full and to its
//!   grandparent at half weight.
//! - Containers get a bonus or penalty from their class/id, and are
//!   discounted by link density.
//! - The best container, plus strong siblings, supplies the article text.
//!
//! Metadata (title, authors, lead image, keywords) comes from Open Graph,
//! `<meta>` tags, microdata and JSON-LD, with term-frequency keywords and an
//! extractive summary when the page has none.

use super::{Extract, ensure_sufficient, nlp};
use crate::error::ExtractError;
use crate::fetch::HttpFetcher;
use crate::models::{ExtractionResult, MAX_KEYWORDS, RawExtraction, Strategy};
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| sel("p"));
static LINK: Lazy<Selector> = Lazy::new(|| sel("a"));
static IMAGE: Lazy<Selector> = Lazy::new(|| sel("img"));
static TITLE: Lazy<Selector> = Lazy::new(|| sel("title"));
static H1: Lazy<Selector> = Lazy::new(|| sel("h1"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| sel(r#"meta[property="og:title"]"#));
static TOP_IMAGE: Lazy<Selector> = Lazy::new(|| {
    sel(r#"meta[property="og:image"], meta[name="twitter:image"], meta[property="twitter:image"], link[rel="image_src"]"#)
});
static META_AUTHOR: Lazy<Selector> =
    Lazy::new(|| sel(r#"meta[name="author"], meta[property="article:author"]"#));
static MARKUP_AUTHOR: Lazy<Selector> = Lazy::new(|| sel(r#"[rel="author"], [itemprop="author"]"#));
static ITEMPROP_NAME: Lazy<Selector> = Lazy::new(|| sel(r#"[itemprop="name"]"#));
static META_KEYWORDS: Lazy<Selector> =
    Lazy::new(|| sel(r#"meta[name="keywords"], meta[name="news_keywords"]"#));
static JSON_LD: Lazy<Selector> = Lazy::new(|| sel(r#"script[type="application/ld+json"]"#));

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|main|page|post|story|text|blog").expect("valid regex")
});
static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)comment|footer|footnote|sidebar|widget|promo|related|share|social|sponsor|advert|banner|breadcrumb|newsletter|subscribe|cookie|popup|menu|masthead")
        .expect("valid regex")
});
static HIDDEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)comment|sidebar|related|share|social|newsletter|promo|advert|cookie|popup")
        .expect("valid regex")
});
static BYLINE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*by\s+").expect("valid regex"));

const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "form", "noscript", "button",
];

/// Paragraphs shorter than this do not vote for their container.
const MIN_PARAGRAPH_CHARS: usize = 25;

/// Structured extractor backed by the shared HTTP client.
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    fetcher: HttpFetcher,
    min_content_chars: usize,
}

impl StructuredExtractor {
    pub fn new(fetcher: HttpFetcher, min_content_chars: usize) -> Self {
        Self {
            fetcher,
            min_content_chars,
        }
    }
}

impl Extract for StructuredExtractor {
    fn name(&self) -> &'static str {
        "structured"
    }

    #[instrument(level = "info", skip(self))]
    async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        let page = self.fetcher.get_html(url).await?;
        let raw = parse_article(&page.body, &page.final_url);
        let result = ExtractionResult::normalize(raw, &page.final_url, Strategy::Structured);
        let result = ensure_sufficient(result, self.min_content_chars)?;
        info!(chars = result.text_len(), "Structured extraction succeeded");
        Ok(result)
    }
}

/// Parse an article page into raw fields. Never fails; a page without
/// recognizable content yields empty text.
pub fn parse_article(html: &str, page_url: &str) -> RawExtraction {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &OG_TITLE)
        .or_else(|| first_text(&document, &TITLE))
        .or_else(|| first_text(&document, &H1));

    let best = best_container(&document);
    let paragraphs = best.map(content_paragraphs).unwrap_or_default();
    let full_text = paragraphs.join("\n\n");
    debug!(
        %page_url,
        paragraphs = paragraphs.len(),
        chars = full_text.chars().count(),
        "Scored article body"
    );

    let top_image = document
        .select(&TOP_IMAGE)
        .find_map(|el| el.value().attr("content").or_else(|| el.value().attr("href")))
        .map(str::to_string);

    let mut images = best.map(image_sources).unwrap_or_default();
    images.extend(image_sources(document.root_element()));

    let mut keywords = document
        .select(&META_KEYWORDS)
        .filter_map(|el| el.value().attr("content"))
        .flat_map(|content| content.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if keywords.is_empty() {
        keywords = nlp::keywords(&full_text, MAX_KEYWORDS);
    }

    let summary = nlp::summarize(&full_text, title.as_deref());

    RawExtraction {
        authors: authors(&document),
        title,
        full_text,
        top_image,
        images,
        keywords,
        summary,
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|s| !s.is_empty())
}

fn element_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn class_and_id(el: ElementRef) -> String {
    format!(
        "{} {}",
        el.value().attr("class").unwrap_or_default(),
        el.value().id().unwrap_or_default()
    )
}

fn class_weight(el: ElementRef) -> f64 {
    let names = class_and_id(el);
    let mut weight = 0.0;
    if NEGATIVE.is_match(&names) {
        weight -= 25.0;
    }
    if POSITIVE.is_match(&names) {
        weight += 25.0;
    }
    weight
}

/// True when `el` sits inside markup that never holds article text.
fn in_boilerplate(el: ElementRef) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take_while(|a| !matches!(a.value().name(), "body" | "html"))
        .any(|a| BOILERPLATE_TAGS.contains(&a.value().name()) || HIDDEN.is_match(&class_and_id(a)))
}

fn link_density(el: ElementRef) -> f64 {
    let total = el.text().map(|t| t.chars().count()).sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    let linked = el
        .select(&LINK)
        .flat_map(|a| a.text())
        .map(|t| t.chars().count())
        .sum::<usize>();
    linked as f64 / total as f64
}

fn paragraph_score(text: &str) -> f64 {
    let commas = text.matches(',').count() as f64;
    let length_bonus = (text.chars().count() as f64 / 100.0).floor().min(3.0);
    1.0 + commas + length_bonus
}

/// Container scores keyed by node id, with the element kept alongside.
fn score_containers(document: &Html) -> Vec<(ElementRef<'_>, f64)> {
    let mut scores = HashMap::new();

    for p in document.select(&PARAGRAPH) {
        if in_boilerplate(p) {
            continue;
        }
        let text = element_text(p);
        if text.chars().count() < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let score = paragraph_score(&text);

        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        scores
            .entry(parent.id())
            .or_insert_with(|| (parent, class_weight(parent)))
            .1 += score;

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            scores
                .entry(grandparent.id())
                .or_insert_with(|| (grandparent, class_weight(grandparent)))
                .1 += score / 2.0;
        }
    }

    scores
        .into_values()
        .map(|(el, score)| (el, score * (1.0 - link_density(el))))
        .collect()
}

fn best_container(document: &Html) -> Option<ElementRef<'_>> {
    let scored = score_containers(document);
    let (best, best_score) = scored
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    // Widen to the parent when strong siblings share it, so articles split
    // across several blocks keep all of their paragraphs.
    let threshold = (best_score * 0.2).max(10.0);
    let parent = best.parent().and_then(ElementRef::wrap)?;
    let strong_siblings = scored
        .iter()
        .filter(|(el, score)| {
            el.id() != best.id()
                && *score >= threshold
                && el.parent().is_some_and(|p| p.id() == parent.id())
        })
        .count();
    if strong_siblings > 0 && !matches!(parent.value().name(), "body" | "html") {
        Some(parent)
    } else {
        Some(best)
    }
}

fn content_paragraphs(container: ElementRef) -> Vec<String> {
    container
        .select(&PARAGRAPH)
        .filter(|p| !in_boilerplate(*p))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn image_sources(el: ElementRef) -> Vec<String> {
    el.select(&IMAGE)
        .filter_map(|img| {
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
        })
        .map(str::to_string)
        .collect()
}

fn clean_author(raw: &str) -> Option<String> {
    let name = collapse_whitespace(&BYLINE_PREFIX.replace(raw, ""));
    let plausible = !name.is_empty()
        && name.chars().count() <= 80
        && !name.starts_with("http")
        && !name.contains('@');
    plausible.then_some(name)
}

fn split_names(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';', '|']).flat_map(|part| part.split(" and "))
}

fn authors(document: &Html) -> Vec<String> {
    let mut names = Vec::new();

    for el in document.select(&META_AUTHOR) {
        if let Some(content) = el.value().attr("content") {
            names.extend(split_names(content).filter_map(clean_author));
        }
    }

    for el in document.select(&MARKUP_AUTHOR) {
        let text = el
            .select(&ITEMPROP_NAME)
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(el));
        names.extend(split_names(&text).filter_map(clean_author));
    }

    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            collect_json_ld_authors(&value, &mut names);
        }
    }

    names
}

fn collect_json_ld_authors(value: &serde_json::Value, out: &mut Vec<String>) {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            if let Some(author) = map.get("author") {
                push_json_ld_author(author, out);
            }
            for (key, child) in map {
                if key != "author" {
                    collect_json_ld_authors(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_json_ld_authors(v, out)),
        _ => {}
    }
}

fn push_json_ld_author(author: &serde_json::Value, out: &mut Vec<String>) {
    use serde_json::Value;
    match author {
        Value::String(name) => out.extend(clean_author(name)),
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("name") {
                out.extend(clean_author(name));
            }
        }
        Value::Array(items) => items.iter().for_each(|a| push_json_ld_author(a, out)),
        _ => {}
    }
}
