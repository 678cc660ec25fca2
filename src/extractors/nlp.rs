//! Keyword and extractive-summary heuristics.
//!
//! Term frequency over non-stopwords drives both keyword selection and
//! sentence scoring. Summaries keep the best sentences in document order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'\-]*[A-Za-z]").expect("valid word regex"));

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "last", "like", "many", "may", "me", "more", "most", "much", "must", "my",
    "myself", "new", "no", "nor", "not", "now", "of", "off", "on", "once", "one", "only", "or",
    "other", "our", "ours", "ourselves", "out", "over", "own", "said", "same", "says", "she",
    "should", "since", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "two", "under", "until", "up", "us", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "year", "years", "you",
    "your", "yours", "yourself", "yourselves",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

const SUMMARY_SENTENCES: usize = 5;

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(text).map(|m| m.as_str().to_lowercase())
}

fn is_content_word(word: &str) -> bool {
    word.len() > 2 && !STOPWORD_SET.contains(word)
}

/// Frequency of each content word, with the position of its first use.
fn term_frequencies(text: &str) -> HashMap<String, (usize, usize)> {
    let mut freq: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, word) in words(text).filter(|w| is_content_word(w)).enumerate() {
        freq.entry(word).or_insert((0, pos)).0 += 1;
    }
    freq
}

/// Most frequent content words, ties broken by first appearance.
pub fn keywords(text: &str, limit: usize) -> Vec<String> {
    let mut ranked = term_frequencies(text).into_iter().collect::<Vec<_>>();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// Split text into sentences on terminal punctuation followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&q) = chars.peek() {
                if matches!(q, '"' | '\'' | '\u{201d}' | '\u{2019}' | ')') {
                    current.push(q);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().is_none_or(|n| n.is_whitespace()) {
                push_sentence(&mut sentences, &mut current);
            }
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Extractive summary: the highest scoring sentences in document order.
///
/// Sentences score on keyword density, closeness to the start of the text
/// and overlap with the title.
pub fn summarize(text: &str, title: Option<&str>) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= SUMMARY_SENTENCES {
        return sentences.join(" ");
    }

    let top_words: HashMap<String, usize> = {
        let freq = term_frequencies(text);
        let mut ranked = freq.into_iter().collect::<Vec<_>>();
        ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
        ranked.into_iter().take(10).map(|(w, (c, _))| (w, c)).collect()
    };
    let title_words: HashSet<String> = title
        .map(|t| words(t).filter(|w| is_content_word(w)).collect())
        .unwrap_or_default();

    let density = sentences
        .iter()
        .map(|s| {
            let ws = words(s).collect::<Vec<_>>();
            if ws.len() < 5 {
                return 0.0;
            }
            let hits: usize = ws.iter().filter_map(|w| top_words.get(w)).sum();
            hits as f64 / ws.len() as f64
        })
        .collect::<Vec<_>>();
    let max_density = density.iter().cloned().fold(0.0_f64, f64::max).max(f64::EPSILON);

    let mut scored = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let position = 1.0 / (1.0 + i as f64 * 0.2);
            let title_overlap = if title_words.is_empty() {
                0.0
            } else {
                let hits = words(s).filter(|w| title_words.contains(w)).count();
                (hits as f64 / title_words.len() as f64).min(1.0)
            };
            let score = 0.6 * density[i] / max_density + 0.25 * position + 0.15 * title_overlap;
            (i, score)
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut chosen = scored
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    chosen.sort_unstable();
    chosen
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
