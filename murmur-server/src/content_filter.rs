//! Word-list content filter.
//!
//! Post and comment text is masked in place: every blocked word is replaced
//! by as many `*` as it has characters, so the text keeps its shape. Usernames
//! get a stricter yes/no check that also looks through accents, leetspeak
//! and separator tricks.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::config;

/// Built-in blocklist; extended and pruned through configuration
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "bitch", "bitches", "bollock", "boner", "cock", "cocks", "cum", "cunt", "cunts", "dick",
    "dickhead", "dicks", "dildo", "fag", "faggot", "jizz", "nazi", "penis", "porn", "porno",
    "pussy", "rape", "rapist", "retard", "slut", "sluts", "twat", "vagina", "whore", "whores",
];

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile separator regex"));

/// Filter applied to user-supplied text before it is stored
pub trait ContentFilter: Send + Sync {
    /// Mask blocked words, preserving character count
    fn censor(&self, text: &str) -> String;

    /// Strict check used to reject usernames
    fn is_profane(&self, text: &str) -> bool;
}

/// Filter used when content filtering is switched off
pub struct Passthrough;

impl ContentFilter for Passthrough {
    fn censor(&self, text: &str) -> String {
        text.to_string()
    }

    fn is_profane(&self, _text: &str) -> bool {
        false
    }
}

pub struct WordListFilter {
    words: BTreeSet<String>,
    pattern: Option<Regex>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let pattern = if words.is_empty() {
            None
        } else {
            // Longest first so "dickhead" wins over "dick"
            let mut alternatives: Vec<&String> = words.iter().collect();
            alternatives.sort_by_key(|w| std::cmp::Reverse(w.len()));
            let alternation = alternatives
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                .context("Failed to compile content filter pattern")?;
            Some(pattern)
        };

        Ok(Self { words, pattern })
    }

    /// Default list plus `extra_words`, minus `allowed_words`
    pub fn from_settings(settings: &config::ContentFilter) -> Result<Self> {
        let allowed: BTreeSet<String> = settings
            .allowed_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .collect();

        let words = DEFAULT_BLOCKLIST
            .iter()
            .map(|w| w.to_string())
            .chain(settings.extra_words.iter().cloned())
            .filter(|w| !allowed.contains(&w.trim().to_lowercase()));

        Self::new(words)
    }

    fn has_blocked_token(&self, text: &str) -> bool {
        SEPARATORS
            .split(text)
            .any(|token| !token.is_empty() && self.words.contains(token))
    }
}

impl ContentFilter for WordListFilter {
    fn censor(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    "*".repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }

    fn is_profane(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if self.has_blocked_token(&text.to_lowercase()) {
            return true;
        }
        self.has_blocked_token(&normalize_for_check(text))
    }
}

/// Combining diacritical marks left behind by NFKD decomposition
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Strip accents, lowercase, undo common leetspeak, and collapse separator
/// runs to a space
pub fn normalize_for_check(text: &str) -> String {
    let stripped: String = text
        .nfkd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect();

    let mapped: String = stripped
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '@' | '4' => 'a',
            '3' => 'e',
            '1' | '!' | '|' => 'i',
            '0' => 'o',
            '$' | '5' => 's',
            '7' | '+' => 't',
            '8' => 'b',
            '9' | '6' => 'g',
            other => other,
        })
        .collect();

    SEPARATORS.replace_all(&mapped, " ").trim().to_string()
}

/// Build the filter the server should use
pub fn from_settings(settings: &config::ContentFilter) -> Result<Arc<dyn ContentFilter>> {
    if !settings.enabled {
        tracing::warn!("Content filter disabled");
        return Ok(Arc::new(Passthrough));
    }

    let filter = WordListFilter::from_settings(settings)?;
    tracing::debug!(words = filter.words.len(), "Content filter loaded");
    Ok(Arc::new(filter))
}
