//! Text Normalizer: turns raw posting/profile text into model input.
//!
//! Two paths:
//! - lexical: noise stripping, tokenization, part-of-speech + stop word filtering, lemmas
//! - semantic: noise stripping and whitespace collapse only (encoders want near-raw text)
//!
//! A `Normalizer` is built once at startup and shared read-only (`Arc<Normalizer>`).

use std::collections::{BTreeSet, HashMap, HashSet};

use regex::Regex;

use crate::matching::lexicon::{
    DOMAIN_STOP_WORDS, ENGLISH_STOP_WORDS, INVARIANT_NOUNS, IRREGULAR_PLURALS, MODIFIER_WORDS,
    NUMBER_WORDS, VERB_LEMMAS,
};

/// Coarse part-of-speech classes; only `Noun` survives the lexical filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Modifier,
    Number,
}

/// Word lists the normalizer consults. `Lexicon::default()` is the job-ad tuned set.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub stop_words: HashSet<String>,
    pub domain_stop_words: HashSet<String>,
    pub verb_lemmas: HashSet<String>,
    pub modifiers: HashSet<String>,
    pub number_words: HashSet<String>,
    pub invariant_nouns: HashSet<String>,
    pub irregular_plurals: HashMap<String, String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let domain_stop_words = to_set(DOMAIN_STOP_WORDS);
        // Domain terms are stop words in their own right, not only as lemmas.
        let mut stop_words = to_set(ENGLISH_STOP_WORDS);
        stop_words.extend(domain_stop_words.iter().cloned());

        Self {
            stop_words,
            domain_stop_words,
            verb_lemmas: to_set(VERB_LEMMAS),
            modifiers: to_set(MODIFIER_WORDS),
            number_words: to_set(NUMBER_WORDS),
            invariant_nouns: to_set(INVARIANT_NOUNS),
            irregular_plurals: IRREGULAR_PLURALS
                .iter()
                .map(|(plural, singular)| (plural.to_string(), singular.to_string()))
                .collect(),
        }
    }
}

fn to_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Nouns ending in suffixes the modifier/verb rules would otherwise claim.
const SUFFIX_EXCEPTIONS: &[&str] = &[
    "assembly", "supply", "family", "anomaly", "reply", "monopoly", "executive", "objective",
    "initiative", "representative", "derivative", "detective", "archive", "incentive", "table",
    "cable", "variable", "deliverable", "speed", "feed", "seed", "embed", "bed",
];

pub struct Normalizer {
    lexicon: Lexicon,
    markup: Regex,
    email: Regex,
    url: Regex,
    token: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_lexicon(Lexicon::default())
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            markup: Regex::new(r"<[^>]+>").expect("valid markup regex"),
            email: Regex::new(r"\S+@\S+").expect("valid email regex"),
            url: Regex::new(r"(?:http|www)\S+").expect("valid url regex"),
            token: Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}+#]*").expect("valid token regex"),
        }
    }

    /// Lowercases and removes markup, email addresses and URLs.
    fn strip_noise(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let no_markup = self.markup.replace_all(&lowered, " ");
        let no_email = self.email.replace_all(&no_markup, "");
        self.url.replace_all(&no_email, "").into_owned()
    }

    /// Lexical path: ordered lemmas (duplicates kept) of the nouns that carry signal.
    pub fn normalize_for_lexical(&self, text: &str) -> Vec<String> {
        let cleaned = self.strip_noise(text);

        self.token
            .find_iter(&cleaned)
            .filter_map(|m| {
                let token = m.as_str();
                if self.is_stop_word(token) || self.tag(token) != PartOfSpeech::Noun {
                    return None;
                }
                let lemma = self.lemmatize_noun(token);
                let keep = lemma.chars().count() > 2
                    && !self.lexicon.domain_stop_words.contains(&lemma)
                    && !self.lexicon.stop_words.contains(&lemma);
                keep.then_some(lemma)
            })
            .collect()
    }

    /// De-duplicated lexical terms of a text.
    pub fn vocabulary(&self, text: &str) -> BTreeSet<String> {
        self.normalize_for_lexical(text).into_iter().collect()
    }

    /// Semantic path: noise stripped and whitespace collapsed, nothing else.
    pub fn normalize_for_semantic(&self, text: &str) -> String {
        self.strip_noise(text)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_stop_word(&self, token: &str) -> bool {
        self.lexicon.stop_words.contains(token)
    }

    /// Rule-based tagger: lexicon lookups first, then suffix rules, defaulting to noun.
    pub fn tag(&self, token: &str) -> PartOfSpeech {
        if token.chars().all(|c| c.is_ascii_digit()) || self.lexicon.number_words.contains(token)
        {
            return PartOfSpeech::Number;
        }
        if self.lexicon.invariant_nouns.contains(token) || SUFFIX_EXCEPTIONS.contains(&token) {
            return PartOfSpeech::Noun;
        }
        if self.is_verb_form(token) {
            return PartOfSpeech::Verb;
        }
        if self.lexicon.modifiers.contains(token) || has_modifier_suffix(token) {
            return PartOfSpeech::Modifier;
        }
        PartOfSpeech::Noun
    }

    fn is_verb_form(&self, token: &str) -> bool {
        let verbs = &self.lexicon.verb_lemmas;
        if verbs.contains(token) {
            return true;
        }
        // Past participles are never nouns in postings ("needed", "required").
        if token.len() > 4 && token.ends_with("ed") {
            return true;
        }
        if let Some(stem) = token.strip_suffix("ing") {
            return verb_stem_candidates(stem).iter().any(|c| verbs.contains(c));
        }
        if let Some(stem) = token.strip_suffix('s') {
            return verbs.contains(stem)
                || stem
                    .strip_suffix('e')
                    .is_some_and(|s| verbs.contains(s));
        }
        false
    }

    /// Reduces a plural noun to its singular form.
    pub fn lemmatize_noun(&self, token: &str) -> String {
        if self.lexicon.invariant_nouns.contains(token) {
            return token.to_string();
        }
        if let Some(singular) = self.lexicon.irregular_plurals.get(token) {
            return singular.clone();
        }
        // "-is" singulars ("analysis", "axis", "tennis"), not acronym plurals ("apis", "kpis")
        if token.chars().count() <= 3
            || token.ends_with("ss")
            || token.ends_with("us")
            || ["sis", "xis", "tis", "nis"].iter().any(|s| token.ends_with(s))
        {
            return token.to_string();
        }
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{stem}y");
        }
        for suffix in ["sses", "shes", "ches", "xes", "zes"] {
            if token.ends_with(suffix) {
                return token[..token.len() - 2].to_string();
            }
        }
        token.strip_suffix('s').unwrap_or(token).to_string()
    }
}

/// Possible base forms of an `-ing` stem: "work", "writ" → "write", "runn" → "run".
fn verb_stem_candidates(stem: &str) -> Vec<String> {
    let mut candidates = vec![stem.to_string(), format!("{stem}e")];
    let mut tail = stem.char_indices().rev();
    if let (Some((last_at, last)), Some((_, prev))) = (tail.next(), tail.next()) {
        if last == prev {
            candidates.push(stem[..last_at].to_string());
        }
    }
    candidates
}

fn has_modifier_suffix(token: &str) -> bool {
    if token.len() <= 4 {
        return false;
    }
    ["ly", "ous", "ful", "ive", "able", "ible", "ical", "less"]
        .iter()
        .any(|suffix| token.ends_with(suffix))
}
