//! Text to sign-language gloss mapping.
//!
//! A pure, deterministic translation from a transcript to an ordered gloss
//! sequence: longest-match-first lexicon lookup (multi-word phrases beat
//! single words), sign-language grammar reordering (time topic comment),
//! and a fingerspelling fallback for out-of-vocabulary words so the
//! sequence is never silently shortened by unknown vocabulary.

use crate::recognize::Transcript;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Grammatical marker attached to a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Negation,
    Past,
    Future,
    Question,
}

/// One atomic unit of the signed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlossToken {
    /// A lexicon sign, e.g. `TURN-ON`.
    Sign {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<Marker>,
    },
    /// Out-of-vocabulary word spelled letter by letter.
    Fingerspell { letters: String },
}

impl GlossToken {
    pub fn sign(id: impl Into<String>) -> Self {
        GlossToken::Sign {
            id: id.into(),
            marker: None,
        }
    }

    /// Written form used in logs and catalog lookups.
    pub fn label(&self) -> &str {
        match self {
            GlossToken::Sign { id, .. } => id,
            GlossToken::Fingerspell { letters } => letters,
        }
    }

    pub fn is_fingerspell(&self) -> bool {
        matches!(self, GlossToken::Fingerspell { .. })
    }
}

/// Ordered gloss tokens; order is the temporal order of signing.
pub type GlossSequence = Vec<GlossToken>;

/// Word class steering the grammar reordering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordClass {
    #[default]
    Plain,
    /// Temporal references sign first (time-topic-comment order).
    Time,
    /// Question signs move to the end of the sentence.
    Question,
    /// Negation signs follow what they negate.
    Negation,
    /// Function words with no sign; dropped by grammar rule.
    Stopword,
}

/// One lexicon mapping: spoken phrase to sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Spoken word or multi-word phrase, lowercase.
    pub phrase: String,
    /// Gloss identifier, conventionally uppercase.
    pub gloss: String,
    #[serde(default)]
    pub class: WordClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl LexiconEntry {
    fn new(phrase: &str, gloss: &str, class: WordClass, marker: Option<Marker>) -> Self {
        Self {
            phrase: phrase.to_string(),
            gloss: gloss.to_string(),
            class,
            marker,
        }
    }
}

/// Immutable phrase-to-sign lookup table.
///
/// Loaded once at startup and shared read-only across concurrent pipeline
/// invocations; reloading means building a new lexicon and swapping the
/// `Arc`, never mutating in place.
#[derive(Debug)]
pub struct Lexicon {
    entries: HashMap<String, LexiconEntry>,
    max_phrase_words: usize,
}

impl Lexicon {
    /// Build a lexicon from entries. Later duplicates of a phrase win.
    pub fn from_entries(entries: impl IntoIterator<Item = LexiconEntry>) -> Self {
        let mut map = HashMap::new();
        let mut max_phrase_words = 1;
        for entry in entries {
            max_phrase_words = max_phrase_words.max(entry.phrase.split_whitespace().count());
            map.insert(entry.phrase.clone(), entry);
        }
        Self {
            entries: map,
            max_phrase_words,
        }
    }

    /// Load a lexicon from a JSON file (array of entries).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {}", path.display()))?;
        let entries: Vec<LexiconEntry> =
            serde_json::from_str(&content).context("Failed to parse lexicon file as JSON")?;
        Ok(Self::from_entries(entries))
    }

    /// The built-in starter lexicon used when no file is configured.
    pub fn builtin() -> Self {
        use WordClass::{Negation, Plain, Question, Stopword, Time};
        let e = LexiconEntry::new;
        Self::from_entries([
            // Multi-word phrases; these must win over their parts.
            e("turn on", "TURN-ON", Plain, None),
            e("turn off", "TURN-OFF", Plain, None),
            e("good morning", "GOOD-MORNING", Plain, None),
            e("good night", "GOOD-NIGHT", Plain, None),
            e("how are you", "HOW-YOU", Question, None),
            // Time references.
            e("today", "TODAY", Time, None),
            e("tomorrow", "TOMORROW", Time, Some(Marker::Future)),
            e("yesterday", "YESTERDAY", Time, Some(Marker::Past)),
            e("now", "NOW", Time, None),
            // Question words.
            e("what", "WHAT", Question, Some(Marker::Question)),
            e("where", "WHERE", Question, Some(Marker::Question)),
            e("when", "WHEN", Question, Some(Marker::Question)),
            e("who", "WHO", Question, Some(Marker::Question)),
            e("why", "WHY", Question, Some(Marker::Question)),
            e("how", "HOW", Question, Some(Marker::Question)),
            // Negation.
            e("not", "NOT", Negation, Some(Marker::Negation)),
            e("no", "NO", Negation, Some(Marker::Negation)),
            e("never", "NEVER", Negation, Some(Marker::Negation)),
            // Function words with no sign of their own.
            e("the", "", Stopword, None),
            e("a", "", Stopword, None),
            e("an", "", Stopword, None),
            e("is", "", Stopword, None),
            e("are", "", Stopword, None),
            e("am", "", Stopword, None),
            e("to", "", Stopword, None),
            e("of", "", Stopword, None),
            e("please", "PLEASE", Plain, None),
            // Everyday vocabulary.
            e("i", "ME", Plain, None),
            e("me", "ME", Plain, None),
            e("my", "MY", Plain, None),
            e("you", "YOU", Plain, None),
            e("your", "YOUR", Plain, None),
            e("hello", "HELLO", Plain, None),
            e("name", "NAME", Plain, None),
            e("light", "LIGHT", Plain, None),
            e("fan", "FAN", Plain, None),
            e("door", "DOOR", Plain, None),
            e("water", "WATER", Plain, None),
            e("food", "FOOD", Plain, None),
            e("eat", "EAT", Plain, None),
            e("drink", "DRINK", Plain, None),
            e("go", "GO", Plain, None),
            e("come", "COME", Plain, None),
            e("home", "HOME", Plain, None),
            e("school", "SCHOOL", Plain, None),
            e("want", "WANT", Plain, None),
            e("need", "NEED", Plain, None),
            e("help", "HELP", Plain, None),
            e("good", "GOOD", Plain, None),
            e("bad", "BAD", Plain, None),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, phrase: &str) -> Option<&LexiconEntry> {
        self.entries.get(phrase)
    }
}

/// Gratitude phrases the pipeline short-circuits on, mirroring the
/// original product behavior (a "thank you" gets no video plan).
const GRATITUDE_PHRASES: &[&str] = &[
    "thank you",
    "thanks",
    "thank you so much",
    "thank you very much",
    "thanks a lot",
];

/// True when the utterance is just an expression of gratitude.
pub fn is_gratitude(text: &str) -> bool {
    let normalized = tokenize(text).join(" ");
    GRATITUDE_PHRASES.contains(&normalized.as_str())
        || normalized.starts_with("thank you ")
        || normalized.starts_with("thanks ")
}

/// Maps transcripts to gloss sequences against a shared lexicon.
#[derive(Clone)]
pub struct GlossMapper {
    lexicon: Arc<Lexicon>,
}

impl GlossMapper {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Translate a transcript into an ordered gloss sequence.
    ///
    /// Deterministic and total: identical input always yields identical
    /// output, and the worst case is an all-fingerspelled sequence.
    pub fn map(&self, transcript: &Transcript) -> GlossSequence {
        let tokens = tokenize(&transcript.text);
        let mut classified: Vec<(GlossToken, WordClass)> = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let (entry, consumed) = self.longest_match(&tokens, i);
            match entry {
                Some(entry) => {
                    if entry.class != WordClass::Stopword {
                        classified.push((
                            GlossToken::Sign {
                                id: entry.gloss.clone(),
                                marker: entry.marker,
                            },
                            entry.class,
                        ));
                    }
                    i += consumed;
                }
                None => {
                    classified.push((
                        GlossToken::Fingerspell {
                            letters: tokens[i].to_uppercase(),
                        },
                        WordClass::Plain,
                    ));
                    i += 1;
                }
            }
        }

        let sequence = reorder(classified);
        debug!(
            words = tokens.len(),
            glosses = sequence.len(),
            "Mapped transcript to gloss sequence"
        );
        sequence
    }

    /// Find the longest phrase starting at `start`, down to a single word.
    /// Returns the entry (if any) and how many words it consumed.
    fn longest_match<'a>(
        &'a self,
        tokens: &[String],
        start: usize,
    ) -> (Option<&'a LexiconEntry>, usize) {
        let max_len = self.lexicon.max_phrase_words.min(tokens.len() - start);
        for len in (1..=max_len).rev() {
            let phrase = tokens[start..start + len].join(" ");
            if let Some(entry) = self.lexicon.lookup(&phrase) {
                return (Some(entry), len);
            }
        }
        (None, 1)
    }
}

/// Lowercase and strip everything but letters, digits and in-word
/// apostrophes.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Apply time-topic-comment ordering: time signs first, question signs
/// last, negation just before the questions. Stable within each group.
fn reorder(classified: Vec<(GlossToken, WordClass)>) -> GlossSequence {
    let mut time = Vec::new();
    let mut body = Vec::new();
    let mut negation = Vec::new();
    let mut question = Vec::new();

    for (token, class) in classified {
        match class {
            WordClass::Time => time.push(token),
            WordClass::Question => question.push(token),
            WordClass::Negation => negation.push(token),
            WordClass::Plain => body.push(token),
            WordClass::Stopword => {}
        }
    }

    time.into_iter()
        .chain(body)
        .chain(negation)
        .chain(question)
        .collect()
}

#[cfg(test)]
#[path = "gloss_test.rs"]
mod tests;
