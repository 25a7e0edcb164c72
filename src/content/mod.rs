//! Where reference texts come from.
//!
//! Sources are collaborators of the session engine: a session only ever sees
//! the [`ReferenceText`] they produce. Fetches may fail; callers recover with
//! [`fetch_or_fallback`] and never retry.

use cgisf_lib::cgisf;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ContentError;
use crate::text::ReferenceText;

static DATA_DIR: Dir = include_dir!("src/content/data");

/// Used whenever a source cannot deliver.
pub const FALLBACK_TEXT: &str = "The quick brown fox jumps over the lazy dog. This sentence contains all letters of the alphabet. Typing regularly improves your speed and accuracy. Practice makes perfect in the world of typing tests.";

/// Word count for a timed session: short tests get a shorter passage.
pub fn words_for_duration(secs: u64) -> usize {
    if secs > 30 {
        50
    } else {
        25
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentRequest {
    Words { count: usize },
    Sentences { count: usize },
    Snippet { language: Option<String> },
    Custom(String),
}

pub trait ContentSource {
    fn fetch(&self, request: &ContentRequest) -> Result<ReferenceText, ContentError>;
}

/// Fetch from `source`, substituting [`FALLBACK_TEXT`] on failure.
pub fn fetch_or_fallback(source: &dyn ContentSource, request: &ContentRequest) -> ReferenceText {
    match source.fetch(request) {
        Ok(text) => {
            debug!(?request, chars = text.len(), "content fetched");
            text
        }
        Err(err) => {
            warn!(%err, ?request, "content unavailable, using fallback text");
            ReferenceText::from_static(FALLBACK_TEXT)
        }
    }
}

fn read_catalog<T: DeserializeOwned>(name: &str) -> Result<T, ContentError> {
    let file = DATA_DIR
        .get_file(name)
        .ok_or_else(|| ContentError::MissingCatalog(name.to_string()))?;
    Ok(serde_json::from_slice(file.contents())?)
}

#[derive(Deserialize)]
struct WordList {
    words: Vec<String>,
}

/// Random words and generated sentences.
#[derive(Clone, Debug)]
pub struct WordSource {
    words: Vec<String>,
}

impl WordSource {
    /// The bundled english word list.
    pub fn english() -> Result<Self, ContentError> {
        let list: WordList = read_catalog("english.json")?;
        Ok(Self::from_words(list.words))
    }

    pub fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    fn random_words(&self, count: usize) -> Result<ReferenceText, ContentError> {
        let mut rng = rand::thread_rng();
        let picked: Vec<&str> = self
            .words
            .choose_multiple(&mut rng, count)
            .map(String::as_str)
            .collect();
        ReferenceText::new(picked.join(" "))
    }

    fn random_sentences(&self, count: usize) -> Result<ReferenceText, ContentError> {
        let rng = &mut rand::thread_rng();
        let mut sentences = Vec::with_capacity(count);
        for _ in 0..count {
            let sentence = cgisf(
                rng.gen_range(1..3),
                rng.gen_range(1..3),
                rng.gen_range(1..5),
                rng.gen_bool(0.5),
                rng.gen_range(1..3),
                rng.gen_bool(0.5),
            );
            sentences.push(sentence.trim().to_string());
        }
        ReferenceText::new(sentences.join(" "))
    }
}

impl ContentSource for WordSource {
    fn fetch(&self, request: &ContentRequest) -> Result<ReferenceText, ContentError> {
        match request {
            ContentRequest::Words { count } => self.random_words(*count),
            ContentRequest::Sentences { count } => self.random_sentences(*count),
            _ => Err(ContentError::UnsupportedRequest("word source")),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    pub language: String,
    pub code: String,
}

#[derive(Deserialize)]
struct SnippetCatalog {
    snippets: Vec<Snippet>,
}

/// Programming-language snippets. Characters are compared literally, so
/// the only processing is line-ending and trailing-space cleanup.
#[derive(Clone, Debug)]
pub struct SnippetSource {
    snippets: Vec<Snippet>,
}

impl SnippetSource {
    pub fn bundled() -> Result<Self, ContentError> {
        let catalog: SnippetCatalog = read_catalog("snippets.json")?;
        Ok(Self::from_snippets(catalog.snippets))
    }

    pub fn from_snippets(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.snippets.iter().map(|s| s.language.as_str()).collect();
        langs.sort_unstable();
        langs.dedup();
        langs
    }

    fn pick(&self, language: Option<&str>) -> Result<ReferenceText, ContentError> {
        let candidates: Vec<&Snippet> = self
            .snippets
            .iter()
            .filter(|s| language.map_or(true, |l| s.language.eq_ignore_ascii_case(l)))
            .collect();

        let snippet = candidates.choose(&mut rand::thread_rng()).ok_or_else(|| {
            ContentError::UnknownSnippetLanguage(language.unwrap_or("any").to_string())
        })?;
        ReferenceText::new(normalize_code(&snippet.code))
    }
}

impl ContentSource for SnippetSource {
    fn fetch(&self, request: &ContentRequest) -> Result<ReferenceText, ContentError> {
        match request {
            ContentRequest::Snippet { language } => self.pick(language.as_deref()),
            _ => Err(ContentError::UnsupportedRequest("snippet source")),
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Everything bundled with the binary, dispatching on the request kind.
#[derive(Clone, Debug)]
pub struct Library {
    words: WordSource,
    snippets: SnippetSource,
}

impl Library {
    pub fn bundled() -> Result<Self, ContentError> {
        Ok(Self {
            words: WordSource::english()?,
            snippets: SnippetSource::bundled()?,
        })
    }

    pub fn new(words: WordSource, snippets: SnippetSource) -> Self {
        Self { words, snippets }
    }
}

impl ContentSource for Library {
    fn fetch(&self, request: &ContentRequest) -> Result<ReferenceText, ContentError> {
        match request {
            ContentRequest::Words { .. } | ContentRequest::Sentences { .. } => {
                self.words.fetch(request)
            }
            ContentRequest::Snippet { .. } => self.snippets.fetch(request),
            ContentRequest::Custom(text) => ReferenceText::new(text),
        }
    }
}
