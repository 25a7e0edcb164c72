use thiserror::Error;

/// Failures while obtaining a reference text from a content source.
///
/// None of these are fatal: callers recover through
/// [`crate::content::fetch_or_fallback`].
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("reference text is empty")]
    Empty,

    #[error("no snippets available for language `{0}`")]
    UnknownSnippetLanguage(String),

    #[error("embedded catalog `{0}` not found")]
    MissingCatalog(String),

    #[error("malformed catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("{0} cannot serve this kind of request")]
    UnsupportedRequest(&'static str),
}
