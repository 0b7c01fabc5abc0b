//! Text analysis pipeline for the nearby index.
//!
//! Documents and query terms go through the same pipeline:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - removes tokens longer than 40 bytes
//! 4. `Stemmer` - applies language-specific stemming, unless disabled
//!
//! Every token advances the position by one, so span positions count
//! surviving words.

use tantivy::{
    Index,
    tokenizer::{
        Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
        TokenStream,
    },
};

use crate::IndexError;

/// Name of the custom tokenizer registered with Tantivy.
pub const NEARBY_TOKENIZER: &str = "nearby_text";

/// Stemmer setting that turns stemming off.
pub const NO_STEMMER: &str = "none";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Parses a stemmer language string into a Tantivy `Language`.
///
/// Returns `None` for [`NO_STEMMER`] and an error for unknown names.
pub fn parse_language(name: &str) -> Result<Option<Language>, IndexError> {
    let language = match name.to_lowercase().as_str() {
        NO_STEMMER => return Ok(None),
        "arabic" => Language::Arabic,
        "danish" => Language::Danish,
        "dutch" => Language::Dutch,
        "english" => Language::English,
        "finnish" => Language::Finnish,
        "french" => Language::French,
        "german" => Language::German,
        "greek" => Language::Greek,
        "hungarian" => Language::Hungarian,
        "italian" => Language::Italian,
        "norwegian" => Language::Norwegian,
        "portuguese" => Language::Portuguese,
        "romanian" => Language::Romanian,
        "russian" => Language::Russian,
        "spanish" => Language::Spanish,
        "swedish" => Language::Swedish,
        "tamil" => Language::Tamil,
        "turkish" => Language::Turkish,
        other => return Err(IndexError::InvalidLanguage(other.to_string())),
    };
    Ok(Some(language))
}

/// Builds the text analyzer, stemming when a language is given.
pub fn build_analyzer(language: Option<Language>) -> TextAnalyzer {
    let builder = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH));
    match language {
        Some(language) => builder.filter(Stemmer::new(language)).build(),
        None => builder.build(),
    }
}

/// Builds the text analyzer from a stemmer setting.
pub fn build_analyzer_from_name(language_name: &str) -> Result<TextAnalyzer, IndexError> {
    Ok(build_analyzer(parse_language(language_name)?))
}

/// Registers the analyzer for `language_name` on `index`.
pub fn register_analyzer(index: &Index, language_name: &str) -> Result<(), IndexError> {
    index
        .tokenizers()
        .register(NEARBY_TOKENIZER, build_analyzer_from_name(language_name)?);
    Ok(())
}

/// Runs `text` through `analyzer` and returns the indexed terms in order.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut terms = Vec::new();
    while let Some(token) = stream.next() {
        terms.push(token.text.clone());
    }
    terms
}
