//! Text collaborators shared by the converters: HTML byte-range rendering,
//! sentence and word splitting, and evidence file loading.

use std::{fs, path::Path};

use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::ConversionError;

/// Renders the `[start_byte, end_byte)` slice of a raw HTML document as plain
/// text by stripping markup and concatenating every text node.
///
/// Offsets are byte positions into the UTF-8 encoding of `html`. An end past
/// the document is clamped, and an inverted range renders as empty text.
pub fn render_html_range(
    html: &str,
    start_byte: i64,
    end_byte: i64,
) -> Result<String, ConversionError> {
    let bytes = html.as_bytes();
    let out_of_bounds = || ConversionError::ByteRangeOutOfBounds {
        start: start_byte,
        end: end_byte,
        len: bytes.len(),
    };
    let start = usize::try_from(start_byte).map_err(|_| out_of_bounds())?;
    let end = usize::try_from(end_byte).map_err(|_| out_of_bounds())?;

    let end = end.min(bytes.len());
    let start = start.min(end);
    let fragment = String::from_utf8(bytes.get(start..end).unwrap_or_default().to_vec())?;

    Ok(html_to_text(&fragment))
}

pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    document.root_element().text().collect()
}

/// Splits text on UAX #29 sentence boundaries, dropping whitespace-only pieces.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_sentence_bounds()
        .filter(|sentence| !sentence.trim().is_empty())
        .collect()
}

/// Splits a sentence into word tokens. Punctuation is kept as separate tokens
/// and whitespace is discarded.
pub fn split_words(sentence: &str) -> Vec<&str> {
    sentence
        .split_word_bounds()
        .filter(|word| !word.trim().is_empty())
        .collect()
}

pub fn read_file_contents(path: &Path) -> Result<String, ConversionError> {
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_paragraph_text_without_markup() {
        let html = "<html><body><P>The <b>quick</b> fox &amp; friends</P></body></html>";
        let start = html.find("<P>").unwrap() as i64;
        let end = (html.find("</P>").unwrap() + "</P>".len()) as i64;

        let text = render_html_range(html, start, end).unwrap();

        assert_eq!(text, "The quick fox & friends");
    }

    #[test]
    fn byte_offsets_address_multibyte_documents() {
        let html = "<P>café</P><P>naïve answer</P>";
        let start = html.rfind("<P>").unwrap() as i64;
        let end = html.len() as i64;

        let text = render_html_range(html, start, end).unwrap();

        assert_eq!(text, "naïve answer");
    }

    #[test]
    fn end_past_document_is_clamped() {
        let html = "<P>short</P>";
        let text = render_html_range(html, 0, 500).unwrap();

        assert_eq!(text, "short");
    }

    #[test]
    fn negative_offsets_are_rejected() {
        let result = render_html_range("<P>x</P>", -1, 4);

        assert!(matches!(
            result,
            Err(ConversionError::ByteRangeOutOfBounds { start: -1, .. })
        ));
    }

    #[test]
    fn splitting_inside_a_multibyte_character_fails() {
        let html = "<P>é</P>";
        // byte 4 is the middle of the two-byte 'é'
        let result = render_html_range(html, 0, 4);

        assert!(matches!(result, Err(ConversionError::Utf8(_))));
    }

    #[test]
    fn sentences_and_words_split_on_unicode_boundaries() {
        let sentences = split_sentences("Paris is big. It rains, often!");
        assert_eq!(sentences.len(), 2);

        let words = split_words(sentences[1]);
        assert_eq!(words, vec!["It", "rains", ",", "often", "!"]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }
}
