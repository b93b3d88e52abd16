use chardetng::EncodingDetector;
use docwatch_core::Token;
use encoding_rs::Encoding;
use scraper::{Html, Selector};

use crate::{FailureKind, FetchError};

const CELL_SELECTOR: &str = "table tr td";

/// Decodes a page body to UTF-8.
///
/// Order: byte order mark, then the `Content-Type` charset, then statistical
/// detection over the whole body (which also honours `<meta charset>`).
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<String, FetchError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors && actual == encoding_rs::UTF_8 {
        return Err(FetchError::new(
            FailureKind::Decode {
                encoding: actual.name().to_string(),
            },
            "malformed byte sequence",
        ));
    }
    Ok(text.into_owned())
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
    })
}

/// Finds tokens in the cells of a page's tables.
///
/// The selector is parsed once; a bad selector fails construction instead of
/// making every page look empty.
#[derive(Debug, Clone)]
pub struct CellScanner {
    selector: Selector,
}

impl CellScanner {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_selector(CELL_SELECTOR)
    }

    pub(crate) fn with_selector(css: &str) -> Result<Self, FetchError> {
        let selector = Selector::parse(css)
            .map_err(|err| FetchError::new(FailureKind::Scan, format!("{css}: {err}")))?;
        Ok(Self { selector })
    }

    /// True when some cell's whole text equals `token` (trimmed, ignoring case).
    pub fn contains(&self, html: &str, token: &Token) -> bool {
        let doc = Html::parse_document(html);
        doc.select(&self.selector)
            .any(|cell| token.matches(&cell.text().collect::<String>()))
    }
}
