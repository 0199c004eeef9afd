//! Markup detection and normalization between markup and plain text.
//!
//! Every engine boundary loses format in one direction: language models answer
//! in prose (often fenced or with a preamble) and the grammar checker only reads
//! plain text. All conversions live here so engines share one implementation,
//! and every function is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex pattern"));

/// Fenced block whose opening fence carries a language tag or sits on its own line.
static FENCE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```")
        .expect("Invalid fence regex pattern")
});

/// Inline fence, optionally tagged `html` without a newline.
static FENCE_INLINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```(?:html)?(.*?)```").expect("Invalid inline fence regex pattern")
});

static PREAMBLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:here(?:'s|’s|\s+is|\s+are)?|this\s+is|corrected)(?:\s+(?:the|your|my|a|corrected|improved|revised|rewritten|updated|fixed|final|grammar|version|text|sentence|paragraph|output|result|of|it)\b)*(?:[ \t]*[:–—]|[ \t]+-|[ \t]*\r?\n)\s*",
    )
    .expect("Invalid preamble regex pattern")
});

static WRAPPING_QUOTES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^["“”]+|["“”]+$"#).expect("Invalid wrapping quotes regex pattern")
});

static WHITESPACE_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex pattern"));

static LINE_BREAK_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*br\s*/?\s*>").expect("Invalid br regex pattern"));

static BLOCK_CLOSE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</\s*(?:p|div|li|blockquote|h[1-6])\s*>").expect("Invalid block regex pattern")
});

static BLANK_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n\s*").expect("Invalid blank line regex pattern"));

/// Format family of a fragment.
///
/// Determined once per request from the caller's content and binding for the
/// response, whichever engine produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Markup,
    PlainText,
}

impl ContentFormat {
    pub fn detect(content: &str) -> Self {
        if is_markup(content) {
            ContentFormat::Markup
        } else {
            ContentFormat::PlainText
        }
    }

    pub fn is_markup(self) -> bool {
        self == ContentFormat::Markup
    }

    /// Whether `output` belongs to this format family.
    pub fn conforms(self, output: &str) -> bool {
        is_markup(output) == self.is_markup()
    }

    /// Strip engine artifacts from raw output, keeping only this format.
    pub fn extract(self, raw: &str) -> String {
        match self {
            ContentFormat::Markup => extract_markup_only(raw),
            ContentFormat::PlainText => extract_plain_text_only(raw),
        }
    }

    /// Project content of this format to plain text.
    pub fn to_plain_text(self, content: &str) -> String {
        match self {
            ContentFormat::Markup => markup_to_plain_text(content),
            ContentFormat::PlainText => content.to_string(),
        }
    }

    /// Re-project plain text into this format.
    pub fn from_plain_text(self, text: &str) -> String {
        match self {
            ContentFormat::Markup => plain_text_to_markup(text),
            ContentFormat::PlainText => text.to_string(),
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentFormat::Markup => write!(f, "markup"),
            ContentFormat::PlainText => write!(f, "text"),
        }
    }
}

/// True iff `s` contains at least one `<...>` tag.
pub fn is_markup(s: &str) -> bool {
    TAG_REGEX.is_match(s)
}

/// Remove triple-backtick fences, keeping their inner content.
pub fn strip_code_fences(s: &str) -> String {
    let s = FENCE_BLOCK_REGEX.replace_all(s, "$1");
    let s = FENCE_INLINE_REGEX.replace_all(&s, "$1");
    // Unbalanced fences from truncated output
    s.replace("```", "").trim().to_string()
}

/// Keep only the markup portion of model output.
///
/// Returns an empty string when no tag survives, which callers treat as
/// "no usable markup".
pub fn extract_markup_only(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }

    let stripped = strip_code_fences(s);
    let (Some(first), Some(last)) = (stripped.find('<'), stripped.rfind('>')) else {
        return String::new();
    };
    if last < first {
        return String::new();
    }

    let markup = stripped[first..=last].trim();
    if !is_markup(markup) {
        return String::new();
    }
    markup.to_string()
}

/// Keep only the plain-text answer of model output.
///
/// Removes fences, a leading label such as "Here's the corrected text:",
/// wrapping quotes, and collapses whitespace runs.
pub fn extract_plain_text_only(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }

    // Labels and quotes can be stacked, so strip until nothing changes
    let mut current = strip_code_fences(s);
    loop {
        let next = strip_label_and_quotes(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_label_and_quotes(s: &str) -> String {
    let unlabeled = PREAMBLE_REGEX.replace(s, "");
    let unquoted = WRAPPING_QUOTES_REGEX.replace_all(unlabeled.trim(), "");
    WHITESPACE_RUN_REGEX
        .replace_all(&unquoted, " ")
        .trim()
        .to_string()
}

/// Project markup to plain text.
///
/// `<br>` becomes a newline, closing block tags a blank line, every other tag
/// is dropped and basic entities are decoded.
pub fn markup_to_plain_text(html: &str) -> String {
    let text = LINE_BREAK_TAG_REGEX.replace_all(html, "\n");
    let text = BLOCK_CLOSE_TAG_REGEX.replace_all(&text, "\n\n");
    let text = TAG_REGEX.replace_all(&text, "");
    let text = decode_entities(&text);
    BLANK_LINE_REGEX
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

/// Wrap plain text into paragraphs.
///
/// Blank lines separate paragraphs, single newlines become `<br/>`. Empty input
/// yields a single empty paragraph.
pub fn plain_text_to_markup(text: &str) -> String {
    let paragraphs: Vec<String> = split_paragraphs(text)
        .into_iter()
        .map(|paragraph| {
            let lines: Vec<String> = paragraph
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(escape_text)
                .collect();
            format!("<p>{}</p>", lines.join("<br/>"))
        })
        .collect();

    if paragraphs.is_empty() {
        return "<p></p>".to_string();
    }
    paragraphs.concat()
}

/// Split text on blank lines, dropping empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    BLANK_LINE_REGEX
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
