use super::TextProcessor;
use once_cell::sync::Lazy;
use regex::Regex;

static INTERROGATIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^["'“‘(\[]*(?:can|could|would|will|do|does|did|is|are|am|was|were|have|has|may|might|should|shall)\b"#,
    )
    .expect("Invalid interrogative regex pattern")
});

static SPACE_BEFORE_PUNCTUATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+([,.;!?])").expect("Invalid punctuation spacing regex pattern")
});

/// Sentence segmentation, terminal punctuation and casing.
///
/// Splits on `.`, `?` and `!` (a run of terminators stays together), then for
/// each sentence:
/// - Removes spaces before punctuation
/// - Appends `?` to unterminated sentences opening with an auxiliary verb, `.` otherwise
/// - Capitalizes the first letter and the pronoun "I"
///
/// Sentences are rejoined with single spaces.
pub struct SentenceProcessor;

impl SentenceProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SentenceProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor for SentenceProcessor {
    fn process(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        split_sentences(text)
            .into_iter()
            .map(finish_sentence)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '?' | '!')
}

fn is_closer(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '”' | '’' | ')' | ']')
}

fn is_opener(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '“' | '‘' | '(' | '[')
}

/// Split after terminator runs (plus closing quotes) that are followed by
/// whitespace or the end of the text. "3.14" and "example.com" stay whole.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if !is_terminator(ch) {
            continue;
        }

        while let Some(&(_, next)) = chars.peek() {
            if is_terminator(next) || is_closer(next) {
                chars.next();
            } else {
                break;
            }
        }

        let end = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
        let at_boundary = chars.peek().map(|&(_, c)| c.is_whitespace()).unwrap_or(true);
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}

fn finish_sentence(sentence: &str) -> String {
    let mut result = SPACE_BEFORE_PUNCTUATION_REGEX
        .replace_all(sentence.trim(), "$1")
        .into_owned();

    if !ends_with_terminator(&result) {
        if INTERROGATIVE_REGEX.is_match(&result) {
            result.push('?');
        } else {
            result.push('.');
        }
    }

    let result = result
        .split(' ')
        .map(capitalize_pronoun_i)
        .collect::<Vec<_>>()
        .join(" ");

    capitalize_first(&result)
}

fn ends_with_terminator(sentence: &str) -> bool {
    sentence
        .trim_end_matches(is_closer)
        .chars()
        .next_back()
        .map(is_terminator)
        .unwrap_or(false)
}

/// Capitalize the first letter, looking past opening quotes and brackets.
fn capitalize_first(sentence: &str) -> String {
    let Some((index, first)) = sentence.char_indices().find(|&(_, c)| !is_opener(c)) else {
        return sentence.to_string();
    };
    if !first.is_lowercase() {
        return sentence.to_string();
    }

    let mut result = String::with_capacity(sentence.len());
    result.push_str(&sentence[..index]);
    result.extend(first.to_uppercase());
    result.push_str(&sentence[index + first.len_utf8()..]);
    result
}

/// Capitalize pronoun "i" standalone or in contractions.
///
/// Examples:
/// - "i" → "I"
/// - "i," → "I,"
/// - "i'm" → "I'm"
/// - "i.e." is left alone
fn capitalize_pronoun_i(word: &str) -> String {
    let core = word.trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!' | '?'));
    if core == "i" || core.starts_with("i'") || core.starts_with("i’") {
        let mut result = String::with_capacity(word.len());
        result.push('I');
        result.push_str(&word[1..]);
        return result;
    }

    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process(""), "");
    }

    #[test]
    fn test_capitalize_and_terminate() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process("hello world"), "Hello world.");
    }

    #[test]
    fn test_question_detection() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process("can you help me"), "Can you help me?");
        assert_eq!(processor.process("are we done. yes"), "Are we done. Yes.");
        assert_eq!(processor.process("Is it ready"), "Is it ready?");
    }

    #[test]
    fn test_multiple_sentences() {
        let processor = SentenceProcessor::new();
        assert_eq!(
            processor.process("hello there. how are you? i am fine!"),
            "Hello there. How are you? I am fine!"
        );
    }

    #[test]
    fn test_space_before_punctuation() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process("wait , what ?"), "Wait, what?");
        assert_eq!(processor.process("done ."), "Done.");
    }

    #[test]
    fn test_terminator_runs() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process("really?! no way..."), "Really?! No way...");
    }

    #[test]
    fn test_no_split_inside_tokens() {
        let processor = SentenceProcessor::new();
        assert_eq!(processor.process("pi is 3.14"), "Pi is 3.14.");
        assert_eq!(processor.process("see example.com now"), "See example.com now.");
    }

    #[test]
    fn test_quotes() {
        let processor = SentenceProcessor::new();
        assert_eq!(
            processor.process("\"stop.\" then go"),
            "\"Stop.\" Then go."
        );
    }

    #[test]
    fn test_capitalize_pronoun_i() {
        assert_eq!(capitalize_pronoun_i("i"), "I");
        assert_eq!(capitalize_pronoun_i("i,"), "I,");
        assert_eq!(capitalize_pronoun_i("i'm"), "I'm");
        assert_eq!(capitalize_pronoun_i("i’ll"), "I’ll");
        assert_eq!(capitalize_pronoun_i("i.e."), "i.e.");
        assert_eq!(capitalize_pronoun_i("it"), "it");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("hello"), "Hello");
        assert_eq!(capitalize_first("(note) x"), "(Note) x");
        assert_eq!(capitalize_first("3 cats"), "3 cats");
        assert_eq!(capitalize_first("élan"), "Élan");
    }
}
