use super::TextProcessor;

/// Collapses whitespace runs (non-breaking spaces and newlines included) to a
/// single space and trims both ends.
pub struct WhitespaceProcessor;

impl WhitespaceProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WhitespaceProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor for WhitespaceProcessor {
    fn process(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_runs() {
        let processor = WhitespaceProcessor::new();
        assert_eq!(processor.process("  hello   world \n\t again "), "hello world again");
    }

    #[test]
    fn test_non_breaking_space() {
        let processor = WhitespaceProcessor::new();
        assert_eq!(processor.process("hello\u{00A0}\u{00A0}world"), "hello world");
    }

    #[test]
    fn test_empty_string() {
        let processor = WhitespaceProcessor::new();
        assert_eq!(processor.process(""), "");
        assert_eq!(processor.process("   "), "");
    }
}
