mod agreement;
mod lexical;
mod sentence;
mod whitespace;

use crate::config::PolishConfig;
use crate::format::split_paragraphs;
use once_cell::sync::Lazy;
use std::fmt;

pub use agreement::AgreementProcessor;
pub use lexical::LexicalProcessor;
pub use sentence::SentenceProcessor;
pub use whitespace::WhitespaceProcessor;

/// Trait for text post-processors.
///
/// Processors are total: text they do not recognize passes through unchanged.
pub trait TextProcessor: Send + Sync {
    /// Process the input text and return the transformed result.
    fn process(&self, text: &str) -> String;
}

/// Pipeline that orchestrates multiple text processors.
///
/// Processors are applied in sequence, with each processor
/// receiving the output of the previous one.
pub struct Pipeline {
    processors: Vec<Box<dyn TextProcessor>>,
}

static STANDARD_PIPELINE: Lazy<Pipeline> = Lazy::new(Pipeline::standard);

/// Run the standard polisher over `text`.
///
/// Deterministic and infallible; `polish(polish(x)) == polish(x)`.
pub fn polish(text: &str) -> String {
    STANDARD_PIPELINE.process(text)
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline.
    pub fn add_processor(&mut self, processor: Box<dyn TextProcessor>) {
        self.processors.push(processor);
    }

    /// The full polisher: whitespace → lexical → agreement → sentences.
    pub fn standard() -> Self {
        Self::from_config(&PolishConfig::default())
    }

    /// Create a pipeline from configuration.
    ///
    /// Whitespace normalization always runs first; the remaining stages
    /// follow in fixed order when enabled.
    pub fn from_config(config: &PolishConfig) -> Self {
        let mut pipeline = Self::new();

        pipeline.add_processor(Box::new(WhitespaceProcessor::new()));

        // Substitution table before agreement: some entries produce text the nudge reads
        if config.lexical_fixes {
            pipeline.add_processor(Box::new(LexicalProcessor::new()));
        }

        if config.agreement_nudge {
            pipeline.add_processor(Box::new(AgreementProcessor::new()));
        }

        // Casing and terminal punctuation last
        if config.sentence_casing {
            pipeline.add_processor(Box::new(SentenceProcessor::new()));
        }

        pipeline
    }

    /// Process text through all processors in the pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = text.to_string();

        for processor in &self.processors {
            result = processor.process(&result);
        }

        result
    }

    /// Process each blank-line separated paragraph on its own.
    ///
    /// Paragraphs are rejoined with a blank line so the structure survives a
    /// round trip back to markup.
    pub fn process_paragraphs(&self, text: &str) -> String {
        split_paragraphs(text)
            .into_iter()
            .map(|paragraph| self.process(paragraph))
            .filter(|paragraph| !paragraph.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the pipeline has any processors.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("processors", &self.processors.len())
            .finish()
    }
}
