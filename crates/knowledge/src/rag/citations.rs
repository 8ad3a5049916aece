//! Source citations for generated answers.

use serde::{Deserialize, Serialize};

use crate::rag::message::Message;
use crate::rag::tool::normalize_whitespace;
use crate::types::Passage;

/// Heading placed between the answer and the citation lines.
pub const SOURCES_HEADER: &str = "\n\n**Sources:**\n";

const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Maximum excerpt length in characters.
const MAX_EXCERPT_CHARS: usize = 150;

/// A passage cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub similarity: Option<f32>,
    pub excerpt: String,
}

impl Citation {
    pub fn from_passage(passage: &Passage) -> Self {
        Self {
            title: passage
                .metadata
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            similarity: passage.metadata.similarity,
            excerpt: truncate_excerpt(&passage.text, MAX_EXCERPT_CHARS),
        }
    }

    /// Render as a markdown list item.
    pub fn to_line(&self) -> String {
        let similarity = self
            .similarity
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "- (Product: {}, Similarity: {}) \"{}\"",
            self.title, similarity, self.excerpt
        )
    }
}

/// Citations for the latest question's tool round.
///
/// Walks the history backward collecting Tool messages and stops at the
/// nearest Human message, so earlier rounds never leak in.
pub fn collect_citations(history: &[Message]) -> Vec<Citation> {
    let mut round: Vec<&[Passage]> = Vec::new();

    for message in history.iter().rev() {
        match message {
            Message::Human { .. } => break,
            Message::Tool { artifact, .. } => round.push(artifact),
            Message::Ai { .. } | Message::System { .. } => {}
        }
    }

    round
        .into_iter()
        .rev()
        .flat_map(|artifact| artifact.iter().map(Citation::from_passage))
        .collect()
}

/// Append the sources block to an answer.
pub fn format_with_sources(answer: &str, citations: &[Citation]) -> String {
    let lines: Vec<String> = citations.iter().map(Citation::to_line).collect();
    format!("{}{}{}", answer.trim(), SOURCES_HEADER, lines.join("\n"))
}

fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let normalized = normalize_whitespace(text);
    if normalized.chars().count() <= max_chars {
        normalized
    } else {
        let truncated: String = normalized.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassageMetadata;
    use catalog_llm::ToolCall;
    use serde_json::json;

    fn cited(text: &str, title: &str, similarity: f32) -> Passage {
        Passage::new(
            text,
            PassageMetadata {
                source: Some(title.to_string()),
                title: Some(title.to_string()),
                similarity: Some(similarity),
                ..Default::default()
            },
        )
    }

    fn tool_call() -> Message {
        Message::Ai {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "retrieve".to_string(),
                arguments: json!({"query": "webcam"}),
            }],
        }
    }

    fn tool_result(artifact: Vec<Passage>) -> Message {
        Message::Tool {
            tool_call_id: "call_1".to_string(),
            name: "retrieve".to_string(),
            content: String::new(),
            artifact,
        }
    }

    #[test]
    fn test_collects_current_round_only() {
        let p1 = cited("LensPro 4K in black", "webcam.txt", 0.1);
        let p2 = cited("LensPro 4K in silver", "webcam-2.txt", 0.2);
        let p3 = cited("Oak desk", "desk.txt", 0.3);

        let mut history = vec![
            Message::human("What colors does the LensPro come in?"),
            tool_call(),
            tool_result(vec![p1.clone(), p2.clone()]),
            Message::ai("Black and silver."),
        ];

        let first = collect_citations(&history);
        assert_eq!(
            first,
            vec![Citation::from_passage(&p1), Citation::from_passage(&p2)]
        );

        history.push(Message::human("And desks?"));
        history.push(tool_call());
        history.push(tool_result(vec![p3.clone()]));

        assert_eq!(
            collect_citations(&history),
            vec![Citation::from_passage(&p3)]
        );
        assert_eq!(collect_citations(&history[..4]), first);
    }

    #[test]
    fn test_multiple_tool_messages_keep_order() {
        let p1 = cited("first", "a.txt", 0.1);
        let p2 = cited("second", "b.txt", 0.2);
        let history = vec![
            Message::human("q"),
            tool_call(),
            tool_result(vec![p1.clone()]),
            tool_result(vec![p2.clone()]),
        ];

        let titles: Vec<String> = collect_citations(&history)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_citation_scan_skips_system() {
        let p1 = cited("LensPro 4K in black", "webcam.txt", 0.1);
        let p2 = cited("LensPro 4K in silver", "webcam-2.txt", 0.2);
        let history = vec![
            Message::human("q"),
            tool_call(),
            tool_result(vec![p1.clone()]),
            Message::system("be brief"),
            tool_result(vec![p2.clone()]),
        ];

        assert_eq!(
            collect_citations(&history),
            vec![Citation::from_passage(&p1), Citation::from_passage(&p2)]
        );
        assert_eq!(
            collect_citations(&history[..4]),
            vec![Citation::from_passage(&p1)]
        );
    }

    #[test]
    fn test_line_format_and_fallbacks() {
        let citation = Citation::from_passage(&Passage::new(
            "plain\ntext",
            PassageMetadata::default(),
        ));
        assert_eq!(
            citation.to_line(),
            "- (Product: Unknown Product, Similarity: N/A) \"plain text\""
        );

        let citation = Citation::from_passage(&cited("x", "webcam.txt", 0.1));
        assert_eq!(
            citation.to_line(),
            "- (Product: webcam.txt, Similarity: 0.100) \"x\""
        );
    }

    #[test]
    fn test_excerpt_truncation() {
        let exact = "a".repeat(MAX_EXCERPT_CHARS);
        assert_eq!(truncate_excerpt(&exact, MAX_EXCERPT_CHARS), exact);

        let long = "b".repeat(MAX_EXCERPT_CHARS + 20);
        let excerpt = truncate_excerpt(&long, MAX_EXCERPT_CHARS);
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_format_with_no_sources() {
        let answer = format_with_sources("  Nothing found.  ", &[]);
        assert_eq!(answer, "Nothing found.\n\n**Sources:**\n");
    }
}
