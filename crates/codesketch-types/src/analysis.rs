//! Static-analysis result types.

use serde::{Deserialize, Serialize};

/// Structural tag reported when its matcher matches somewhere in a snippet.
///
/// Declaration order is the order matchers run and the order tags appear in
/// [`CodeAnalysis::patterns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    ClassDefinition,
    FunctionDefinition,
    ForLoop,
    WhileLoop,
    TryBlock,
    ExceptBlock,
    IfStatement,
}

impl PatternTag {
    /// Every tag, in matcher order.
    pub const ALL: [PatternTag; 7] = [
        PatternTag::ClassDefinition,
        PatternTag::FunctionDefinition,
        PatternTag::ForLoop,
        PatternTag::WhileLoop,
        PatternTag::TryBlock,
        PatternTag::ExceptBlock,
        PatternTag::IfStatement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::ClassDefinition => "class_definition",
            PatternTag::FunctionDefinition => "function_definition",
            PatternTag::ForLoop => "for_loop",
            PatternTag::WhileLoop => "while_loop",
            PatternTag::TryBlock => "try_block",
            PatternTag::ExceptBlock => "except_block",
            PatternTag::IfStatement => "if_statement",
        }
    }
}

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock duration of each orchestration stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyBreakdown {
    /// Whole request, from the first gateway call to the end of analysis.
    pub total: f64,
    /// Code generation call.
    pub codegen: f64,
    /// Diagram generation call.
    pub diagram: f64,
    /// In-process static analysis.
    pub analysis: f64,
}

/// Metrics computed over a generated snippet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub token_count: usize,
    pub avg_cyclomatic_complexity: f64,
    #[serde(default)]
    pub patterns: Vec<PatternTag>,
    /// Stage timings; attached by the orchestrator, never by the analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<LatencyBreakdown>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_tag_serializes_snake_case() {
        let json = serde_json::to_string(&PatternTag::FunctionDefinition).unwrap();
        assert_eq!(json, "\"function_definition\"");

        for tag in PatternTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_analysis_omits_missing_latency() {
        let analysis = CodeAnalysis {
            token_count: 3,
            avg_cyclomatic_complexity: 1.0,
            patterns: vec![PatternTag::IfStatement],
            latency_ms: None,
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("latency_ms").is_none());
        assert_eq!(value["patterns"][0], "if_statement");
    }

    #[test]
    fn test_analysis_latency_is_a_stage_map() {
        let analysis = CodeAnalysis {
            latency_ms: Some(LatencyBreakdown {
                total: 12.5,
                codegen: 8.0,
                diagram: 4.0,
                analysis: 0.5,
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["latency_ms"]["total"], 12.5);
        assert_eq!(value["latency_ms"]["analysis"], 0.5);
    }
}
