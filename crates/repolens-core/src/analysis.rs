//! Analysis kinds and the typed shapes of their replies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    Explanation,
    MindMap,
    Quality,
    Comment,
    Tests,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        Self::Explanation,
        Self::MindMap,
        Self::Quality,
        Self::Comment,
        Self::Tests,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explanation => "explanation",
            Self::MindMap => "mindmap",
            Self::Quality => "quality",
            Self::Comment => "comment",
            Self::Tests => "tests",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Explanation => "Explain",
            Self::MindMap => "Mind map",
            Self::Quality => "Quality",
            Self::Comment => "Comment",
            Self::Tests => "Tests",
        }
    }

    /// Whether the engine is asked for JSON rather than prose.
    pub fn expects_structured(self) -> bool {
        matches!(self, Self::MindMap | Self::Quality)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                let expected: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
                format!(
                    "unknown analysis kind '{value}', expected one of: {}",
                    expected.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(MindMapNode::node_count)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawLine")]
pub enum FindingLine {
    Number(u64),
    #[default]
    NotApplicable,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLine {
    Number(u64),
    Text(String),
    Other(Value),
}

impl From<RawLine> for FindingLine {
    fn from(raw: RawLine) -> Self {
        match raw {
            RawLine::Number(line) => Self::Number(line),
            RawLine::Text(text) => text
                .trim()
                .parse()
                .map(Self::Number)
                .unwrap_or(Self::NotApplicable),
            RawLine::Other(_) => Self::NotApplicable,
        }
    }
}

impl fmt::Display for FindingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(line) => write!(f, "{line}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QualityFinding {
    #[serde(default)]
    pub line: FindingLine,
    pub issue: String,
    pub suggestion: String,
}

/// Engine reply validated into the shape its kind promises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutput {
    PlainText(String),
    MindMap(MindMapNode),
    Quality(Vec<QualityFinding>),
}

pub fn parse_mind_map(value: Value) -> Result<MindMapNode, serde_json::Error> {
    serde_json::from_value(value)
}

pub fn parse_quality(value: Value) -> Result<Vec<QualityFinding>, serde_json::Error> {
    serde_json::from_value(value)
}

/// Last successful result per stored kind. Comment output lives in the
/// edited file content instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResults {
    pub explanation: Option<String>,
    pub mind_map: Option<MindMapNode>,
    pub quality: Option<Vec<QualityFinding>>,
    pub test_code: Option<String>,
}

impl AnalysisResults {
    pub fn is_empty(&self) -> bool {
        self.explanation.is_none()
            && self.mind_map.is_none()
            && self.quality.is_none()
            && self.test_code.is_none()
    }

    pub fn has(&self, kind: AnalysisKind) -> bool {
        match kind {
            AnalysisKind::Explanation => self.explanation.is_some(),
            AnalysisKind::MindMap => self.mind_map.is_some(),
            AnalysisKind::Quality => self.quality.is_some(),
            AnalysisKind::Tests => self.test_code.is_some(),
            AnalysisKind::Comment => false,
        }
    }
}
