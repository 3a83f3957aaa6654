//! Maps an analysis kind to its prompt and expected reply shape, and turns
//! the engine's reply back into a typed [`AnalysisOutput`].

use repolens_core::analysis::{
    AnalysisKind, AnalysisOutput, AnalysisResults, parse_mind_map, parse_quality,
};
use repolens_core::engine::{EngineReply, ReplyShape};
use repolens_core::prompts;

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub prompt: String,
    pub shape: ReplyShape,
}

pub fn plan(kind: AnalysisKind, path: &str, code: &str, question: Option<&str>) -> DispatchPlan {
    let prompt = match kind {
        AnalysisKind::Explanation => prompts::explanation(path, code, question),
        AnalysisKind::MindMap => prompts::mind_map(path, code),
        AnalysisKind::Quality => prompts::quality(path, code),
        AnalysisKind::Comment => prompts::comment(code),
        AnalysisKind::Tests => prompts::tests(path, code),
    };

    let shape = if kind.expects_structured() {
        ReplyShape::Structured
    } else {
        ReplyShape::Text
    };

    DispatchPlan { prompt, shape }
}

pub fn snippet_plan(snippet: &str) -> DispatchPlan {
    DispatchPlan {
        prompt: prompts::snippet(snippet),
        shape: ReplyShape::Text,
    }
}

pub fn interpret(kind: AnalysisKind, reply: EngineReply) -> Result<AnalysisOutput, SessionError> {
    match (kind, reply) {
        (AnalysisKind::MindMap, EngineReply::Structured(value)) => parse_mind_map(value)
            .map(AnalysisOutput::MindMap)
            .map_err(|error| malformed(kind, error)),
        (AnalysisKind::Quality, EngineReply::Structured(value)) => parse_quality(value)
            .map(AnalysisOutput::Quality)
            .map_err(|error| malformed(kind, error)),
        (AnalysisKind::MindMap | AnalysisKind::Quality, EngineReply::Text(_)) => Err(
            SessionError::EmptyOrMalformedOutput(format!("{kind} reply was not structured")),
        ),
        (_, reply) => Ok(AnalysisOutput::PlainText(reply_text(reply))),
    }
}

pub fn reply_text(reply: EngineReply) -> String {
    match reply {
        EngineReply::Text(text) => text,
        EngineReply::Structured(value) => value.to_string(),
    }
}

/// Stores `output` under `kind`, replacing only that kind's previous value.
/// Comment output has no slot here; it rewrites the edited content instead.
pub fn store(results: &mut AnalysisResults, kind: AnalysisKind, output: AnalysisOutput) {
    match (kind, output) {
        (AnalysisKind::Explanation, AnalysisOutput::PlainText(text)) => {
            results.explanation = Some(text)
        }
        (AnalysisKind::Tests, AnalysisOutput::PlainText(text)) => results.test_code = Some(text),
        (_, AnalysisOutput::MindMap(node)) => results.mind_map = Some(node),
        (_, AnalysisOutput::Quality(findings)) => results.quality = Some(findings),
        (AnalysisKind::Comment | AnalysisKind::MindMap | AnalysisKind::Quality, _) => {}
    }
}

fn malformed(kind: AnalysisKind, error: serde_json::Error) -> SessionError {
    SessionError::EmptyOrMalformedOutput(format!("{kind} reply did not match: {error}"))
}

#[cfg(test)]
mod tests {
    use repolens_core::analysis::{FindingLine, MindMapNode, QualityFinding};
    use serde_json::json;

    use super::*;

    #[test]
    fn structured_kinds_request_structured_replies() {
        for kind in AnalysisKind::ALL {
            let plan = plan(kind, "src/lib.rs", "pub fn a() {}", None);
            let expected = if kind.expects_structured() {
                ReplyShape::Structured
            } else {
                ReplyShape::Text
            };
            assert_eq!(plan.shape, expected, "{kind}");
            assert!(plan.prompt.contains("pub fn a() {}"), "{kind}");
        }
    }

    #[test]
    fn explanation_plan_carries_question() {
        let plan = plan(
            AnalysisKind::Explanation,
            "a.py",
            "x = 1",
            Some("what is x?"),
        );
        assert!(plan.prompt.contains("what is x?"));
    }

    #[test]
    fn quality_reply_becomes_findings() {
        let output = interpret(
            AnalysisKind::Quality,
            EngineReply::Structured(json!([
                {"line": 3, "issue": "unused import", "suggestion": "remove it"}
            ])),
        )
        .expect("findings");

        assert_eq!(
            output,
            AnalysisOutput::Quality(vec![QualityFinding {
                line: FindingLine::Number(3),
                issue: "unused import".to_string(),
                suggestion: "remove it".to_string(),
            }])
        );
    }

    #[test]
    fn wrong_structure_is_malformed_output() {
        let error = interpret(
            AnalysisKind::Quality,
            EngineReply::Structured(json!({"issues": []})),
        )
        .expect_err("should fail");
        assert!(matches!(error, SessionError::EmptyOrMalformedOutput(_)));

        let error = interpret(AnalysisKind::MindMap, EngineReply::Text("a tree".to_string()))
            .expect_err("should fail");
        assert!(matches!(error, SessionError::EmptyOrMalformedOutput(_)));
    }

    #[test]
    fn store_replaces_one_kind_and_ignores_comment() {
        let mut results = AnalysisResults {
            explanation: Some("old".to_string()),
            test_code: Some("tests".to_string()),
            ..AnalysisResults::default()
        };

        store(
            &mut results,
            AnalysisKind::Explanation,
            AnalysisOutput::PlainText("new".to_string()),
        );
        store(
            &mut results,
            AnalysisKind::Comment,
            AnalysisOutput::PlainText("// commented".to_string()),
        );
        store(
            &mut results,
            AnalysisKind::MindMap,
            AnalysisOutput::MindMap(MindMapNode {
                name: "lib.rs".to_string(),
                kind: "file".to_string(),
                children: Vec::new(),
            }),
        );

        assert_eq!(results.explanation.as_deref(), Some("new"));
        assert_eq!(results.test_code.as_deref(), Some("tests"));
        assert!(results.mind_map.is_some());
        assert!(results.quality.is_none());
    }
}
