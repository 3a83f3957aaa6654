use comfy_table::{Cell, ContentArrangement, Table};
use repolens_app::SessionState;
use repolens_core::analysis::{AnalysisKind, MindMapNode, QualityFinding};
use repolens_core::doctor::DoctorReport;
use repolens_core::tree::{FileTree, RowKind};

pub fn tree_listing(tree: &FileTree) -> String {
    let mut lines: Vec<String> = tree
        .rows()
        .into_iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            match row.kind {
                RowKind::Folder => format!("{indent}{}/", row.name),
                RowKind::File => format!("{indent}{}", row.name),
            }
        })
        .collect();

    lines.push(format!(
        "{} files in {} folders",
        tree.file_count(),
        tree.folder_count()
    ));
    if !tree.conflicts().is_empty() {
        lines.push(format!(
            "skipped {} conflicting paths: {}",
            tree.conflicts().len(),
            tree.conflicts().join(", ")
        ));
    }
    lines.join("\n")
}

pub fn mind_map_outline(root: &MindMapNode) -> String {
    let mut lines = Vec::new();
    push_outline(root, 0, &mut lines);
    lines.join("\n")
}

fn push_outline(node: &MindMapNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    if node.kind.is_empty() {
        lines.push(format!("{indent}- {}", node.name));
    } else {
        lines.push(format!("{indent}- {} ({})", node.name, node.kind));
    }
    for child in &node.children {
        push_outline(child, depth + 1, lines);
    }
}

pub fn quality_table(findings: &[QualityFinding]) -> String {
    if findings.is_empty() {
        return "No issues found.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Line", "Issue", "Suggestion"]);
    for finding in findings {
        table.add_row(vec![
            Cell::new(finding.line.to_string()),
            Cell::new(finding.issue.as_str()),
            Cell::new(finding.suggestion.as_str()),
        ]);
    }
    table.to_string()
}

/// Text printed (or written) for a finished analysis of `kind`.
pub fn analysis_result(kind: AnalysisKind, state: &SessionState) -> Option<String> {
    let results = state.analysis();
    match kind {
        AnalysisKind::Explanation => results.explanation.clone(),
        AnalysisKind::MindMap => results.mind_map.as_ref().map(mind_map_outline),
        AnalysisKind::Quality => results.quality.as_deref().map(quality_table),
        AnalysisKind::Tests => results.test_code.clone(),
        AnalysisKind::Comment => state.content().map(|content| content.edited.clone()),
    }
}

pub fn doctor_table(report: &DoctorReport) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(check.state.to_string()),
            Cell::new(check.details.as_str()),
        ]);
    }

    format!("{table}\n{}", report.summary())
}
