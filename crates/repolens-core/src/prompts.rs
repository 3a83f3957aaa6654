//! Prompt text for each analysis kind.
//!
//! Every builder embeds the code in a bare fenced block so the engine sees
//! the exact text the user is looking at, edits included.

use std::path::Path;

const DEFAULT_QUESTION: &str = "Provide a high-level explanation of what this code does.";

pub fn explanation(path: &str, code: &str, question: Option<&str>) -> String {
    let question = question
        .map(str::trim)
        .filter(|question| !question.is_empty())
        .unwrap_or(DEFAULT_QUESTION);

    format!(
        "Analyze the following code from the file \"{path}\".\n\
         User's question: \"{question}\"\n\
         Provide a clear and concise explanation. Format the response using markdown.\n\n\
         {}",
        fenced("Code", code)
    )
}

pub fn mind_map(path: &str, code: &str) -> String {
    format!(
        "Generate a hierarchical JSON object representing the structure of the code below.\n\
         The root node should be the file name. Each node must have a \"name\" (string) and \
         \"type\" (string, e.g., \"function\", \"class\", \"import\").\n\
         Nested structures should be in a \"children\" array.\n\
         IMPORTANT: Respond with only the raw JSON object, without any surrounding text or \
         markdown formatting.\n\n\
         File: {path}\n\
         {}",
        fenced("Code", code)
    )
}

pub fn quality(path: &str, code: &str) -> String {
    format!(
        "Analyze the code in \"{path}\" for quality, bugs, and potential improvements.\n\
         Provide suggestions as a JSON array. Each object in the array must have three keys: \
         \"line\" (number or \"N/A\"), \"issue\" (string), and \"suggestion\" (string).\n\
         IMPORTANT: Respond with only the raw JSON array, without any surrounding text or \
         markdown formatting.\n\n\
         {}",
        fenced("Code", code)
    )
}

pub fn comment(code: &str) -> String {
    format!(
        "Add helpful, concise inline comments to the following code.\n\
         Return only the complete, updated code with the comments added. Do not add any \
         explanation, just the raw code.\n\n\
         {}",
        fenced("Code", code)
    )
}

pub fn tests(path: &str, code: &str) -> String {
    format!(
        "Generate unit tests for the following code from \"{path}\" using {}.\n\
         Provide only the test code in a single code block. Do not add any explanations or \
         surrounding text.\n\n\
         {}",
        test_framework(path),
        fenced("Code", code)
    )
}

pub fn snippet(snippet: &str) -> String {
    format!(
        "Explain the following code snippet concisely. Focus on its purpose and functionality.\n\n\
         {}",
        fenced("Snippet", snippet)
    )
}

/// Testing framework named in the tests prompt, keyed on file extension.
pub fn test_framework(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("py") => "the pytest framework",
        Some("rs") => "Rust's built-in test harness",
        Some("go") => "the Go testing package",
        Some("js" | "jsx" | "ts" | "tsx") => "the Jest framework",
        Some("java") => "the JUnit 5 framework",
        _ => "the idiomatic testing framework for this language",
    }
}

fn fenced(label: &str, code: &str) -> String {
    format!("{label}:\n```\n{code}\n```\n")
}
