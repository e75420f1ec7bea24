//! Post-inference output cleanup.
//!
//! Models asked for `json_object` mostly comply, but some wrap the object in
//! Markdown fences, prefix a sentence, or emit reasoning tags first.

use std::sync::LazyLock;

use regex::Regex;

/// Strip reasoning artifacts from raw model output.
///
/// Handles `<think>...</think>` blocks and stray `<unusedN>` tokens. The
/// `<unusedN>thought` prefix strip covers Gemma-family models, which local
/// OpenAI-compatible servers (Ollama, vLLM) serve under the same endpoint.
pub fn sanitize_llm_output(raw: &str) -> String {
    static THINK_BLOCK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
    static UNUSED_TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));

    let mut text = THINK_BLOCK_RE.replace_all(raw, "").to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + 8..].to_string();
        }
    }

    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();

    text.trim().to_string()
}

/// Extract the JSON object from a model answer.
/// Handles answers that include text before/after the JSON.
pub fn extract_json_block(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_think_block() {
        let raw = "<think>the patient is 40</think>\n{\"match\": true}";
        assert_eq!(sanitize_llm_output(raw), "{\"match\": true}");
    }

    #[test]
    fn strips_unused_thought_prefix() {
        let raw = "<unused94>thought\nreasoning here\n{\"a\": 1}";
        let cleaned = sanitize_llm_output(raw);
        assert!(!cleaned.contains("<unused"));
        assert!(cleaned.ends_with("{\"a\": 1}"));
    }

    #[test]
    fn plain_json_untouched() {
        assert_eq!(sanitize_llm_output("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn extracts_fenced_json() {
        let response = "Here you go:\n```json\n{\"patients\": []}\n```\nDone.";
        assert_eq!(extract_json_block(response), Some("{\"patients\": []}"));
    }

    #[test]
    fn extracts_unlabelled_fence() {
        let response = "```\n{\"patients\": []}\n```";
        assert_eq!(extract_json_block(response), Some("{\"patients\": []}"));
    }

    #[test]
    fn extracts_object_with_preamble() {
        let response = "Sure. {\"match\": false, \"trialId\": \"NCT1\"} Hope this helps.";
        assert_eq!(
            extract_json_block(response),
            Some("{\"match\": false, \"trialId\": \"NCT1\"}")
        );
    }

    #[test]
    fn no_object_found() {
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("} backwards {"), None);
    }
}
