//! Removal of reasoning traces from completions
//!
//! Reasoning models often wrap their chain of thought in delimiters such as
//! `<think>...</think>`. Those blocks must not end up in library notes.

use once_cell::sync::Lazy;
use regex::Regex;

static REASONING_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<thinking>.*?</thinking>",
        r"(?is)<thought>.*?</thought>",
        r"(?is)<think>.*?</think>",
        r"(?is)<reasoning>.*?</reasoning>",
        r"(?is)<analysis>.*?</analysis>",
        r"(?is)<consideration>.*?</consideration>",
        r"(?is)<internal_thought>.*?</internal_thought>",
        r"(?is)<\|thinking\|>.*?<\|/thinking\|>",
        r"(?is)\[THINKING\].*?\[/THINKING\]",
        r"(?is)```thinking.*?```",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank-line pattern"));

/// Strip reasoning blocks, collapse blank-line runs, and trim
///
/// # Examples
///
/// ```
/// use zotllm_llm::strip_reasoning;
///
/// let raw = "<think>\nLet me see...\n</think>\n\nThe paper studies X.";
/// assert_eq!(strip_reasoning(raw), "The paper studies X.");
/// ```
pub fn strip_reasoning(content: &str) -> String {
    let mut cleaned = content.to_string();
    for pattern in REASONING_BLOCKS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    BLANK_RUNS
        .replace_all(&cleaned, "\n\n")
        .trim()
        .to_string()
}
