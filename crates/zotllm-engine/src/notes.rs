//! Note bodies: rendering generated text as HTML and reading it back

use once_cell::sync::Lazy;
use regex::Regex;

static PRE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("valid pre pattern"));

static BLOCK_BREAKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|pre|blockquote)>").expect("valid break pattern")
});

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank-line pattern"));

/// Escape text for inclusion in a note body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Render a task note
///
/// # Examples
///
/// ```
/// use zotllm_engine::render_note;
///
/// let body = render_note("LLM Summary", "qwen3-8b", "a < b");
/// assert_eq!(
///     body,
///     "<h2>LLM Summary</h2><p><strong>Model:</strong> qwen3-8b</p><pre>a &lt; b</pre>"
/// );
/// ```
pub fn render_note(title: &str, model: &str, text: &str) -> String {
    format!(
        "<h2>{}</h2><p><strong>Model:</strong> {}</p><pre>{}</pre>",
        escape_html(title),
        escape_html(model),
        escape_html(text)
    )
}

/// Render a question-answering note with its question and sources
pub fn render_qa_note(title: &str, model: &str, question: &str, sources: &[String], text: &str) -> String {
    let mut body = format!(
        "<h2>{}</h2><p><strong>Model:</strong> {}</p><p><strong>Question:</strong> {}</p>",
        escape_html(title),
        escape_html(model),
        escape_html(question)
    );
    if !sources.is_empty() {
        body.push_str("<p><strong>Sources:</strong></p><ol>");
        for source in sources {
            body.push_str(&format!("<li>{}</li>", escape_html(source)));
        }
        body.push_str("</ol>");
    }
    body.push_str(&format!("<pre>{}</pre>", escape_html(text)));
    body
}

/// Reduce an HTML note body to plain text
///
/// # Examples
///
/// ```
/// use zotllm_engine::html_to_text;
///
/// assert_eq!(html_to_text("<p>One &amp; two</p><p>Three</p>"), "One & two\nThree");
/// ```
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_BREAKS.replace_all(html, "\n");
    let stripped = TAGS.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    BLANK_RUNS.replace_all(&decoded, "\n\n").trim().to_string()
}

/// Generated text of a note
///
/// Notes written by the tasks keep the generated text in a `<pre>` block
/// below the heading and model line; other notes are converted whole.
pub fn note_text(body: &str) -> String {
    match PRE_BLOCK.captures(body).and_then(|c| c.get(1)) {
        Some(inner) => html_to_text(inner.as_str()),
        None => html_to_text(body),
    }
}
