//! Provider HTML → Telegram HTML.
//!
//! Telegram accepts only a handful of tags. Problem statements arrive as
//! full HTML, so before a freshly fetched task is stored it is rewritten:
//! - Simple unsupported tags are dropped or mapped to plain-text markers
//! - Opening `span`, `div` and `font` tags with attributes are stripped
//! - `<img>` tags become numbered `<a href>` links to the picture

use crate::model::Task;
use tracing::debug;

/// Applied in order. `<p>&nbsp;</p>` must come before both of its parts.
const SIMPLE_REPLACEMENTS: &[(&str, &str)] = &[
    ("<p>&nbsp;</p>", "\n"),
    ("&nbsp;", " "),
    ("<p>", ""),
    ("</p>", ""),
    ("<ol>", ""),
    ("</ol>", ""),
    ("<ul>", ""),
    ("</ul>", ""),
    ("<li>", " — "),
    ("</li>", ""),
    ("<em>", ""),
    ("</em>", ""),
    ("<br>", ""),
    ("</br>", ""),
    ("<br />", ""),
    ("<sup>", "**"),
    ("</sup>", ""),
    ("<sub>", "("),
    ("</sub>", ")"),
    ("</span>", "\n"),
    ("</font>", ""),
    ("</div>", ""),
    ("\n\n", "\n"),
];

const COMPLEX_OPEN_TAGS: &[&str] = &["span", "div", "font"];

/// Result of sanitizing one piece of provider text.
#[derive(Debug)]
pub struct SanitizeResult {
    /// The cleaned text.
    pub text: String,
    /// Whether anything was rewritten.
    pub was_modified: bool,
}

/// Rewrite provider HTML into the subset Telegram renders.
pub fn sanitize(input: &str) -> SanitizeResult {
    let mut text = remove_simple_tags(input);
    for tag in COMPLEX_OPEN_TAGS {
        text = strip_open_tags(&text, tag);
    }
    text = replace_images(&text);

    SanitizeResult {
        was_modified: text != input,
        text,
    }
}

/// Sanitize title, content and every hint of a freshly fetched task.
///
/// Images are only expected in the body, so the title skips that pass.
pub fn normalize_task(task: &mut Task) -> bool {
    let mut modified = false;

    let mut title = remove_simple_tags(&task.title);
    for tag in COMPLEX_OPEN_TAGS {
        title = strip_open_tags(&title, tag);
    }
    if title != task.title {
        task.title = title;
        modified = true;
    }

    let content = sanitize(&task.content);
    if content.was_modified {
        task.content = content.text;
        modified = true;
    }

    for hint in task.hints.iter_mut() {
        let cleaned = sanitize(hint);
        if cleaned.was_modified {
            *hint = cleaned.text;
            modified = true;
        }
    }

    if modified {
        debug!("normalized task {} for telegram", task.day_key);
    }
    modified
}

fn remove_simple_tags(input: &str) -> String {
    SIMPLE_REPLACEMENTS
        .iter()
        .fold(input.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Drop every `<tag ...>` opening tag, attributes included.
fn strip_open_tags(input: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        // Only a real tag boundary: `<span>` or `<span attr...>`, not `<spanner>`.
        let is_tag = after.starts_with('>') || after.starts_with(char::is_whitespace);
        match (is_tag, after.find('>')) {
            (true, Some(end)) => {
                out.push_str(&rest[..start]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str(&rest[..start + open.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replace `<img ... src="url" ... />` with `<a href="url">Picture N</a>`,
/// counting pictures from 0.
fn replace_images(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut picture = 0;

    while let Some(start) = rest.find("<img") {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start..start + len + 1];
        out.push_str(&rest[..start]);

        if let Some(url) = attribute(tag, "src") {
            out.push_str(&format!("\n<a href=\"{url}\">Picture {picture}</a>"));
            picture += 1;
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{name}=\"");
    let start = tag.find(&marker)? + marker.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DayKey, Difficulty};

    #[test]
    fn test_clean_input_passes_through() {
        let result = sanitize("Return <code>nums</code> sorted.");
        assert!(!result.was_modified);
        assert_eq!(result.text, "Return <code>nums</code> sorted.");
    }

    #[test]
    fn test_simple_tags_removed() {
        let result = sanitize("<p>Given <em>n</em>&nbsp;items:</p><ul><li>one</li></ul>");
        assert!(result.was_modified);
        assert_eq!(result.text, "Given n items: — one");
    }

    #[test]
    fn test_sup_and_sub() {
        let result = sanitize("1 &lt;= n &lt;= 10<sup>4</sup>, log<sub>2</sub>");
        assert_eq!(result.text, "1 &lt;= n &lt;= 10**4, log(2)");
    }

    #[test]
    fn test_complex_open_tags_stripped() {
        let result = sanitize(r#"<div class="x"><span style="color: red">hot</span></div>"#);
        assert_eq!(result.text, "hot\n");
    }

    #[test]
    fn test_open_tag_prefix_not_confused() {
        assert_eq!(strip_open_tags("<spanner>", "span"), "<spanner>");
        assert_eq!(strip_open_tags("<span>a", "span"), "a");
    }

    #[test]
    fn test_images_become_links() {
        let result = sanitize(
            r#"See <img alt="" src="https://x.test/a.png" style="width: 1px" /> and <img src="https://x.test/b.png">"#,
        );
        assert_eq!(
            result.text,
            "See \n<a href=\"https://x.test/a.png\">Picture 0</a> and \n<a href=\"https://x.test/b.png\">Picture 1</a>"
        );
    }

    #[test]
    fn test_normalize_task_touches_every_field() {
        let mut task = Task {
            day_key: DayKey::from_raw(20230615).unwrap(),
            question_id: 1,
            title: "<span>Two Sum</span>".into(),
            content: "<p>Body</p>".into(),
            hints: vec!["<em>think</em>".into(), "plain".into()],
            difficulty: Difficulty::Easy,
            title_slug: "two-sum".into(),
        };
        assert!(normalize_task(&mut task));
        assert_eq!(task.title, "Two Sum\n");
        assert_eq!(task.content, "Body");
        assert_eq!(task.hints, vec!["think".to_string(), "plain".to_string()]);
        assert!(!normalize_task(&mut task));
    }
}
