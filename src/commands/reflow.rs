//! Word-wrapping of commit message descriptions.

/// Column width used for commit message bodies.
pub const COMMIT_BODY_WIDTH: usize = 76;

/// Reflows `text` so that paragraph lines are at most `width` columns wide.
///
/// A paragraph is a run of lines that are neither empty nor indented. Its
/// words are rejoined and wrapped, and it is followed by a blank line. Empty
/// and indented lines (starting with a space or tab) end the current
/// paragraph and are copied through unchanged, so code blocks and lists
/// survive. A single word longer than `width` gets a line of its own.
///
/// The result always ends in exactly one newline.
///
/// # Examples
///
/// ```
/// use merge_gate::commands::reflow;
///
/// assert_eq!(reflow("foo bar baz quux", 8), "foo bar\nbaz quux\n");
/// assert_eq!(reflow("foo bar\n  baz quux", 8), "foo bar\n\n  baz quux\n");
/// ```
pub fn reflow(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with([' ', '\t']) {
            if !paragraph.is_empty() {
                wrap_paragraph(&mut out, &paragraph, width);
                paragraph.clear();
            }
            out.push_str(line);
            out.push('\n');
            continue;
        }
        paragraph.extend(line.split_whitespace());
    }

    if !paragraph.is_empty() {
        wrap_paragraph(&mut out, &paragraph, width);
    }

    let mut result = out.trim_end_matches('\n').to_string();
    result.push('\n');
    result
}

fn wrap_paragraph(out: &mut String, words: &[&str], width: usize) {
    let mut current = 0;
    for word in words {
        let len = word.chars().count();
        if current > 0 && current + 1 + len > width {
            out.push('\n');
            current = 0;
        }
        if current > 0 {
            out.push(' ');
            current += 1;
        }
        out.push_str(word);
        current += len;
    }
    out.push_str("\n\n");
}

/// Builds the override commit message from a comment's subject and description.
///
/// Returns `None` when the subject is empty, in which case the message of
/// the pull request's first commit is used instead.
pub fn override_message(subject: &str, description: &str) -> Option<String> {
    if subject.trim().is_empty() {
        return None;
    }
    let message = format!(
        "{}\n\n{}",
        subject,
        reflow(description, COMMIT_BODY_WIDTH)
    );
    Some(message.trim().to_string())
}
