//! Plain-text lines the editor shows for listings, requests and drafts

use rb_client::{DiffComment, FileDiffSummary, ReviewDraft, ReviewRequest};

/// Summary and change number are cut to this many characters in listings
pub const MAX_SUMMARY_CHARS: usize = 140;

/// One line of the review request listing
pub fn listing_line(request: &ReviewRequest) -> String {
    let changenum = request
        .changenum
        .map(|n| format!("[{}]", n))
        .unwrap_or_default();
    let summary: String = request
        .summary
        .lines()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .chain(changenum.chars())
        .take(MAX_SUMMARY_CHARS)
        .collect();

    format!(
        "{:>7} {:>7} {:>12}  --  {}",
        request.id, request.status, request.submitter, summary
    )
}

/// `# key : first line`, later lines indented under it
fn push_field(lines: &mut Vec<String>, key: &str, value: &str) {
    for (idx, line) in value.lines().enumerate() {
        if idx == 0 {
            lines.push(format!("# {} : {}", key, line));
        } else {
            lines.push(format!("     {}", line));
        }
    }
}

/// Header and file list of a review request
///
/// The file section is left out when the request has no diff yet.
pub fn request_lines(request: &ReviewRequest, files: Option<&[FileDiffSummary]>) -> Vec<String> {
    let mut lines = Vec::new();
    let changenum = request.changenum.map(|n| n.to_string()).unwrap_or_default();
    push_field(&mut lines, "changenum", &changenum);
    push_field(&mut lines, "summary", &request.summary);
    push_field(&mut lines, "description", &request.description);

    if let Some(files) = files {
        lines.push(String::new());
        lines.push(String::new());
        lines.push("# files :".to_string());
        lines.extend(files.iter().map(|f| f.dest_file.clone()));
    }
    lines
}

/// Draft review with its diff comments
pub fn draft_lines(draft: &ReviewDraft, comments: &[DiffComment]) -> Vec<String> {
    let mut lines = vec!["# header :".to_string()];
    lines.extend(draft.body_top.lines().map(str::to_string));
    lines.push(String::new());
    lines.push(String::new());

    if !comments.is_empty() {
        lines.push("# diffs :".to_string());
    }
    for comment in comments {
        // Titles read "path (revision)"
        let file = comment
            .filediff_title
            .as_deref()
            .and_then(|title| title.split_whitespace().next())
            .unwrap_or("?");
        lines.push(format!(
            "- {} [{}-{}] -",
            file,
            comment.first_line,
            comment.first_line + comment.num_lines
        ));
        lines.extend(comment.text.lines().map(str::to_string));
        lines.push(String::new());
    }

    if !draft.body_bottom.is_empty() {
        lines.push("# tail :".to_string());
        lines.extend(draft.body_bottom.lines().map(str::to_string));
        lines.push(String::new());
        lines.push(String::new());
    }
    lines
}

/// Drop lines starting with `#` from text edited in the shell
pub fn strip_comment_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}
