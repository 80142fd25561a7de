use insights_core::{CommentRecord, FlatRecord, FlatThread, PostRecord};

/// Characters of a comment body kept on its line.
pub const COMMENT_CHAR_CAP: usize = 500;

/// Overall budget for the formatted thread once embedded in a prompt.
pub const PROMPT_TEXT_BUDGET: usize = 12000;

/// Renders a flattened thread as plain text for the model.
///
/// The post block comes first, then one line per comment indented two spaces
/// per depth level and prefixed with its score.
pub fn format_for_llm(thread: &FlatThread) -> String {
    format_records(&thread.records)
}

pub fn format_records(records: &[FlatRecord]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(records.len() + 5);
    for record in records {
        match record {
            FlatRecord::Post(post) => push_post_block(&mut parts, post),
            FlatRecord::Comment(comment) => parts.push(comment_line(comment)),
        }
    }
    parts.join("\n")
}

fn push_post_block(parts: &mut Vec<String>, post: &PostRecord) {
    parts.push(format!("=== POST (r/{}) ===", post.subreddit));
    parts.push(format!("Title: {}", post.title));
    if !post.body.is_empty() {
        parts.push(format!("Body: {}", post.body));
    }
    parts.push(format!(
        "Score: {} | Comments: {}",
        post.score, post.num_comments
    ));
    parts.push(String::new());
}

fn comment_line(comment: &CommentRecord) -> String {
    let indent = "  ".repeat(comment.depth);
    let body: String = comment.body.chars().take(COMMENT_CHAR_CAP).collect();
    format!("{}[Score: {}] {}", indent, comment.score, body)
}

/// Hard cut to at most `max_bytes`, backed off to the nearest char boundary.
/// Not sentence aware; may split a line.
pub fn truncate_to_budget(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &str) -> FlatRecord {
        FlatRecord::Post(PostRecord {
            title: "Best CRM?".to_string(),
            body: body.to_string(),
            author: "op".to_string(),
            score: 12,
            url: String::new(),
            num_comments: 4,
            created_utc: 0,
            subreddit: "smallbusiness".to_string(),
        })
    }

    fn comment(body: &str, score: i64, depth: usize) -> FlatRecord {
        FlatRecord::Comment(CommentRecord {
            body: body.to_string(),
            author: "u".to_string(),
            score,
            depth,
        })
    }

    #[test]
    fn test_post_block_then_comments() {
        let text = format_records(&[
            post("Looking for advice"),
            comment("HubSpot is too pricey", 10, 0),
            comment("Agreed", 3, 1),
        ]);

        assert_eq!(
            text,
            "=== POST (r/smallbusiness) ===\n\
             Title: Best CRM?\n\
             Body: Looking for advice\n\
             Score: 12 | Comments: 4\n\
             \n\
             [Score: 10] HubSpot is too pricey\n  \
             [Score: 3] Agreed"
        );
    }

    #[test]
    fn test_empty_body_is_omitted() {
        let text = format_records(&[post("")]);
        assert!(!text.contains("Body:"));
        assert!(text.starts_with("=== POST (r/smallbusiness) ==="));
    }

    #[test]
    fn test_indentation_tracks_depth() {
        let text = format_records(&[comment("a", 1, 0), comment("b", 1, 1), comment("c", 1, 3)]);
        let indents: Vec<usize> = text
            .lines()
            .map(|line| line.len() - line.trim_start().len())
            .collect();
        assert_eq!(indents, vec![0, 2, 6]);
    }

    #[test]
    fn test_comment_body_capped() {
        let long = "é".repeat(COMMENT_CHAR_CAP + 50);
        let text = format_records(&[comment(&long, -2, 0)]);
        let body = text.strip_prefix("[Score: -2] ").unwrap();
        assert_eq!(body.chars().count(), COMMENT_CHAR_CAP);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_to_budget("hello", 10), "hello");
        assert_eq!(truncate_to_budget("hello", 3), "hel");
        // 'é' is two bytes; cutting at 3 would split the second one
        assert_eq!(truncate_to_budget("éé", 3), "é");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_records(&[]), "");
    }
}
