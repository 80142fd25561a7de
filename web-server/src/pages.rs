//! Minimal HTML views. The interactive front end lives outside this crate;
//! these pages only bootstrap it.

use serde_json::Value;

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Reddit Insights</title>
</head>
<body>
<main id="app">
<h1>Reddit Insights</h1>
<p>POST a thread URL to <code>/analyze</code> or a subreddit name to <code>/scan-subreddit</code>.</p>
</main>
</body>
</html>
"#;

/// Serializes `payload` for inline embedding in a `<script>` element.
/// `<` is escaped so the payload cannot close the element early.
pub fn embed_json(payload: &Value) -> String {
    payload.to_string().replace('<', "\\u003c")
}

pub fn shared_page(share_id: &str, payload: &Value) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Shared analysis {share_id}</title>
</head>
<body>
<main id="app" data-share-id="{share_id}"></main>
<script id="shared-data" type="application/json">{data}</script>
</body>
</html>
"#,
        data = embed_json(payload),
    )
}
