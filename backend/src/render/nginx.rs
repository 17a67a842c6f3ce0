//! Nginx `rewrite` directives.

use crate::models::Row;

use super::join_segments;

/// Render one `rewrite` line per accepted row, prefixed by `subdir`.
pub fn render_nginx(rows: &[Row], subdir: &str) -> String {
    let subdir = subdir.trim_matches('/');

    rows.iter()
        .filter(|r| r.is_valid_and_enabled())
        .map(|row| {
            let path = join_segments(&[subdir, row.doc_type(), row.pid()]);
            format!("rewrite /{}$ {} redirect ;\n", path, row.url())
        })
        .collect()
}
