// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text and Word-compatible HTML exports.

/// Plain UTF-8 text (`.txt`).
pub fn export_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// HTML that Word opens as a document, saved with a `.doc` extension.
///
/// Each non-empty line becomes a paragraph; blank lines become empty
/// paragraphs so vertical spacing survives.
pub fn export_word_html(title: &str, text: &str) -> Vec<u8> {
    let mut body = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        if line.trim().is_empty() {
            body.push_str("<p>&nbsp;</p>\n");
        } else {
            body.push_str("<p>");
            body.push_str(&escape_html(line));
            body.push_str("</p>\n");
        }
    }

    format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\n\
         <head><meta charset='utf-8'><title>{title}</title></head>\n\
         <body style=\"font-family: Calibri, Arial, sans-serif; font-size: 11pt;\">\n\
         {body}</body>\n</html>\n",
        title = escape_html(title),
    )
    .into_bytes()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
