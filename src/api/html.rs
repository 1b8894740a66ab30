//! HTML rendering of book lists for the display layer.

use std::fmt::Write;

use crate::recommend::domain::{BookView, Recommendation, REDUCE_REQUEST_NOTICE};

const PAGE_BACKGROUND: &str = "#508C9B";
const CARD_BACKGROUND: &str = "#134B70";

/// Escape text for use in element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// One card per book, in order.
pub fn render_books(books: &[BookView]) -> String {
    let mut out = String::new();
    for book in books {
        let title = escape(&book.title);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            concat!(
                "<div style=\"display: flex; align-items: center; margin-bottom: 20px; ",
                "box-shadow: 0 4px 8px 0 rgba(0,0,0,0.2); padding: 10px; border-radius: 10px; ",
                "background-color: {bg};\">\n",
                "  <img src=\"{image}\" alt=\"{title}\" style=\"width: 100px; height: 150px; ",
                "margin-right: 20px; border-radius: 5px;\">\n",
                "  <div>\n",
                "    <h4 style=\"margin: 0; padding: 0;\">{title}</h4>\n",
                "    <p style=\"margin: 0; padding: 0;\"><b>Author:</b> {author}</p>\n",
                "    <p style=\"margin: 0; padding: 0;\"><b>Year:</b> {year}</p>\n",
                "    <p style=\"margin: 0; padding: 0;\"><b>ISBN:</b> {isbn}</p>\n",
                "    <p style=\"margin: 0; padding: 0;\"><b>Average Rating:</b> {avg:.2}</p>\n",
                "    <p style=\"margin: 0; padding: 0;\"><b>Number of Ratings:</b> {count}</p>\n",
            ),
            bg = CARD_BACKGROUND,
            image = escape(&book.image),
            title = title,
            author = escape(&book.author),
            year = escape(&book.year),
            isbn = escape(book.isbn.as_str()),
            avg = book.average_rating,
            count = book.rating_count,
        );
        if let Some(predicted) = book.predicted_rating {
            let _ = writeln!(
                out,
                "    <p style=\"margin: 0; padding: 0;\"><b>Predicted Rating:</b> {predicted:.2}</p>"
            );
        }
        out.push_str("  </div>\n</div>\n");
    }
    out
}

/// A plain notice paragraph.
pub fn render_notice(message: &str) -> String {
    format!("<p>{}</p>\n", escape(message))
}

/// Cards for a ranked result, or the reduce-your-request notice.
pub fn render_recommendation(rec: &Recommendation) -> String {
    match rec {
        Recommendation::Ranked(books) => render_books(books),
        Recommendation::InsufficientCandidates { .. } => render_notice(REDUCE_REQUEST_NOTICE),
    }
}

/// Standalone document wrapping `body` under a heading.
pub fn render_page(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body style=\"background-color: {PAGE_BACKGROUND}; color: white; font-family: sans-serif;\">\n\
         <h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}
