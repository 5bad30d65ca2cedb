//! HTML rendering of comparison summaries.

mod html;

pub use html::render_comparison_html;
