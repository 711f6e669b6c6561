pub mod boxed_paragraph;
pub mod error_msg;
pub mod styled_label;

pub use boxed_paragraph::render_boxed_paragraph;
pub use styled_label::{button_spans, input_spans_with_placeholder, TextState};
