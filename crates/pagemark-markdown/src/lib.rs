//! `pagemark-markdown` renders Markdown with inline and display LaTeX math to styled
//! [`ratatui`] lines, and flows those lines into fixed-height columns.
//!
//! - [`render::MarkdownDocument`]: parse once, lay out at any column width.
//! - [`math::to_unicode`]: the LaTeX to Unicode conversion used for `$..$` and `$$..$$`.
//! - [`flow::ColumnFlow`]: chunk laid-out lines into the columns of a paginated surface.
//!
//! Malformed math never aborts a render; it is shown as an error marker in place and counted in
//! [`render::MarkdownDocument::math_errors`].
pub mod flow;
pub mod math;
pub mod render;

pub use flow::ColumnFlow;
pub use render::MarkdownDocument;
pub use render::RenderOptions;
