//! Intermediate representation shared by the image parser and the PDF renderer.

mod document;
mod elements;

pub use document::*;
pub use elements::*;
