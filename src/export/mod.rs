//! Word-processor export.
//!
//! [`docx`] writes WordprocessingML packages; [`layout`] arranges projects
//! into standard manuscript format on top of it.

use thiserror::Error;

pub mod docx;
pub mod layout;

pub use docx::{Align, Document, Paragraph};
pub use layout::{manuscript_document, sample_chapters_document, text_document};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build document package: {0}")]
    Package(#[from] zip::result::ZipError),
}
