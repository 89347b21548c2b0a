use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse {} as CSV: {source}", .path.display())]
    Parse { path: PathBuf, source: csv::Error },
    #[error("Invalid value in row {row}, column {column:?}: {reason}")]
    InvalidValue {
        /// 1-based data row, not counting the header.
        row: usize,
        column: String,
        reason: String,
    },
    #[error("Row {row} conflicts with row {other}: {path:?} cannot be both a leaf and a parent")]
    LeafWithChildren {
        row: usize,
        other: usize,
        path: String,
    },
    #[error("Required column {0:?} not found in header")]
    MissingColumn(String),
    #[error("Treemap template is invalid: {0}")]
    Template(Box<handlebars::TemplateError>),
    #[error("Could not render treemap: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("Could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
