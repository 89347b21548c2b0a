use std::path::PathBuf;

use crate::table::Row;

/// Space reserved around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Everything that shapes a report. The binary only ever uses
/// [`ReportConfig::default`]; there are no flags or config files.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Label of the synthetic node every row hangs off.
    pub root_label: String,
    /// Hierarchy columns, outermost first.
    pub level_columns: Vec<String>,
    /// Leaf weight column. Also shown as hover data.
    pub size_column: String,
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    /// Height of the label band at the top of every box that has children.
    pub header_height: f64,
    /// Gap between a box's border and its children.
    pub padding: f64,
    pub output_path: PathBuf,
    /// Rows this rejects are dropped before the hierarchy is built. Off
    /// unless set.
    pub row_filter: Option<fn(Row<'_>) -> bool>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root_label: "functions".to_string(),
            level_columns: ["1", "2", "3", "4"].map(String::from).to_vec(),
            size_column: "size".to_string(),
            width: 700,
            height: 500,
            margin: Margin {
                top: 50,
                left: 25,
                right: 25,
                bottom: 25,
            },
            header_height: 16.0,
            padding: 3.0,
            output_path: PathBuf::from("output.svg"),
            row_filter: None,
        }
    }
}
