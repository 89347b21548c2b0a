use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::{ReportError, Result};

/// Rows shown at each end of the dump before it gets elided.
const DUMP_EDGE_ROWS: usize = 5;

/// CSV contents as raw strings. Nothing is interpreted until the hierarchy is
/// built, so a table with a bad `size` value still loads and prints.
#[derive(Debug, Clone)]
pub struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

/// One record together with the header it was read under.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.record.get(idx)
    }
}

impl Table {
    pub fn load(path: &Path) -> Result<Table> {
        // Dropped at the end of this scope whether parsing succeeds or not.
        let file = File::open(path).map_err(|source| ReportError::Open {
            path: path.to_owned(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| ReportError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub(crate) fn from_reader<R: Read>(reader: R) -> csv::Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<csv::Result<Vec<_>>>()?;
        Ok(Table { headers, rows })
    }

    /// Index of the header named exactly `name`.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    pub fn records(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the rows `predicate` accepts.
    pub fn retain(&mut self, mut predicate: impl FnMut(Row<'_>) -> bool) {
        let headers = &self.headers;
        self.rows.retain(|record| predicate(Row { headers, record }));
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(
            std::iter::once(String::new()).chain(self.headers.iter().map(String::from)),
        );

        let len = self.rows.len();
        let elided = len > 2 * DUMP_EDGE_ROWS;
        for (idx, record) in self.rows.iter().enumerate() {
            if elided && idx >= DUMP_EDGE_ROWS && idx < len - DUMP_EDGE_ROWS {
                if idx == DUMP_EDGE_ROWS {
                    builder.push_record(vec!["...".to_string(); self.headers.len() + 1]);
                }
                continue;
            }
            builder.push_record(
                std::iter::once(idx.to_string()).chain(record.iter().map(String::from)),
            );
        }

        let mut table = builder.build();
        table.with(Style::blank());
        writeln!(f, "{table}")?;
        write!(f, "\n[{} rows x {} columns]", len, self.headers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn loads_rows_in_order() {
        let t = table("1,2,3,4,size\nA,X,Y,Z,10\nA,X,Y,W,5\n");
        assert_eq!(t.len(), 2);
        let sizes: Vec<_> = t.records().map(|r| &r[4]).collect();
        assert_eq!(sizes, vec!["10", "5"]);
    }

    #[test]
    fn column_lookup_is_exact() {
        let t = table("1,2,3,4,Size,size\n");
        assert_eq!(t.column("size").unwrap(), 5);
        assert!(matches!(
            t.column("SIZE"),
            Err(ReportError::MissingColumn(name)) if name == "SIZE"
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let t = table("1,2,3,4,size\n");
        assert!(t.is_empty());
        assert_eq!(t.column("4").unwrap(), 3);
    }

    #[test]
    fn ragged_record_is_a_parse_error() {
        assert!(Table::from_reader("1,2,3,4,size\nA,X,Y\n".as_bytes()).is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Table::load(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Open { ref source, .. } if source.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn retain_with_predicate() {
        let mut t = table("1,2,3,4,size\nstd,a,,,1\ncore,b,,,2\nstd,c,,,3\n");
        t.retain(|row| row.get("1") == Some("std"));
        assert_eq!(t.len(), 2);
        assert!(t.records().all(|r| &r[0] == "std"));
    }

    #[test]
    fn dump_shows_all_small_tables() {
        let dump = table("1,size\nA,10\nB,5\n").to_string();
        assert!(dump.contains("A"));
        assert!(dump.contains("B"));
        assert!(!dump.contains("..."));
        assert!(dump.ends_with("[2 rows x 2 columns]"));
    }

    #[test]
    fn dump_elides_middle_of_large_tables() {
        let mut csv = String::from("1,size\n");
        for i in 0..20 {
            csv.push_str(&format!("sym{i},{i}\n"));
        }
        let dump = table(&csv).to_string();
        assert!(dump.contains("sym4"));
        assert!(!dump.contains("sym5"));
        assert!(!dump.contains("sym14"));
        assert!(dump.contains("sym15"));
        assert!(dump.contains("..."));
        assert!(dump.ends_with("[20 rows x 2 columns]"));
    }
}
