use std::collections::HashMap;

use log::debug;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::table::Table;

/// One box of the treemap. Names borrow from the [`Table`] they were built
/// from; the root has no name of its own.
#[derive(Debug, Default)]
pub struct DataNode<'a> {
    pub size: u64,
    /// How the `size` bytes is distributed among the children.
    pub sub_components: HashMap<&'a str, DataNode<'a>>,
    /// Row that first reached this node.
    first_row: usize,
    /// Row whose path ends here, if any. Such a node may not get children.
    leaf_row: Option<usize>,
}

impl<'a> DataNode<'a> {
    /// Group the rows of `table` by the configured level columns.
    ///
    /// Trailing empty level cells end a path early, so a symbol with only two
    /// components is a leaf at depth two. An empty cell followed by a
    /// non-empty one has no place in the tree and is rejected, and so is a
    /// path that ends at a node other rows continue below.
    pub fn from_table(table: &'a Table, config: &ReportConfig) -> Result<DataNode<'a>> {
        let levels = config
            .level_columns
            .iter()
            .map(|column| table.column(column))
            .collect::<Result<Vec<_>>>()?;
        let size_idx = table.column(&config.size_column)?;

        let mut root = DataNode::default();
        let mut path = Vec::with_capacity(levels.len());
        for (idx, record) in table.records().enumerate() {
            let row = idx + 1;

            let raw = record.get(size_idx).unwrap_or_default();
            let size = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ReportError::InvalidValue {
                    row,
                    column: config.size_column.clone(),
                    reason: format!("{raw:?} is not a size: {e}"),
                })?;

            path.clear();
            let mut ended_at = None;
            for (&level, column) in levels.iter().zip(&config.level_columns) {
                let value = record.get(level).unwrap_or_default();
                match (value.is_empty(), ended_at) {
                    (true, None) => ended_at = Some(column),
                    (true, Some(_)) => {}
                    (false, None) => path.push(value),
                    (false, Some(empty)) => {
                        return Err(ReportError::InvalidValue {
                            row,
                            column: column.clone(),
                            reason: format!("{value:?} follows an empty value in column {empty:?}"),
                        })
                    }
                }
            }

            // Every node's size is bounded by the root's.
            root.size
                .checked_add(size)
                .ok_or_else(|| ReportError::InvalidValue {
                    row,
                    column: config.size_column.clone(),
                    reason: format!("total size overflows after adding {size}"),
                })?;

            if size == 0 {
                debug!("row {row} ({}) has size 0", path.join("/"));
            }
            root.insert(&path, size, row, 0)
                .map_err(|(depth, other)| ReportError::LeafWithChildren {
                    row,
                    other,
                    path: std::iter::once(config.root_label.as_str())
                        .chain(path[..depth].iter().copied())
                        .collect::<Vec<_>>()
                        .join("/"),
                })?;
        }

        Ok(root)
    }

    /// On conflict, returns the depth of the offending node and the other
    /// row involved.
    fn insert(
        &mut self,
        path: &[&'a str],
        size: u64,
        row: usize,
        depth: usize,
    ) -> std::result::Result<(), (usize, usize)> {
        match path.split_first() {
            None => {
                if let Some(other) = self.sub_components.values().map(|c| c.first_row).min() {
                    return Err((depth, other));
                }
                self.leaf_row.get_or_insert(row);
            }
            Some((&first, rest)) => {
                if let Some(other) = self.leaf_row {
                    return Err((depth, other));
                }
                self.sub_components
                    .entry(first)
                    .or_insert_with(|| DataNode {
                        first_row: row,
                        ..DataNode::default()
                    })
                    .insert(rest, size, row, depth + 1)?;
            }
        }
        self.size += size;
        Ok(())
    }

    /// Children, biggest first. Equal sizes are ordered by name so the same
    /// input always yields the same picture.
    pub fn sorted_children(&self) -> Vec<(&'a str, &DataNode<'a>)> {
        let mut children = self
            .sub_components
            .iter()
            .map(|(&name, node)| (name, node))
            .collect::<Vec<_>>();
        children.sort_by(|(a_name, a), (b_name, b)| b.size.cmp(&a.size).then(a_name.cmp(b_name)));
        children
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn build(table: &Table) -> Result<DataNode<'_>> {
        DataNode::from_table(table, &ReportConfig::default())
    }

    #[test]
    fn aggregates_shared_prefix() {
        let t = table("1,2,3,4,size\nA,X,Y,Z,10\nA,X,Y,W,5\n");
        let root = build(&t).unwrap();
        assert_eq!(root.size, 15);
        let a = &root.sub_components["A"];
        assert_eq!(a.size, 15);
        let y = &a.sub_components["X"].sub_components["Y"];
        assert_eq!(y.size, 15);
        assert_eq!(y.sub_components["Z"].size, 10);
        assert_eq!(y.sub_components["W"].size, 5);
        assert!(y.sub_components["W"].is_leaf());
    }

    #[test]
    fn root_size_is_sum_of_size_column() {
        let t = table(
            "extra,1,2,3,4,size\n\
             q,std,fmt,Debug,fmt,120\n\
             q,std,fmt,Display,fmt,30\n\
             q,core,ptr,drop_in_place,h123,7\n\
             q,alloc,vec,Vec,push,1000\n",
        );
        let root = build(&t).unwrap();
        assert_eq!(root.size, 120 + 30 + 7 + 1000);
        let children_total: u64 = root.sub_components.values().map(|n| n.size).sum();
        assert_eq!(children_total, root.size);
    }

    #[test]
    fn duplicate_paths_are_summed() {
        let t = table("1,2,3,4,size\nA,B,C,D,1\nA,B,C,D,2\n");
        let root = build(&t).unwrap();
        let d = &root.sub_components["A"].sub_components["B"].sub_components["C"].sub_components["D"];
        assert_eq!(d.size, 3);
    }

    #[test]
    fn trailing_empty_levels_end_the_path() {
        let t = table("1,2,3,4,size\nmain,,,,4\nstd,rt,,,6\n");
        let root = build(&t).unwrap();
        assert_eq!(root.size, 10);
        assert!(root.sub_components["main"].is_leaf());
        assert_eq!(root.sub_components["std"].sub_components["rt"].size, 6);
        assert!(root.sub_components["std"].sub_components["rt"].is_leaf());
    }

    #[test]
    fn hole_in_path_is_rejected() {
        let t = table("1,2,3,4,size\nA,X,Y,Z,1\nA,,Y,Z,1\n");
        let err = build(&t).unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidValue { row: 2, ref column, .. } if column == "3"
        ));
    }

    #[test]
    fn leaf_row_cannot_also_have_children() {
        let t = table("1,2,3,4,size\nA,,,,90\nA,X,,,10\nB,,,,100\n");
        let err = build(&t).unwrap_err();
        assert!(
            matches!(
                err,
                ReportError::LeafWithChildren { row: 2, other: 1, ref path } if path == "functions/A"
            ),
            "{err}"
        );
    }

    #[test]
    fn children_cannot_be_followed_by_a_leaf_row() {
        let t = table("1,2,3,4,size\nA,X,Y,,10\nA,X,Z,,5\nA,X,,,1\n");
        let err = build(&t).unwrap_err();
        assert!(
            matches!(
                err,
                ReportError::LeafWithChildren { row: 3, other: 1, ref path } if path == "functions/A/X"
            ),
            "{err}"
        );
    }

    #[test]
    fn row_without_levels_conflicts_with_the_rest() {
        let t = table("1,2,3,4,size\nA,X,,,10\n,,,,4\n");
        let err = build(&t).unwrap_err();
        assert!(
            matches!(
                err,
                ReportError::LeafWithChildren { row: 2, other: 1, ref path } if path == "functions"
            ),
            "{err}"
        );

        let t = table("1,2,3,4,size\n,,,,4\nA,X,,,10\n");
        assert!(matches!(
            build(&t),
            Err(ReportError::LeafWithChildren { row: 2, other: 1, .. })
        ));
    }

    #[test]
    fn total_size_overflow_is_rejected() {
        let t = table("1,2,3,4,size\nA,,,,18446744073709551615\nB,,,,1\n");
        let err = build(&t).unwrap_err();
        assert!(
            matches!(
                err,
                ReportError::InvalidValue { row: 2, ref column, .. } if column == "size"
            ),
            "{err}"
        );
    }

    #[test]
    fn bad_size_is_rejected() {
        let t = table("1,2,3,4,size\nA,X,Y,Z,ten\n");
        let err = build(&t).unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidValue { row: 1, ref column, .. } if column == "size"
        ));
    }

    #[test]
    fn each_required_column_is_checked() {
        for missing in ["1", "2", "3", "4", "size"] {
            let header = ["1", "2", "3", "4", "size"]
                .into_iter()
                .filter(|c| *c != missing)
                .collect::<Vec<_>>()
                .join(",");
            let t = table(&format!("{header}\n"));
            let err = build(&t).unwrap_err();
            assert!(
                matches!(err, ReportError::MissingColumn(ref name) if name == missing),
                "{err}"
            );
        }
    }

    #[test]
    fn empty_table_gives_empty_root() {
        let t = table("1,2,3,4,size\n");
        let root = build(&t).unwrap();
        assert_eq!(root.size, 0);
        assert!(root.is_leaf());
    }

    #[test]
    fn children_are_sorted_by_size_then_name() {
        let t = table("1,2,3,4,size\nb,,,,5\na,,,,5\nc,,,,9\n");
        let root = build(&t).unwrap();
        let names: Vec<_> = root.sorted_children().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
