use crate::graph::GraphStats;
use crate::linker::LinkerStats;
use crate::storage::DbStats;
use crate::ui::Icons;
use crate::RelationKind;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct LinkerRow {
    #[tabled(rename = "Linker")]
    name: &'static str,
    #[tabled(rename = "Total")]
    total: usize,
    #[tabled(rename = "Resolved")]
    resolved: usize,
    #[tabled(rename = "Ambiguous")]
    ambiguous: usize,
    #[tabled(rename = "Unresolved")]
    unresolved: usize,
    #[tabled(rename = "Rejected")]
    rejected: usize,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }

    fn add_relations(&mut self, counts: &[(RelationKind, usize)]) {
        for (relation, count) in counts {
            self.add_row(&format!("  {}", relation), count);
        }
    }
}

/// Node and edge counts of a freshly built graph
pub fn graph_table(stats: &GraphStats, duplicates_removed: usize) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row(&format!("{} Files", Icons::FILE), stats.files);
    builder.add_row(&format!("{} Classes", Icons::CLASS), stats.classes);
    builder.add_row(&format!("{} Functions", Icons::FUNCTION), stats.functions);
    builder.add_row(&format!("{} Edges", Icons::LINK), stats.total_edges);
    builder.add_relations(&stats.edges_by_relation);
    if duplicates_removed > 0 {
        builder.add_row("Duplicates removed", duplicates_removed);
    }
    builder.build()
}

pub fn db_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row(&format!("{} Files", Icons::FILE), stats.files);
    builder.add_row(&format!("{} Classes", Icons::CLASS), stats.classes);
    builder.add_row(&format!("{} Functions", Icons::FUNCTION), stats.functions);
    builder.add_row(&format!("{} Edges", Icons::LINK), stats.edges);
    builder.add_relations(&stats.edges_by_relation);
    builder.build()
}

pub fn linker_table(linkers: &[LinkerStats]) -> String {
    let rows: Vec<LinkerRow> = linkers
        .iter()
        .map(|stats| LinkerRow {
            name: stats.name,
            total: stats.total,
            resolved: stats.resolved,
            ambiguous: stats.ambiguous,
            unresolved: stats.unresolved,
            rejected: stats.rejected,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SemanticGraph;

    #[test]
    fn test_empty_builder() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_graph_table_lists_every_relation() {
        let table = graph_table(&SemanticGraph::new().stats(), 3);
        for relation in RelationKind::all() {
            assert!(table.contains(relation.as_str()));
        }
        assert!(table.contains("Duplicates removed"));
        assert!(table.contains(Icons::CLASS));
        assert!(table.contains(Icons::FUNCTION));
    }

    #[test]
    fn test_linker_table() {
        let mut stats = LinkerStats::new("Imports");
        stats.total = 4;
        stats.resolved = 3;
        let table = linker_table(&[stats]);
        assert!(table.contains("Imports"));
        assert!(table.contains("Resolved"));
    }
}
