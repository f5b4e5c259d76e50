//! Tabular extraction.
//!
//! A [`TableParser`] wraps a table-shaped subtree: a `<table>` whose rows are
//! `tr` with `td` cells, or a `<ul>` whose rows are `li` with `div` cells.
//! Every requested field is handed to a column parser returning one value per
//! row, and the columns are zipped into records.

use std::collections::{HashMap, HashSet};

use log::{trace, warn};
use scraper::ElementRef;

use crate::document::{child_elements, scoped, scoped_first, text_of};
use crate::error::{Error, Result};
use crate::time::make_times_absolute;
use crate::value::{Row, RowList, Value};

mod columns;
mod ttt;

pub use columns::{column_parser, ColumnParser, COLUMN_NAMES};
pub(crate) use columns::{
    find_link, flag_code, profile_icon_class, rank_value, relative_href, status_value, table_date,
};
pub use ttt::{parse_ttt_table, TTT_FIELDS};

/// Reference to a column: a position (negative counts from the end) or a
/// header matched by case-insensitive substring
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'s> {
    Index(i64),
    Header(&'s str),
}

impl From<i64> for ColumnRef<'_> {
    fn from(i: i64) -> Self {
        ColumnRef::Index(i)
    }
}

impl<'s> From<&'s str> for ColumnRef<'s> {
    fn from(h: &'s str) -> Self {
        ColumnRef::Header(h)
    }
}

pub struct TableParser<'a> {
    rows: Vec<ElementRef<'a>>,
    cell_tag: &'static str,
    header: Vec<String>,
    table: RowList,
}

impl<'a> TableParser<'a> {
    pub fn new(element: ElementRef<'a>) -> Result<Self> {
        let element = match element.value().name() {
            "table" | "ul" | "ol" => element,
            _ => match scoped_first(element, "table")? {
                Some(table) => table,
                None => scoped_first(element, "ul")?
                    .ok_or_else(|| Error::unexpected("no table or list in the given element"))?,
            },
        };

        let (rows, cell_tag, header) = if element.value().name() == "table" {
            let mut header: Vec<String> = scoped(element, "thead th")?
                .into_iter()
                .map(|th| text_of(th, None).to_lowercase())
                .collect();
            let mut rows = Vec::new();
            for tr in scoped(element, "tr")? {
                let has_td = child_elements(tr).any(|c| c.value().name() == "td");
                if has_td {
                    rows.push(tr);
                } else if header.is_empty() {
                    header = child_elements(tr)
                        .filter(|c| c.value().name() == "th")
                        .map(|th| text_of(th, None).to_lowercase())
                        .collect();
                }
            }
            (rows, "td", header)
        } else {
            let rows = child_elements(element)
                .filter(|c| c.value().name() == "li")
                .collect();
            (rows, "div", Vec::new())
        };

        trace!("table with {} rows, header {:?}", rows.len(), header);
        Ok(TableParser {
            rows,
            cell_tag,
            header,
            table: Vec::new(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_elements(&self) -> &[ElementRef<'a>] {
        &self.rows
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn cells(&self, row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        child_elements(row)
            .filter(|c| c.value().name() == self.cell_tag)
            .collect()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        let header = header.to_lowercase();
        self.header.iter().position(|h| h.contains(&header))
    }

    /// Resolves the first header of `candidates` present in the table
    pub fn find_column(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|c| self.column_index(c))
    }

    fn resolve(&self, column: ColumnRef, cell_count: usize) -> Result<Option<usize>> {
        Ok(match column {
            ColumnRef::Index(i) if i >= 0 => Some(i as usize).filter(|i| *i < cell_count),
            ColumnRef::Index(i) => {
                let back = i.unsigned_abs() as usize;
                cell_count.checked_sub(back)
            }
            ColumnRef::Header(h) => Some(self.column_index(h).ok_or_else(|| {
                Error::unexpected(format!("table has no {:?} column (header {:?})", h, self.header))
            })?)
            .filter(|i| *i < cell_count),
        })
    }

    /// Cell `column` of every row, or `None` for rows too short to have it
    pub fn column_cells(&self, column: ColumnRef) -> Result<Vec<Option<ElementRef<'a>>>> {
        let mut res = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let cells = self.cells(*row);
            res.push(self.resolve(column, cells.len())?.map(|i| cells[i]));
        }
        Ok(res)
    }

    /// Cell with class `class` in every row
    pub fn class_cells(&self, class: &str) -> Vec<Option<ElementRef<'a>>> {
        self.rows
            .iter()
            .map(|row| {
                self.cells(*row)
                    .into_iter()
                    .find(|c| c.value().classes().any(|cl| cl == class))
            })
            .collect()
    }

    /// Cells found by class first, then by header
    pub fn cells_by(&self, classes: &[&str], headers: &[&str]) -> Result<Vec<Option<ElementRef<'a>>>> {
        for class in classes {
            let cells = self.class_cells(class);
            if cells.iter().any(Option::is_some) {
                return Ok(cells);
            }
        }
        match self.find_column(headers) {
            Some(i) => self.column_cells(ColumnRef::Index(i as i64)),
            None if self.rows.is_empty() => Ok(Vec::new()),
            None => Err(Error::unexpected(format!(
                "no column matching {:?} / {:?} (header {:?})",
                classes, headers, self.header
            ))),
        }
    }

    /// Reads one cell per row and applies `transform` to its text. Rows
    /// lacking the cell give null.
    pub fn parse_extra_column<'s, F>(&self, column: impl Into<ColumnRef<'s>>, transform: F) -> Result<Vec<Value>>
    where
        F: Fn(&str) -> Value,
    {
        Ok(self
            .column_cells(column.into())?
            .into_iter()
            .map(|cell| match cell {
                Some(cell) => transform(&text_of(cell, None)),
                None => Value::Null,
            })
            .collect())
    }

    /// Parses `fields` into records, replacing any previously parsed table
    pub fn parse(&mut self, fields: &[&str]) -> Result<()> {
        let row_count = self.row_count();
        let mut columns = Vec::with_capacity(fields.len());

        for field in fields {
            let parser = column_parser(field)
                .ok_or_else(|| Error::value(format!("unknown table field {:?}", field)))?;
            let values = parser(self)?;
            if values.len() != row_count {
                return Err(Error::unexpected(format!(
                    "field {:?} gave {} values for {} rows",
                    field,
                    values.len(),
                    row_count
                )));
            }
            trace!("parsed column {} ({} values)", field, values.len());
            columns.push((*field, values));
        }

        if let Some((_, times)) = columns.iter_mut().find(|(f, _)| *f == "time") {
            make_times_absolute(times)?;
        }

        let mut table = vec![Row::new(); row_count];
        for (field, values) in columns {
            for (row, value) in table.iter_mut().zip(values) {
                row.insert(field, value);
            }
        }
        self.table = table;
        Ok(())
    }

    /// Appends a computed column. On an empty table it seeds one row per value.
    pub fn extend(&mut self, field: &str, values: Vec<Value>) -> Result<()> {
        if self.table.is_empty() {
            self.table = values.into_iter().map(|v| [(field, v)].into_iter().collect()).collect();
            return Ok(());
        }
        if values.len() != self.table.len() {
            return Err(Error::unexpected(format!(
                "extra column {:?} has {} values for {} rows",
                field,
                values.len(),
                self.table.len()
            )));
        }
        for (row, value) in self.table.iter_mut().zip(values) {
            row.insert(field, value);
        }
        Ok(())
    }

    /// [`parse_extra_column`](Self::parse_extra_column) followed by [`extend`](Self::extend)
    pub fn extend_with_column<'s, F>(&mut self, field: &str, column: impl Into<ColumnRef<'s>>, transform: F) -> Result<()>
    where
        F: Fn(&str) -> Value,
    {
        let values = self.parse_extra_column(column, transform)?;
        self.extend(field, values)
    }

    pub fn table(&self) -> &RowList {
        &self.table
    }

    pub fn into_table(self) -> RowList {
        self.table
    }
}

fn key_of(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        v => Some(v.to_string()),
    }
}

/// Merges `other` into `primary` by `key`.
///
/// Primary order is kept and primary values win on collisions. Rows of
/// `primary` without a partner fail the join, or are dropped when
/// `skip_missing` is set. A key repeated in `primary` is an unexpected error;
/// in `other` the first occurrence wins.
pub fn join_tables(primary: &[Row], other: &[Row], key: &str, skip_missing: bool) -> Result<RowList> {
    let mut index: HashMap<String, &Row> = HashMap::new();
    for row in other {
        if let Some(k) = key_of(row, key) {
            index.entry(k).or_insert(row);
        }
    }

    let mut seen = HashSet::new();
    let mut res = Vec::with_capacity(primary.len());
    for row in primary {
        if !row.contains_key(key) {
            return Err(Error::value(format!("join key {:?} missing from primary table", key)));
        }
        let partner = match key_of(row, key) {
            Some(k) => {
                if !seen.insert(k.clone()) {
                    return Err(Error::unexpected(format!("duplicate join key {:?}", k)));
                }
                index.get(&k).copied()
            }
            None => None,
        };

        match partner {
            Some(partner) => {
                let mut merged = row.clone();
                for (k, v) in partner.iter() {
                    if !merged.contains_key(k) {
                        merged.insert(k, v.clone());
                    }
                }
                res.push(merged);
            }
            None if skip_missing => {
                warn!("no {} partner for {}, dropping row", key, row);
            }
            None => {
                return Err(Error::value(format!("no {} partner for row {}", key, row)));
            }
        }
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    const RESULTS: &str = r#"<table class="results">
        <thead><tr><th>Rnk</th><th>Rider</th><th>Age</th><th>Team</th><th>UCI</th><th>Pnt</th><th>Time</th></tr></thead>
        <tbody>
        <tr><td>1</td><td><span class="flag si"></span> <a href="rider/tadej-pogacar">POGAČAR Tadej</a></td><td class="age">23</td><td><a href="team/uae-team-emirates-2022">UAE Team Emirates</a></td><td class="uci_pnt">120</td><td class="pnt">100</td><td class="time">4:20:15</td></tr>
        <tr><td>2</td><td><span class="flag dk"></span> <a href="rider/jonas-vingegaard-rasmussen">VINGEGAARD Jonas</a></td><td class="age">25</td><td><a href="team/jumbo-visma-2022">Jumbo-Visma</a></td><td class="uci_pnt">50</td><td class="pnt">70</td><td class="time">+ 0:00:10</td></tr>
        <tr><td>DNF</td><td><span class="flag be"></span> <a href="rider/wout-van-aert">VAN AERT Wout</a></td><td class="age">27</td><td><a href="team/jumbo-visma-2022">Jumbo-Visma</a></td><td class="uci_pnt"></td><td class="pnt"></td><td class="time">-</td></tr>
        </tbody></table>"#;

    fn parsed(fields: &[&str]) -> Result<RowList> {
        let doc = Document::parse(RESULTS);
        let mut tp = TableParser::new(doc.first("table")?)?;
        tp.parse(fields)?;
        Ok(tp.into_table())
    }

    #[test]
    fn test_parse_columns() {
        let rows = parsed(&["rank", "status", "rider_name", "nationality", "age", "team_url", "uci_points", "pcs_points"]).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("rank"), Some(&Value::Int(1)));
        assert_eq!(rows[2].get("rank"), Some(&Value::Null));
        assert_eq!(rows[0].get("status"), Some(&Value::text("DF")));
        assert_eq!(rows[2].get("status"), Some(&Value::text("DNF")));
        assert_eq!(rows[1].get("rider_name"), Some(&Value::text("VINGEGAARD Jonas")));
        assert_eq!(rows[1].get("nationality"), Some(&Value::text("DK")));
        assert_eq!(rows[2].get("age"), Some(&Value::Int(27)));
        assert_eq!(rows[0].get("team_url"), Some(&Value::text("team/uae-team-emirates-2022")));
        assert_eq!(rows[0].get("uci_points"), Some(&Value::Int(120)));
        assert_eq!(rows[2].get("pcs_points"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_records_have_requested_keys() {
        let fields = ["rider_url", "rank"];
        for row in parsed(&fields).unwrap() {
            assert_eq!(row.keys().collect::<Vec<_>>(), fields.to_vec());
        }
    }

    #[test]
    fn test_time_is_made_absolute() {
        let rows = parsed(&["time"]).unwrap();
        let times: Vec<_> = rows.iter().map(|r| r.get("time").cloned().unwrap()).collect();
        assert_eq!(times, vec![Value::text("4:20:15"), Value::text("4:20:25"), Value::text("4:20:25")]);
    }

    #[test]
    fn test_unknown_field() {
        assert!(matches!(parsed(&["rank", "shoe_size"]), Err(Error::Value(_))));
    }

    #[test]
    fn test_extra_columns() {
        let doc = Document::parse(RESULTS);
        let mut tp = TableParser::new(doc.first("table").unwrap()).unwrap();
        tp.parse(&["rider_url"]).unwrap();
        tp.extend_with_column("last", -1i64, |s| Value::text(s)).unwrap();
        tp.extend_with_column("age_text", "AGE", |s| Value::text(s)).unwrap();
        assert_eq!(tp.table()[1].get("last"), Some(&Value::text("+ 0:00:10")));
        assert_eq!(tp.table()[0].get("age_text"), Some(&Value::text("23")));
        assert!(matches!(tp.parse_extra_column("Bonis", |s| Value::text(s)), Err(Error::Unexpected(_))));
        assert!(matches!(tp.extend("short", vec![Value::Null]), Err(Error::Unexpected(_))));
    }

    #[test]
    fn test_extend_seeds_empty_table() {
        let doc = Document::parse(RESULTS);
        let mut tp = TableParser::new(doc.first("table").unwrap()).unwrap();
        tp.extend("n", vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(tp.table().len(), 2);
    }

    #[test]
    fn test_list_rows() {
        let doc = Document::parse(
            r#"<ul class="list"><li><div>2023</div><div><a href="team/uae-2023">UAE</a></div></li>
               <li><div>2022</div><div><a href="team/uae-2022">UAE</a></div></li></ul>"#,
        );
        let mut tp = TableParser::new(doc.first("ul").unwrap()).unwrap();
        tp.parse(&["season", "team_url"]).unwrap();
        assert_eq!(tp.table()[1].get("season"), Some(&Value::Int(2022)));
        assert_eq!(tp.table()[0].get("team_url"), Some(&Value::text("team/uae-2023")));
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_join_preserves_primary_order() {
        let primary = vec![
            row(&[("rider_url", Value::text("rider/b")), ("points", Value::Int(10))]),
            row(&[("rider_url", Value::text("rider/a")), ("points", Value::Int(5))]),
        ];
        let other = vec![
            row(&[("rider_url", Value::text("rider/a")), ("age", Value::Int(30)), ("points", Value::Int(99))]),
            row(&[("rider_url", Value::text("rider/b")), ("age", Value::Int(20))]),
        ];
        let joined = join_tables(&primary, &other, "rider_url", false).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].get("rider_url"), Some(&Value::text("rider/b")));
        assert_eq!(joined[0].get("age"), Some(&Value::Int(20)));
        // primary wins on collision
        assert_eq!(joined[1].get("points"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_join_missing_partner() {
        let primary = vec![
            row(&[("rider_url", Value::text("rider/a"))]),
            row(&[("rider_url", Value::text("rider/c"))]),
        ];
        let other = vec![row(&[("rider_url", Value::text("rider/a")), ("age", Value::Int(30))])];
        assert!(matches!(join_tables(&primary, &other, "rider_url", false), Err(Error::Value(_))));
        let joined = join_tables(&primary, &other, "rider_url", true).unwrap();
        assert_eq!(joined.len(), 1);
        assert!(matches!(join_tables(&primary, &other, "team_url", true), Err(Error::Value(_))));
    }

    #[test]
    fn test_join_duplicate_primary_key() {
        let primary = vec![
            row(&[("rider_url", Value::text("rider/a"))]),
            row(&[("rider_url", Value::text("rider/a"))]),
        ];
        assert!(matches!(join_tables(&primary, &primary, "rider_url", false), Err(Error::Unexpected(_))));
    }
}
