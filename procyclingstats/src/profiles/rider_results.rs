use super::{has_heading, Extractor, PageProfile, Profile};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::table::{rank_value, status_value, TableParser};
use crate::util::{parse_float, parse_int};
use crate::value::{select_fields, RowList, Value};

pub const RESULTS: FieldSet = FieldSet::new(&[
    "date",
    "rank",
    "status",
    "stage_name",
    "stage_url",
    "class",
    "distance",
    "pcs_points",
    "uci_points",
]);
pub const FINAL_N_KM: FieldSet = FieldSet::new(&[
    "date",
    "rank",
    "status",
    "stage_name",
    "stage_url",
    "class",
    "vertical_meters",
    "average_percentage",
]);

/// Results of a rider, `rider/{id}/results` or the final kilometres
/// analysis at `rider/{id}/results/final-5k-analysis`
pub struct RiderResults {
    reference: Reference,
    document: Document,
}

impl RiderResults {
    fn is_final_n_km(&self) -> bool {
        self.reference.path().ends_with("/final-5k-analysis")
    }

    /// Parses the results table. The first column is the date, so the rank
    /// and status come from the "result" column.
    fn parse_results(&self, fields: &[&str]) -> Result<RowList> {
        let table = self.document.first("table.results")?;
        let mut tp = TableParser::new(table)?;
        let parsed: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|f| !matches!(*f, "rank" | "status" | "vertical_meters" | "average_percentage"))
            .collect();
        tp.parse(&parsed)?;

        for field in fields {
            match *field {
                "rank" => tp.extend_with_column("rank", "result", rank_value)?,
                "status" => tp.extend_with_column("status", "result", status_value)?,
                "vertical_meters" => tp.extend_with_column("vertical_meters", "vert", |s| {
                    Value::from(parse_int(s.split_whitespace().next().unwrap_or("")))
                })?,
                "average_percentage" => tp.extend_with_column("average_percentage", "avg", |s| {
                    Value::from(parse_float(s))
                })?,
                _ => {}
            }
        }
        Ok(select_fields(tp.table(), fields))
    }

    pub fn results(&self, fields: &[&str]) -> Result<RowList> {
        let fields = RESULTS.select(fields)?;
        if self.is_final_n_km() {
            return Err(Error::expected("full results aren't on the final kilometres page"));
        }
        self.parse_results(&fields)
    }

    pub fn final_n_km_analysis(&self, fields: &[&str]) -> Result<RowList> {
        let fields = FINAL_N_KM.select(fields)?;
        if !self.is_final_n_km() {
            return Err(Error::expected("final kilometres analysis is on its own page"));
        }
        self.parse_results(&fields)
    }
}

impl PageProfile for RiderResults {
    const PROFILE: Profile = Profile::RiderResults;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<RiderResults>;
        vec![
            E::optional("results", |r| r.results(&[]).map(Value::from)),
            E::optional("final_n_km_analysis", |r| r.final_n_km_analysis(&[]).map(Value::from)),
        ]
    }

    fn check_content(&self) -> Result<()> {
        let expected = if self.is_final_n_km() {
            "top results final 5k analysis"
        } else {
            "all results"
        };
        if has_heading(&self.document, expected)? {
            Ok(())
        } else {
            Err(Error::value(format!("invalid page: no {:?} header", expected)))
        }
    }
}
