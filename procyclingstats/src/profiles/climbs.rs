use super::{has_heading, Extractor, PageProfile, Profile};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::table::TableParser;
use crate::util::{parse_float, parse_int};
use crate::value::{select_fields, RowList, Value};

pub const CLIMBS: FieldSet = FieldSet::new(&[
    "climb_name",
    "climb_url",
    "length",
    "steepness",
    "top",
    "km_before_finnish",
]);

/// Climbs of a race, `race/{id}/{year}/route/climbs`
pub struct RaceClimbs {
    reference: Reference,
    document: Document,
}

fn float_cell(s: &str) -> Value {
    parse_float(s).map(Value::Float).unwrap_or(Value::Null)
}

impl RaceClimbs {
    pub fn climbs(&self, fields: &[&str]) -> Result<RowList> {
        let fields = CLIMBS.select(fields)?;
        let table = match self.document.after_heading("climbs")? {
            Some(t) if t.value().name() == "table" => t,
            _ => self.document.first("table")?,
        };
        let mut tp = TableParser::new(table)?;
        let parsed: Vec<&str> = fields.iter().copied().filter(|f| f.starts_with("climb_")).collect();
        tp.parse(&parsed)?;

        for field in &fields {
            match *field {
                "length" => tp.extend_with_column("length", "length", float_cell)?,
                "steepness" => tp.extend_with_column("steepness", "steepness", float_cell)?,
                "top" => tp.extend_with_column("top", "top", |s| {
                    parse_int(s.split_whitespace().next().unwrap_or("")).map(Value::Int).unwrap_or(Value::Null)
                })?,
                "km_before_finnish" => tp.extend_with_column("km_before_finnish", "km before", float_cell)?,
                _ => {}
            }
        }
        Ok(select_fields(tp.table(), &fields))
    }
}

impl PageProfile for RaceClimbs {
    const PROFILE: Profile = Profile::RaceClimbs;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        vec![Extractor::required("climbs", |c: &RaceClimbs| c.climbs(&[]).map(Value::from))]
    }

    fn check_content(&self) -> Result<()> {
        if has_heading(&self.document, "climbs")? {
            Ok(())
        } else {
            Err(Error::value("invalid page: no climbs heading"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_without_climbs_heading_is_invalid() {
        let html = "<html><body><h2>Route</h2><table></table></body></html>";
        assert!(matches!(
            RaceClimbs::new("race/tour-de-france/2022/route/climbs", html),
            Err(Error::Value(_))
        ));
    }
}
