use log::warn;

use super::{info_value_nonempty, page_title, parse_table, title_flag, Extractor, PageProfile, Profile};
use crate::document::{scoped_first, text_of, Document};
use crate::error::{Error, Result};
use crate::fields::{with_helpers, FieldSet};
use crate::reference::Reference;
use crate::select::parse_select_menu;
use crate::table::{flag_code, table_date, TableParser};
use crate::util::{normalize_ws, parse_int};
use crate::value::{select_fields, RowList, Value};

pub const STAGES: FieldSet = FieldSet::new(&["date", "profile_icon", "stage_name", "stage_url", "distance"]);
pub const STAGES_WINNERS: FieldSet = FieldSet::new(&["stage_name", "rider_name", "rider_url", "nationality"]);

/// Race overview page, `race/{id}/{year}`
pub struct Race {
    reference: Reference,
    document: Document,
}

/// `YYYY-MM-DD` value of a dated info list entry
fn info_date(document: &Document, label: &str) -> Result<Value> {
    match table_date(&info_value_nonempty(document, label)?)? {
        Value::Null => Err(Error::expected(format!("no {}", label))),
        date => Ok(date),
    }
}

impl Race {
    pub fn name(&self) -> Result<String> {
        Ok(normalize_ws(&text_of(page_title(&self.document)?, None)))
    }

    pub fn year(&self) -> Result<i64> {
        self.reference
            .segments()
            .get(2)
            .and_then(|y| y.parse().ok())
            .ok_or_else(|| Error::unexpected(format!("no year in {}", self.reference.relative())))
    }

    pub fn nationality(&self) -> Result<String> {
        flag_code(title_flag(&self.document)?).ok_or_else(|| Error::expected("flag without country"))
    }

    /// Edition number, absent for cancelled editions
    pub fn edition(&self) -> Result<i64> {
        let main = self.document.first(".page-title > .main")?;
        let edition = scoped_first(main, "span.edition")?.ok_or_else(|| Error::expected("no edition"))?;
        let text = text_of(edition, None);
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        parse_int(&digits).ok_or_else(|| Error::expected(format!("no edition number in {:?}", text)))
    }

    pub fn startdate(&self) -> Result<Value> {
        info_date(&self.document, "startdate")
    }

    pub fn enddate(&self) -> Result<Value> {
        info_date(&self.document, "enddate")
    }

    pub fn category(&self) -> Result<String> {
        info_value_nonempty(&self.document, "category")
    }

    pub fn uci_tour(&self) -> Result<String> {
        info_value_nonempty(&self.document, "uci tour")
    }

    pub fn is_one_day_race(&self) -> Result<bool> {
        Ok(self.document.after_heading("stages")?.is_none())
    }

    pub fn prev_editions_select(&self) -> Result<RowList> {
        parse_select_menu(&self.document, "select.editions")
    }

    pub fn stages_select(&self) -> Result<RowList> {
        parse_select_menu(&self.document, "select.stages")
    }

    /// Stages of a stage race, empty for one day races. Rest days are left
    /// out.
    pub fn stages(&self, fields: &[&str]) -> Result<RowList> {
        let fields = STAGES.select(fields)?;
        let table = match self.document.after_heading("stages")? {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };
        let rows = parse_table(table, &with_helpers(&fields, &["stage_url"]))?;
        let stages: RowList = rows
            .into_iter()
            .filter(|r| r.get("stage_url").map_or(false, |u| !u.is_null()))
            .collect();
        Ok(select_fields(&stages, &fields))
    }

    /// Winner of every stage. A stage without a winner keeps its row with
    /// null rider fields.
    pub fn stages_winners(&self, fields: &[&str]) -> Result<RowList> {
        let fields = STAGES_WINNERS.select(fields)?;
        let table = match self.document.after_heading("stage winners")? {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };
        let mut tp = TableParser::new(table)?;
        let parsed = with_helpers(&fields, &["rider_url", "nationality"]);
        let parsed: Vec<&str> = parsed.into_iter().filter(|f| *f != "stage_name").collect();
        tp.parse(&parsed)?;
        tp.extend_with_column("stage_name", 0i64, |s| Value::text(normalize_ws(s)))?;

        let flagless = tp
            .table()
            .iter()
            .filter(|r| r.get("nationality").map_or(true, Value::is_null))
            .filter(|r| r.get("rider_url").map_or(false, |u| !u.is_null()))
            .count();
        if flagless > 0 {
            warn!("{} stage winners without a flag, their nationality is null", flagless);
        }

        Ok(select_fields(tp.table(), &fields))
    }
}

impl PageProfile for Race {
    const PROFILE: Profile = Profile::Race;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<Race>;
        vec![
            E::required("name", |r| r.name().map(Value::from)),
            E::required("year", |r| r.year().map(Value::from)),
            E::optional("nationality", |r| r.nationality().map(Value::from)),
            E::optional("edition", |r| r.edition().map(Value::from)),
            E::optional("startdate", |r| r.startdate()),
            E::optional("enddate", |r| r.enddate()),
            E::optional("category", |r| r.category().map(Value::from)),
            E::optional("uci_tour", |r| r.uci_tour().map(Value::from)),
            E::required("is_one_day_race", |r| r.is_one_day_race().map(Value::from)),
            E::optional("prev_editions_select", |r| r.prev_editions_select().map(Value::from)),
            E::optional("stages_select", |r| r.stages_select().map(Value::from)),
            E::required("stages", |r| r.stages(&[]).map(Value::from)),
            E::required("stages_winners", |r| r.stages_winners(&[]).map(Value::from)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINNERS: &str = r#"<html><body>
        <div class="page-title"><div class="main"><h1>Giro d'Italia</h1></div></div>
        <h3>Stages</h3>
        <table><thead><tr><th>Date</th><th></th><th>Stage</th><th>KM</th></tr></thead><tbody>
          <tr><td>06/05</td><td><span class="icon profile p1"></span></td><td><a href="race/giro-d-italia/2022/stage-1">Stage 1</a></td><td>195</td></tr>
          <tr><td>09/05</td><td></td><td>Restday</td><td></td></tr>
          <tr><td>10/05</td><td><span class="icon profile p4"></span></td><td><a href="race/giro-d-italia/2022/stage-4">Stage 4</a></td><td>172.5</td></tr>
        </tbody></table>
        <h3>Stage winners</h3>
        <table><thead><tr><th>Stage</th><th>Winner</th></tr></thead><tbody>
          <tr><td>Stage 1</td><td><span class="flag nl"></span> <a href="rider/mathieu-van-der-poel">VAN DER POEL Mathieu</a></td></tr>
          <tr><td>Stage 2</td><td></td></tr>
          <tr><td>Stage 4</td><td><a href="rider/lennard-kamna">KÄMNA Lennard</a></td></tr>
        </tbody></table></body></html>"#;

    #[test]
    fn test_rest_days_are_skipped() {
        let race = Race::new("race/giro-d-italia/2022", WINNERS).unwrap();
        let stages = race.stages(&["date", "stage_name", "distance", "profile_icon"]).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1].get("date"), Some(&Value::text("05-10")));
        assert_eq!(stages[1].get("distance"), Some(&Value::Float(172.5)));
        assert_eq!(stages[1].get("profile_icon"), Some(&Value::text("p4")));
        assert!(!stages[0].contains_key("stage_url"));
        assert_eq!(race.is_one_day_race().unwrap(), false);
    }

    #[test]
    fn test_winners_with_missing_flags() {
        let race = Race::new("race/giro-d-italia/2022", WINNERS).unwrap();
        let winners = race.stages_winners(&[]).unwrap();
        assert_eq!(winners.len(), 3);
        assert_eq!(winners[0].get("nationality"), Some(&Value::text("NL")));
        assert_eq!(winners[1].get("rider_url"), Some(&Value::Null));
        assert_eq!(winners[2].get("nationality"), Some(&Value::Null));
        assert_eq!(winners[2].get("stage_name"), Some(&Value::text("Stage 4")));
        assert_eq!(race.year().unwrap(), 2022);
    }
}
