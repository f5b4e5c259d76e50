use log::trace;
use scraper::ElementRef;

use super::{info_value_nonempty, page_title, title_flag, Extractor, PageProfile, Profile};
use crate::document::{attr, child_elements, has_class, text_of, Document};
use crate::error::{Error, Result};
use crate::fields::{with_helpers, FieldSet};
use crate::reference::Reference;
use crate::select::parse_select_menu;
use crate::table::{flag_code, join_tables, TableParser};
use crate::util::{normalize_ws, parenthesized, parse_int, strip_parenthesized};
use crate::value::{select_fields, RowList, Value};

pub const RIDERS: FieldSet = FieldSet::new(&[
    "rider_name",
    "rider_url",
    "nationality",
    "age",
    "since",
    "until",
    "career_points",
    "ranking_points",
    "ranking_position",
]);

/// Roster tabs and the fields each one contributes, the first is the
/// primary table the others are joined onto
const ROSTER_TABS: [(&'static str, &'static [&'static str]); 4] = [
    ("points", &["rider_name", "nationality", "career_points"]),
    ("age", &["age"]),
    ("ranking", &["ranking_points", "ranking_position"]),
    ("name", &["since", "until"]),
];

fn wanted(tab_fields: &[&'static str], fields: &[&str]) -> Vec<&'static str> {
    tab_fields.iter().copied().filter(|f| fields.contains(f)).collect()
}

/// Team page for one season, `team/{id}-{year}`
pub struct Team {
    reference: Reference,
    document: Document,
}

impl Team {
    fn title(&self) -> Result<String> {
        Ok(normalize_ws(&text_of(page_title(&self.document)?, None)))
    }

    /// Team name without its status, "UAE Team Emirates (WT)" -> "UAE Team Emirates"
    pub fn display_name(&self) -> Result<String> {
        Ok(strip_parenthesized(&self.title()?).to_string())
    }

    pub fn team_status(&self) -> Result<String> {
        let title = self.title()?;
        parenthesized(&title)
            .map(str::to_uppercase)
            .ok_or_else(|| Error::expected("no team status in the title"))
    }

    pub fn nationality(&self) -> Result<String> {
        flag_code(title_flag(&self.document)?).ok_or_else(|| Error::expected("flag without country"))
    }

    pub fn abbreviation(&self) -> Result<String> {
        info_value_nonempty(&self.document, "abbreviation")
    }

    pub fn bike(&self) -> Result<String> {
        info_value_nonempty(&self.document, "bike")
    }

    /// Number from the key figure box whose title contains `title`
    fn kpi(&self, title: &str) -> Result<i64> {
        for li in self.document.all("ul.teamkpi > li")? {
            let label = child_elements(li).find(|c| has_class(*c, "title"));
            let number = child_elements(li).find(|c| has_class(*c, "nr"));
            if let (Some(label), Some(number)) = (label, number) {
                if text_of(label, None).to_lowercase().contains(title) {
                    return parse_int(&text_of(number, None))
                        .ok_or_else(|| Error::expected(format!("no {} figure", title)));
                }
            }
        }
        Err(Error::expected(format!("no {} figure", title)))
    }

    pub fn wins_count(&self) -> Result<i64> {
        self.kpi("wins")
    }

    pub fn team_ranking_position(&self) -> Result<i64> {
        self.kpi("pcs")
    }

    pub fn uci_ranking_position(&self) -> Result<i64> {
        self.kpi("uci")
    }

    pub fn history_select(&self) -> Result<RowList> {
        parse_select_menu(&self.document, "select.team-seasons")
    }

    fn roster_tab(&self, code: &str) -> Result<ElementRef<'_>> {
        for tab in self.document.all("div.ridersTab")? {
            if attr(tab, "data-code") == Some(code) {
                return Ok(tab);
            }
        }
        Err(Error::unexpected(format!("no {:?} roster tab", code)))
    }

    fn parse_roster_tab(&self, code: &str, fields: &[&str]) -> Result<RowList> {
        let tab = self.roster_tab(code)?;
        let fields = with_helpers(fields, &["rider_url"]);
        let mut tp = TableParser::new(tab)?;
        let parsed: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|f| !f.starts_with("ranking_"))
            .collect();
        tp.parse(&parsed)?;
        if fields.contains(&"ranking_points") {
            tp.extend_with_column("ranking_points", "points", |s| Value::from(parse_int(s)))?;
        }
        if fields.contains(&"ranking_position") {
            tp.extend_with_column("ranking_position", "rank", |s| Value::from(parse_int(s)))?;
        }
        trace!("roster tab {} gave {} riders", code, tp.table().len());
        Ok(tp.into_table())
    }

    /// Riders of the team, gathered from the roster tabs by rider url
    pub fn riders(&self, fields: &[&str]) -> Result<RowList> {
        let fields = RIDERS.select(fields)?;
        let (primary_code, primary_fields) = ROSTER_TABS[0];
        let mut riders = self.parse_roster_tab(primary_code, &wanted(primary_fields, &fields))?;
        for (code, tab_fields) in &ROSTER_TABS[1..] {
            let tab_fields = wanted(tab_fields, &fields);
            if tab_fields.is_empty() {
                continue;
            }
            let other = self.parse_roster_tab(code, &tab_fields)?;
            riders = join_tables(&riders, &other, "rider_url", false)?;
        }
        Ok(select_fields(&riders, &fields))
    }
}

impl PageProfile for Team {
    const PROFILE: Profile = Profile::Team;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<Team>;
        vec![
            E::required("display_name", |t| t.display_name().map(Value::from)),
            E::optional("team_status", |t| t.team_status().map(Value::from)),
            E::optional("nationality", |t| t.nationality().map(Value::from)),
            E::optional("abbreviation", |t| t.abbreviation().map(Value::from)),
            E::optional("bike", |t| t.bike().map(Value::from)),
            E::optional("wins_count", |t| t.wins_count().map(Value::from)),
            E::optional("team_ranking_position", |t| t.team_ranking_position().map(Value::from)),
            E::optional("uci_ranking_position", |t| t.uci_ranking_position().map(Value::from)),
            E::optional("history_select", |t| t.history_select().map(Value::from)),
            E::required("riders", |t| t.riders(&[]).map(Value::from)),
        ]
    }
}
