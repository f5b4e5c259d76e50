use log::debug;
use scraper::ElementRef;

use super::{info_value_nonempty, page_title, parse_table, Extractor, PageProfile, Profile};
use crate::document::{attr, next_element, scoped_first, text_of, Document};
use crate::error::{Error, Result};
use crate::fields::{with_helpers, FieldSet};
use crate::reference::Reference;
use crate::table::{join_tables, parse_ttt_table, profile_icon_class, table_date, TableParser, TTT_FIELDS};
use crate::util::{normalize_ws, parse_float, parse_int, strip_parenthesized};
use crate::value::{select_fields, RowList, Value};

pub const RESULTS: FieldSet = FieldSet::new(&[
    "rank",
    "status",
    "age",
    "rider_name",
    "rider_url",
    "rider_number",
    "team_name",
    "team_url",
    "nationality",
    "time",
    "bonus",
    "pcs_points",
    "uci_points",
]);
pub const GC: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "age",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "time",
    "bonus",
    "pcs_points",
    "uci_points",
]);
pub const POINTS: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "age",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "points",
]);
pub const KOM: FieldSet = POINTS;
pub const YOUTH: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "age",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "time",
]);
pub const TEAMS: FieldSet = FieldSet::new(&["rank", "prev_rank", "team_name", "team_url", "nationality", "time"]);
pub const CLIMBS: FieldSet = FieldSet::new(&["climb_name", "climb_url"]);

/// Stage (or one day race) result page, `race/{id}/{year}/stage-{n}`,
/// `.../prologue` or `.../result`
pub struct Stage {
    reference: Reference,
    document: Document,
}

impl Stage {
    fn info(&self, label: &str) -> Result<String> {
        info_value_nonempty(&self.document, label)
    }

    fn info_float(&self, label: &str) -> Result<f64> {
        let text = self.info(label)?;
        parse_float(&text).ok_or_else(|| Error::expected(format!("no number in {} {:?}", label, text)))
    }

    fn info_int(&self, label: &str) -> Result<i64> {
        let text = self.info(label)?;
        parse_int(text.split_whitespace().next().unwrap_or(""))
            .ok_or_else(|| Error::expected(format!("no number in {} {:?}", label, text)))
    }

    pub fn race_name(&self) -> Result<String> {
        Ok(normalize_ws(&text_of(page_title(&self.document)?, None)))
    }

    /// Subtitle of the page, "Stage 18 (ITT) | Lourdes - Hautacam"
    pub fn stage_name(&self) -> Result<String> {
        let subtitle = self.document.first(".page-title > .main > h2")?;
        Ok(normalize_ws(&text_of(subtitle, Some(" "))))
    }

    pub fn is_one_day_race(&self) -> Result<bool> {
        Ok(self.reference.segments().get(3) == Some(&"result"))
    }

    /// `ITT`, `TTT` or `RR`, from the page subtitle
    pub fn stage_type(&self) -> Result<&'static str> {
        let subtitle = match self.document.first_opt(".page-title > .main > h2")? {
            Some(h2) => text_of(h2, None),
            None => String::new(),
        };
        Ok(if subtitle.contains("(ITT)") {
            "ITT"
        } else if subtitle.contains("(TTT)") {
            "TTT"
        } else {
            "RR"
        })
    }

    pub fn distance(&self) -> Result<f64> {
        self.info_float("distance")
    }

    pub fn vertical_meters(&self) -> Result<i64> {
        self.info_int("vertical meters")
    }

    pub fn avg_temperature(&self) -> Result<f64> {
        self.info_float("avg. temperature")
    }

    pub fn date(&self) -> Result<Value> {
        // "20 July 2022, 13:05" on some pages
        let text = self.info("date")?;
        let date = text.split(',').next().unwrap_or("");
        match table_date(date)? {
            Value::Null => Err(Error::expected("no date")),
            date => Ok(date),
        }
    }

    pub fn departure(&self) -> Result<String> {
        self.info("departure")
    }

    pub fn arrival(&self) -> Result<String> {
        self.info("arrival")
    }

    pub fn won_how(&self) -> Result<String> {
        self.info("won how")
    }

    pub fn profile_score(&self) -> Result<i64> {
        self.info_int("profilescore")
    }

    pub fn pcs_points_scale(&self) -> Result<String> {
        self.info("points scale")
    }

    pub fn uci_points_scale(&self) -> Result<String> {
        self.info("uci scale")
    }

    pub fn avg_speed_winner(&self) -> Result<f64> {
        self.info_float("avg. speed winner")
    }

    pub fn start_time(&self) -> Result<String> {
        Ok(strip_parenthesized(&self.info("start time")?).to_string())
    }

    pub fn race_category(&self) -> Result<String> {
        self.info("race category")
    }

    /// Startlist quality score before and after the race, "1089 (1134)".
    /// A single number counts for both.
    pub fn race_startlist_quality_score(&self) -> Result<(i64, i64)> {
        let text = self.info("startlist quality score")?;
        let numbers: Vec<i64> = text
            .split(|c: char| !c.is_ascii_digit())
            .filter_map(|n| n.parse().ok())
            .collect();
        match numbers.as_slice() {
            [single] => Ok((*single, *single)),
            [pre, post, ..] => Ok((*pre, *post)),
            [] => Err(Error::expected(format!("no quality score in {:?}", text))),
        }
    }

    pub fn profile_icon(&self) -> Result<String> {
        let icon = self.document.first("ul.infolist span.profile")?;
        profile_icon_class(icon)
    }

    /// Result container of the tab whose label is one of `labels`
    fn tab(&self, labels: &[&str]) -> Result<Option<ElementRef<'_>>> {
        for a in self.document.all("ul.restabs li a[data-id]")? {
            let label = text_of(a, None).to_lowercase();
            if !labels.contains(&label.as_str()) {
                continue;
            }
            let id = attr(a, "data-id");
            for cont in self.document.all("div.result-cont")? {
                if attr(cont, "data-id") == id {
                    return Ok(Some(cont));
                }
            }
        }
        Ok(None)
    }

    fn results_container(&self) -> Result<ElementRef<'_>> {
        if let Some(cont) = self.tab(&["stage", "prologue", "result"])? {
            return Ok(cont);
        }
        // pages without tabs have a single result container
        self.document.first("div.result-cont")
    }

    pub fn results(&self, fields: &[&str]) -> Result<RowList> {
        let fields = RESULTS.select(fields)?;
        let cont = self.results_container()?;
        if scoped_first(cont, "ul.ttt-results")?.is_some() {
            return self.ttt_results(cont, &fields);
        }

        let parsed = if fields.contains(&"time") {
            with_helpers(&fields, &["status"])
        } else {
            fields.clone()
        };
        let mut rows = parse_table(cont, &parsed)?;
        // riders without a result have no time of their own
        for row in rows.iter_mut() {
            let finished = row.get("status").and_then(Value::as_str).map_or(true, |s| s == "DF");
            if !finished && row.contains_key("time") {
                row.insert("time", Value::Null);
            }
        }
        Ok(select_fields(&rows, &fields))
    }

    fn ttt_results(&self, cont: ElementRef, fields: &[&str]) -> Result<RowList> {
        let mut rows = parse_ttt_table(cont)?;
        let missing: Vec<&str> = fields.iter().copied().filter(|f| !TTT_FIELDS.contains(f)).collect();
        if !missing.is_empty() {
            match self.tab(&["gc"])? {
                Some(gc) => {
                    debug!("joining {:?} from the gc table", missing);
                    let gc_rows = parse_table(gc, &with_helpers(&missing, &["rider_url"]))?;
                    rows = join_tables(&rows, &gc_rows, "rider_url", true)?;
                }
                None => {
                    for row in rows.iter_mut() {
                        for field in &missing {
                            row.insert(*field, Value::Null);
                        }
                    }
                }
            }
        }
        Ok(select_fields(&rows, fields))
    }

    /// Classification tab as a table, empty when the tab doesn't exist
    fn classification(&self, labels: &[&str], set: &FieldSet, fields: &[&str]) -> Result<RowList> {
        let fields = set.select(fields)?;
        match self.tab(labels)? {
            Some(cont) => parse_table(cont, &fields),
            None => Ok(Vec::new()),
        }
    }

    pub fn gc(&self, fields: &[&str]) -> Result<RowList> {
        self.classification(&["gc"], &GC, fields)
    }

    pub fn points(&self, fields: &[&str]) -> Result<RowList> {
        self.classification(&["points"], &POINTS, fields)
    }

    pub fn kom(&self, fields: &[&str]) -> Result<RowList> {
        self.classification(&["kom"], &KOM, fields)
    }

    pub fn youth(&self, fields: &[&str]) -> Result<RowList> {
        self.classification(&["youth"], &YOUTH, fields)
    }

    pub fn teams(&self, fields: &[&str]) -> Result<RowList> {
        self.classification(&["teams"], &TEAMS, fields)
    }

    /// Categorized climbs of the stage, empty when there are none
    pub fn climbs(&self, fields: &[&str]) -> Result<RowList> {
        let fields = CLIMBS.select(fields)?;
        for heading in self.document.all("h3, h4")? {
            if !text_of(heading, None).to_lowercase().contains("climbs") {
                continue;
            }
            return match next_element(heading) {
                Some(list) => {
                    let mut tp = TableParser::new(list)?;
                    tp.parse(&fields)?;
                    Ok(tp.into_table())
                }
                None => Ok(Vec::new()),
            };
        }
        Ok(Vec::new())
    }
}

impl PageProfile for Stage {
    const PROFILE: Profile = Profile::Stage;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<Stage>;
        vec![
            E::required("race_name", |s| s.race_name().map(Value::from)),
            E::optional("stage_name", |s| s.stage_name().map(Value::from)),
            E::required("is_one_day_race", |s| s.is_one_day_race().map(Value::from)),
            E::required("stage_type", |s| s.stage_type().map(Value::from)),
            E::optional("distance", |s| s.distance().map(Value::from)),
            E::optional("vertical_meters", |s| s.vertical_meters().map(Value::from)),
            E::optional("avg_temperature", |s| s.avg_temperature().map(Value::from)),
            E::optional("date", |s| s.date()),
            E::optional("departure", |s| s.departure().map(Value::from)),
            E::optional("arrival", |s| s.arrival().map(Value::from)),
            E::optional("won_how", |s| s.won_how().map(Value::from)),
            E::optional("profile_score", |s| s.profile_score().map(Value::from)),
            E::optional("pcs_points_scale", |s| s.pcs_points_scale().map(Value::from)),
            E::optional("uci_points_scale", |s| s.uci_points_scale().map(Value::from)),
            E::optional("avg_speed_winner", |s| s.avg_speed_winner().map(Value::from)),
            E::optional("start_time", |s| s.start_time().map(Value::from)),
            E::optional("race_category", |s| s.race_category().map(Value::from)),
            E::optional("race_startlist_quality_score", |s| {
                s.race_startlist_quality_score()
                    .map(|(pre, post)| Value::List(vec![Value::Int(pre), Value::Int(post)]))
            }),
            E::optional("profile_icon", |s| s.profile_icon().map(Value::from)),
            E::required("results", |s| s.results(&[]).map(Value::from)),
            E::required("gc", |s| s.gc(&[]).map(Value::from)),
            E::required("points", |s| s.points(&[]).map(Value::from)),
            E::required("kom", |s| s.kom(&[]).map(Value::from)),
            E::required("youth", |s| s.youth(&[]).map(Value::from)),
            E::required("teams", |s| s.teams(&[]).map(Value::from)),
            E::required("climbs", |s| s.climbs(&[]).map(Value::from)),
        ]
    }
}
