use chrono::Datelike;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use scraper::ElementRef;

use super::{page_title, Extractor, PageProfile, Profile};
use crate::components::country::country_code;
use crate::document::{attr, child_elements, has_class, scoped_first, text_of, Document};
use crate::error::{Error, Result};
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::table::{find_link, flag_code, relative_href, TableParser};
use crate::util::{get_day_month, normalize_ws, parse_int, parse_long_date};
use crate::value::{select_fields, Row, RowList, Value};

// 1: weight in kg
const REGEX_WEIGHT: &'static str = r#"(\d+(?:[.,]\d+)?)\s*kg"#;
// 1: height in m
const REGEX_HEIGHT: &'static str = r#"(\d+(?:[.,]\d+)?)\s*m\b"#;
// 1: day-month after an "as from" marker
const REGEX_AS_FROM: &'static str = r#"(?i)as from\s+(\d{1,2}[-/.]\d{1,2})"#;
// 1: day-month after an "until" marker
const REGEX_UNTIL: &'static str = r#"(?i)until\s+(\d{1,2}[-/.]\d{1,2})"#;

lazy_static! {
    static ref RE_WEIGHT: Regex = Regex::new(REGEX_WEIGHT).unwrap();
    static ref RE_HEIGHT: Regex = Regex::new(REGEX_HEIGHT).unwrap();
    static ref RE_AS_FROM: Regex = Regex::new(REGEX_AS_FROM).unwrap();
    static ref RE_UNTIL: Regex = Regex::new(REGEX_UNTIL).unwrap();
}

pub const SEASONS_TEAMS: FieldSet = FieldSet::new(&["season", "since", "until", "team_name", "team_url", "class"]);
pub const POINTS_PER_SEASON: FieldSet = FieldSet::new(&["season", "points", "rank"]);

/// Rider profile page, `rider/{id}`
pub struct Rider {
    reference: Reference,
    document: Document,
}

fn plausible_weight(kg: f64) -> bool {
    (30.0..=120.0).contains(&kg)
}

fn plausible_height(m: f64) -> bool {
    (1.5..=2.2).contains(&m)
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?[1].replace(',', ".").parse().ok()
}

impl Rider {
    fn info_box(&self) -> Result<ElementRef<'_>> {
        self.document.first("div.rdr-info-cont")
    }

    fn info_text(&self) -> Result<String> {
        Ok(normalize_ws(&text_of(self.info_box()?, Some(" "))))
    }

    pub fn name(&self) -> Result<String> {
        Ok(normalize_ws(&text_of(page_title(&self.document)?, None)))
    }

    pub fn image_url(&self) -> Result<String> {
        let img = self.document.first(".rdr-img-cont img")?;
        attr(img, "src")
            .map(|src| relative_href(src).to_string())
            .ok_or_else(|| Error::expected("rider image without source"))
    }

    /// Birthdate as `YYYY-M-D`
    pub fn birthdate(&self) -> Result<String> {
        let text = self.info_text()?;
        let after = text
            .split_once("Date of birth:")
            .map(|(_, rest)| rest)
            .ok_or_else(|| Error::expected("no date of birth"))?;
        let date = parse_long_date(after)?;
        Ok(format!("{}-{}-{}", date.year(), date.month(), date.day()))
    }

    pub fn place_of_birth(&self) -> Result<String> {
        let info = self.info_box()?;
        find_link(info, "location")?
            .map(|a| text_of(a, None))
            .ok_or_else(|| Error::expected("no place of birth"))
    }

    /// Two letter code from the flag, or from the country name when the
    /// flag is missing
    pub fn nationality(&self) -> Result<String> {
        let info = self.info_box()?;
        if let Some(code) = scoped_first(info, "span.flag")?.and_then(flag_code) {
            return Ok(code);
        }
        let country = match find_link(info, "nation")? {
            Some(a) => text_of(a, None),
            None => return Err(Error::expected("no nationality")),
        };
        country_code(&country)
            .map(str::to_string)
            .ok_or_else(|| Error::expected(format!("unknown country {:?}", country)))
    }

    /// Weight (kg) and height (m), swapped back when the page mixed them up
    fn measurements(&self) -> Result<(Option<f64>, Option<f64>)> {
        let text = self.info_text()?;
        let mut weight = capture_number(&RE_WEIGHT, &text);
        let mut height = capture_number(&RE_HEIGHT, &text);
        let misplaced = |w: Option<f64>, h: Option<f64>| {
            w.map_or(false, |w| !plausible_weight(w) && plausible_height(w))
                || h.map_or(false, |h| !plausible_height(h) && plausible_weight(h))
        };
        if misplaced(weight, height) {
            warn!("swapping weight {:?} and height {:?}", weight, height);
            std::mem::swap(&mut weight, &mut height);
        }
        Ok((weight, height))
    }

    pub fn weight(&self) -> Result<Value> {
        match self.measurements()?.0 {
            Some(kg) if kg.fract() == 0.0 => Ok(Value::Int(kg as i64)),
            Some(kg) => Ok(Value::Float(kg)),
            None => Err(Error::expected("no weight")),
        }
    }

    pub fn height(&self) -> Result<f64> {
        self.measurements()?.1.ok_or_else(|| Error::expected("no height"))
    }

    /// Teams per season. `since`/`until` are `MM-DD`, the whole season
    /// unless the entry says otherwise.
    pub fn seasons_teams(&self, fields: &[&str]) -> Result<RowList> {
        let fields = SEASONS_TEAMS.select(fields)?;
        let list = self.document.first("ul.rdr-teams")?;
        let mut tp = TableParser::new(list)?;

        let parsed: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|f| !matches!(*f, "since" | "until"))
            .collect();
        tp.parse(&parsed)?;

        if fields.contains(&"since") || fields.contains(&"until") {
            let mut since = Vec::with_capacity(tp.row_count());
            let mut until = Vec::with_capacity(tp.row_count());
            for li in tp.row_elements() {
                let text = text_of(*li, Some(" "));
                since.push(period_marker(&RE_AS_FROM, &text, "01-01")?);
                until.push(period_marker(&RE_UNTIL, &text, "12-31")?);
            }
            tp.extend("since", since)?;
            tp.extend("until", until)?;
        }

        Ok(select_fields(tp.table(), &fields))
    }

    pub fn points_per_season(&self, fields: &[&str]) -> Result<RowList> {
        let fields = POINTS_PER_SEASON.select(fields)?;
        let table = self.document.first("div.rdr-season-stats table")?;
        let mut tp = TableParser::new(table)?;
        let parsed: Vec<&str> = fields.iter().copied().filter(|f| *f != "rank").collect();
        tp.parse(&parsed)?;
        if fields.contains(&"rank") {
            tp.extend_with_column("rank", "rank", |s| parse_int(s).map(Value::Int).unwrap_or(Value::Null))?;
        }
        Ok(select_fields(tp.table(), &fields))
    }

    /// Points per speciality, keyed by speciality (`one_day_races`, `gc`...)
    pub fn points_per_speciality(&self) -> Result<Row> {
        let mut res = Row::new();
        for li in self.document.all("ul.pps > li")? {
            let title = child_elements(li).find(|c| has_class(*c, "title"));
            let points = child_elements(li).find(|c| has_class(*c, "pnt"));
            if let (Some(title), Some(points)) = (title, points) {
                let key = text_of(title, None).to_lowercase().replace(' ', "_");
                res.insert(key, parse_int(&text_of(points, None)).unwrap_or(0));
            }
        }
        if res.is_empty() {
            return Err(Error::expected("no points per speciality"));
        }
        Ok(res)
    }
}

fn period_marker(re: &Regex, text: &str, default: &str) -> Result<Value> {
    match re.captures(text) {
        Some(c) => Ok(Value::text(get_day_month(&c[1])?)),
        None => Ok(Value::text(default)),
    }
}

impl PageProfile for Rider {
    const PROFILE: Profile = Profile::Rider;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<Rider>;
        vec![
            E::required("name", |r| r.name().map(Value::from)),
            E::optional("image_url", |r| r.image_url().map(Value::from)),
            E::optional("birthdate", |r| r.birthdate().map(Value::from)),
            E::optional("place_of_birth", |r| r.place_of_birth().map(Value::from)),
            E::optional("nationality", |r| r.nationality().map(Value::from)),
            E::optional("weight", |r| r.weight()),
            E::optional("height", |r| r.height().map(Value::from)),
            E::required("seasons_teams", |r| r.seasons_teams(&[]).map(Value::from)),
            E::optional("points_per_season", |r| r.points_per_season(&[]).map(Value::from)),
            E::optional("points_per_speciality", |r| r.points_per_speciality().map(Value::Map)),
        ]
    }
}
