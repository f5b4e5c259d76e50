use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

use super::{ColumnRef, TableParser};
use crate::document::{attr, scoped, scoped_first, text_of};
use crate::error::{Error, Result};
use crate::time::RaceTime;
use crate::util::{convert_date, get_day_month, parse_float, parse_int, parse_points, parenthesized};
use crate::value::Value;

pub type ColumnParser = for<'a> fn(&TableParser<'a>) -> Result<Vec<Value>>;

const REGEX_ISO_DATE: &'static str = r#"^\d{4}-\d{2}-\d{2}$"#;
const REGEX_PROFILE_ICON: &'static str = r#"^p[0-5]$"#;

lazy_static! {
    static ref RE_ISO_DATE: Regex = Regex::new(REGEX_ISO_DATE).unwrap();
    static ref RE_PROFILE_ICON: Regex = Regex::new(REGEX_PROFILE_ICON).unwrap();
}

/// Every field name a table can be asked for
pub const COLUMN_NAMES: [&'static str; 35] = [
    "rank",
    "status",
    "prev_rank",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "stage_name",
    "stage_url",
    "race_name",
    "race_url",
    "nation_name",
    "nation_url",
    "climb_name",
    "climb_url",
    "age",
    "nationality",
    "time",
    "bonus",
    "profile_icon",
    "season",
    "rider_number",
    "pcs_points",
    "uci_points",
    "points",
    "first_places",
    "second_places",
    "third_places",
    "distance",
    "date",
    "class",
    "racedays",
    "since",
    "until",
    "career_points",
];

pub fn column_parser(name: &str) -> Option<ColumnParser> {
    let parser: ColumnParser = match name {
        "rank" => rank,
        "status" => status,
        "prev_rank" => prev_rank,
        "rider_name" => |t| link_column(t, "rider", LinkPart::Text),
        "rider_url" => |t| link_column(t, "rider", LinkPart::Href),
        "team_name" => |t| link_column(t, "team", LinkPart::Text),
        "team_url" => |t| link_column(t, "team", LinkPart::Href),
        "stage_name" | "race_name" => |t| link_column(t, "race", LinkPart::Text),
        "stage_url" | "race_url" => |t| link_column(t, "race", LinkPart::Href),
        "nation_name" => |t| link_column(t, "nation", LinkPart::Text),
        "nation_url" => |t| link_column(t, "nation", LinkPart::Href),
        "climb_name" => |t| link_column(t, "location", LinkPart::Text),
        "climb_url" => |t| link_column(t, "location", LinkPart::Href),
        "age" => |t| numeric_column(t, &["age"], &["age"]),
        "nationality" => nationality,
        "time" => time,
        "bonus" => bonus,
        "profile_icon" => profile_icon,
        "season" => season,
        "rider_number" => |t| numeric_column(t, &["bibs", "bib"], &["bib", "#"]),
        "pcs_points" => |t| points_column(t, &["pnt", "pcs"], &["pnt", "pcs"]),
        "uci_points" => |t| points_column(t, &["uci_pnt", "uci"], &["uci"]),
        "points" => |t| points_column(t, &["points", "pnt"], &["points", "pnt", "pcs"]),
        "career_points" => |t| points_column(t, &["points", "pnt"], &["points", "pnt"]),
        "first_places" => |t| places_column(t, "1st"),
        "second_places" => |t| places_column(t, "2nd"),
        "third_places" => |t| places_column(t, "3rd"),
        "racedays" => |t| numeric_column(t, &["racedays"], &["racedays", "days"]),
        "distance" => distance,
        "date" => date,
        "class" => class,
        "since" => |t| period_column(t, "since"),
        "until" => |t| period_column(t, "until"),
        _ => return None,
    };
    Some(parser)
}

/// Integer rank for a purely numeric result cell, null otherwise
pub(crate) fn rank_value(s: &str) -> Value {
    match s.parse::<i64>() {
        Ok(r) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => Value::Int(r),
        _ => Value::Null,
    }
}

/// "DF" for a numeric result cell, the marker itself (DNF, DNS, OTL...) otherwise
pub(crate) fn status_value(s: &str) -> Value {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        Value::text("DF")
    } else {
        Value::text(s.to_uppercase())
    }
}

fn rank(t: &TableParser) -> Result<Vec<Value>> {
    t.parse_extra_column(ColumnRef::Index(0), rank_value)
}

fn status(t: &TableParser) -> Result<Vec<Value>> {
    t.parse_extra_column(ColumnRef::Index(0), status_value)
}

fn prev_rank(t: &TableParser) -> Result<Vec<Value>> {
    let column = match t.find_column(&["prev"]) {
        Some(i) => ColumnRef::Index(i as i64),
        None => ColumnRef::Index(1),
    };
    t.parse_extra_column(column, |s| parse_int(s).map(Value::Int).unwrap_or(Value::Null))
}

#[derive(Clone, Copy)]
enum LinkPart {
    Href,
    Text,
}

/// Relative form of a site link, "/rider/x" and absolute URLs become "rider/x"
pub(crate) fn relative_href(href: &str) -> &str {
    let href = href
        .strip_prefix(crate::reference::ORIGIN)
        .or_else(|| href.strip_prefix("http://www.procyclingstats.com"))
        .unwrap_or(href);
    href.trim_start_matches('/')
}

/// First anchor of `node` whose leading path segment is `category`
pub(crate) fn find_link<'a>(node: ElementRef<'a>, category: &str) -> Result<Option<ElementRef<'a>>> {
    for a in scoped(node, "a[href]")? {
        let href = attr(a, "href").map(relative_href).unwrap_or("");
        if href.split(['/', '?']).next() == Some(category) {
            return Ok(Some(a));
        }
    }
    Ok(None)
}

fn link_column(t: &TableParser, category: &str, part: LinkPart) -> Result<Vec<Value>> {
    let mut res = Vec::with_capacity(t.row_count());
    for row in t.row_elements() {
        let value = match find_link(*row, category)? {
            Some(a) => match part {
                LinkPart::Href => Value::text(relative_href(attr(a, "href").unwrap_or(""))),
                LinkPart::Text => Value::text(text_of(a, None)),
            },
            None => Value::Null,
        };
        res.push(value);
    }
    Ok(res)
}

/// Country code from a flag element, `<span class="flag si">` -> "SI"
pub(crate) fn flag_code(flag: ElementRef) -> Option<String> {
    attr(flag, "class")?
        .split_whitespace()
        .nth(1)
        .map(|c| c.to_uppercase())
}

fn nationality(t: &TableParser) -> Result<Vec<Value>> {
    let mut res = Vec::with_capacity(t.row_count());
    for row in t.row_elements() {
        let flag = scoped_first(*row, ".flag")?;
        res.push(Value::opt_text(flag.and_then(flag_code)));
    }
    Ok(res)
}

fn map_cells<F>(cells: Vec<Option<ElementRef>>, f: F) -> Result<Vec<Value>>
where
    F: Fn(ElementRef) -> Result<Value>,
{
    cells
        .into_iter()
        .map(|cell| match cell {
            Some(cell) => f(cell),
            None => Ok(Value::Null),
        })
        .collect()
}

fn numeric_column(t: &TableParser, classes: &[&str], headers: &[&str]) -> Result<Vec<Value>> {
    map_cells(t.cells_by(classes, headers)?, |cell| {
        Ok(parse_int(&text_of(cell, None)).map(Value::Int).unwrap_or(Value::Null))
    })
}

fn points_column(t: &TableParser, classes: &[&str], headers: &[&str]) -> Result<Vec<Value>> {
    map_cells(t.cells_by(classes, headers)?, |cell| Ok(parse_points(&text_of(cell, None))))
}

fn places_column(t: &TableParser, header: &str) -> Result<Vec<Value>> {
    map_cells(t.cells_by(&[], &[header])?, |cell| {
        Ok(Value::Int(parse_int(&text_of(cell, None)).unwrap_or(0)))
    })
}

/// Time cell contents, `None` for "no result" markers.
///
/// The visible text is abbreviated (",,") when equal to the row above; the
/// hidden span carries the full value when present.
pub(crate) fn time_text(cell: ElementRef) -> Result<Option<String>> {
    let text = match scoped_first(cell, "span.hide")? {
        Some(hidden) => text_of(hidden, None),
        None => text_of(cell, Some("\n")).lines().next().unwrap_or("").to_string(),
    };
    let text = text.trim();
    if text.is_empty() || text == "-" || text == ",," {
        return Ok(None);
    }
    Ok(Some(RaceTime::parse(text)?.to_string()))
}

fn time(t: &TableParser) -> Result<Vec<Value>> {
    map_cells(t.cells_by(&["time"], &["time"])?, |cell| Ok(Value::opt_text(time_text(cell)?)))
}

/// Bonus seconds as `0:MM:SS`, penalties as `-0:MM:SS`
pub(crate) fn format_bonus(text: &str) -> Result<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '″' | '"' | '\'' | '+'))
        .collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let time = if body.is_empty() {
        RaceTime::ZERO
    } else if body.contains(':') {
        RaceTime::parse(body)?
    } else {
        let secs = body
            .parse::<i64>()
            .map_err(|_| Error::unexpected(format!("invalid bonus {:?}", text)))?;
        RaceTime::from_secs(secs)?
    };
    let signed = if negative { -time } else { time };
    Ok(signed.to_string())
}

fn bonus(t: &TableParser) -> Result<Vec<Value>> {
    let cells = match t.cells_by(&["bonis", "bonus"], &["bonis", "bonus", "bon"]) {
        Ok(cells) => cells,
        // tables without bonus seconds
        Err(Error::Unexpected(_)) => vec![None; t.row_count()],
        Err(e) => return Err(e),
    };
    cells
        .into_iter()
        .map(|cell| {
            let text = cell.map(|c| text_of(c, None)).unwrap_or_default();
            Ok(Value::text(format_bonus(&text)?))
        })
        .collect()
}

/// `p0`...`p5` from a profile icon element
pub(crate) fn profile_icon_class(icon: ElementRef) -> Result<String> {
    let class = attr(icon, "class").unwrap_or("");
    match class.split_whitespace().find(|c| RE_PROFILE_ICON.is_match(c)) {
        Some(p) => Ok(p.to_string()),
        None => Err(Error::unexpected(format!("unknown profile icon class {:?}", class))),
    }
}

fn profile_icon(t: &TableParser) -> Result<Vec<Value>> {
    let mut res = Vec::with_capacity(t.row_count());
    for row in t.row_elements() {
        res.push(match scoped_first(*row, "span.profile")? {
            Some(icon) => Value::text(profile_icon_class(icon)?),
            None => Value::Null,
        });
    }
    Ok(res)
}

fn season(t: &TableParser) -> Result<Vec<Value>> {
    let cells = match t.cells_by(&["season"], &["season", "year"]) {
        Ok(cells) => cells,
        Err(Error::Unexpected(_)) => t.column_cells(ColumnRef::Index(0))?,
        Err(e) => return Err(e),
    };
    map_cells(cells, |cell| Ok(parse_int(&text_of(cell, None)).map(Value::Int).unwrap_or(Value::Null)))
}

fn distance(t: &TableParser) -> Result<Vec<Value>> {
    map_cells(t.cells_by(&["distance", "km"], &["distance", "km"])?, |cell| {
        Ok(parse_float(&text_of(cell, None)).map(Value::Float).unwrap_or(Value::Null))
    })
}

/// Dates as shown in tables: ISO dates are kept, day-first partial dates
/// become `MM-DD`, long dates become `YYYY-MM-DD`
pub(crate) fn table_date(text: &str) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Ok(Value::Null);
    }
    if RE_ISO_DATE.is_match(text) {
        return Ok(Value::text(text));
    }
    if text.chars().any(|c| c.is_ascii_alphabetic()) && text.chars().filter(|c| c.is_ascii_digit()).count() > 4 {
        return Ok(Value::text(convert_date(text)?));
    }
    Ok(Value::text(get_day_month(text)?))
}

fn date(t: &TableParser) -> Result<Vec<Value>> {
    let cells = match t.cells_by(&["date"], &["date"]) {
        Ok(cells) => cells,
        Err(Error::Unexpected(_)) => t.column_cells(ColumnRef::Index(0))?,
        Err(e) => return Err(e),
    };
    map_cells(cells, |cell| table_date(&text_of(cell, None)))
}

fn class(t: &TableParser) -> Result<Vec<Value>> {
    map_cells(t.cells_by(&["class"], &["class"])?, |cell| {
        let text = text_of(cell, None);
        let text = parenthesized(&text).unwrap_or(&text).trim().to_string();
        Ok(if text.is_empty() { Value::Null } else { Value::Text(text) })
    })
}

fn period_column(t: &TableParser, header: &str) -> Result<Vec<Value>> {
    map_cells(t.cells_by(&[header], &[header])?, |cell| table_date(&text_of(cell, None)))
}
