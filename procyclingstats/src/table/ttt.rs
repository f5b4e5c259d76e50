use log::trace;
use scraper::ElementRef;

use super::columns::{find_link, relative_href, time_text};
use crate::document::{attr, child_elements, scoped, scoped_first, text_of};
use crate::error::{Error, Result};
use crate::time::{make_times_absolute, RaceTime};
use crate::util::parse_points;
use crate::value::{Row, RowList, Value};

/// Field names of a team time trial table
pub const TTT_FIELDS: [&'static str; 10] = [
    "rank",
    "status",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "time",
    "bonus",
    "pcs_points",
    "uci_points",
];

struct TttTeam<'a> {
    rank: String,
    team: Option<ElementRef<'a>>,
    riders: Vec<ElementRef<'a>>,
}

fn cell_with_class<'a>(row: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    child_elements(row).find(|c| c.value().classes().any(|cl| cl == class))
}

/// Parses a team time trial result: every team is a list item holding the
/// team's rank, link and time followed by a nested table of its riders.
///
/// Riders inherit their team's rank and time; a rider losing contact carries
/// an extra time that shifts the team time.
pub fn parse_ttt_table(element: ElementRef) -> Result<RowList> {
    let list = match element.value().name() {
        "ul" => element,
        _ => scoped_first(element, "ul.ttt-results")?
            .ok_or_else(|| Error::unexpected("no team time trial list"))?,
    };

    let mut teams = Vec::new();
    let mut team_times = Vec::new();
    for li in child_elements(list).filter(|c| c.value().name() == "li") {
        let head = scoped_first(li, ".ttt-team")?
            .ok_or_else(|| Error::unexpected("team time trial entry without team header"))?;
        let rank = scoped_first(head, ".rnk")?.map(|r| text_of(r, None)).unwrap_or_default();
        let time = match scoped_first(head, ".time")? {
            Some(cell) => Value::opt_text(time_text(cell)?),
            None => Value::Null,
        };
        let riders = match scoped_first(li, "table")? {
            Some(table) => scoped(table, "tr")?
                .into_iter()
                .filter(|tr| child_elements(*tr).any(|c| c.value().name() == "td"))
                .collect(),
            None => Vec::new(),
        };

        teams.push(TttTeam {
            rank,
            team: find_link(head, "team")?,
            riders,
        });
        team_times.push(time);
    }

    make_times_absolute(&mut team_times)?;

    let mut res = Vec::new();
    for (team, team_time) in teams.iter().zip(team_times) {
        let numeric = !team.rank.is_empty() && team.rank.chars().all(|c| c.is_ascii_digit());
        let rank = if numeric { team.rank.parse().map(Value::Int).unwrap_or(Value::Null) } else { Value::Null };
        let status = if numeric { Value::text("DF") } else { Value::text(team.rank.to_uppercase()) };
        let team_name = Value::opt_text(team.team.map(|a| text_of(a, None)));
        let team_url = Value::opt_text(team.team.and_then(|a| attr(a, "href")).map(relative_href));
        let team_time = match &team_time {
            Value::Text(t) => Some(RaceTime::parse(t)?),
            _ => None,
        };
        trace!("ttt team {:?} {} riders", team_name, team.riders.len());

        for tr in &team.riders {
            let rider = match find_link(*tr, "rider")? {
                Some(a) => a,
                None => continue,
            };
            let extra = match cell_with_class(*tr, "time") {
                Some(cell) => time_text(cell)?.map(|t| RaceTime::parse(&t)).transpose()?,
                None => None,
            };
            let time = team_time
                .map(|t| t.checked_add(extra.unwrap_or(RaceTime::ZERO)))
                .transpose()?;
            let points = |class: &str| {
                cell_with_class(*tr, class)
                    .map(|c| parse_points(&text_of(c, None)))
                    .unwrap_or(Value::Int(0))
            };

            let mut row = Row::new();
            row.insert("rank", rank.clone());
            row.insert("status", status.clone());
            row.insert("rider_name", text_of(rider, None));
            row.insert("rider_url", Value::opt_text(attr(rider, "href").map(relative_href)));
            row.insert("team_name", team_name.clone());
            row.insert("team_url", team_url.clone());
            row.insert("time", Value::opt_text(time.map(|t| t.to_string())));
            row.insert("bonus", RaceTime::ZERO.to_string());
            row.insert("pcs_points", points("pnt"));
            row.insert("uci_points", points("uci_pnt"));
            res.push(row);
        }
    }

    Ok(res)
}
