use log::debug;
use scraper::ElementRef;

use super::{Extractor, PageProfile, Profile};
use crate::document::{attr, child_elements, scoped, scoped_first, text_of, Document};
use crate::error::{Error, Result};
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::table::{find_link, flag_code, relative_href};
use crate::util::{parse_int, strip_parenthesized};
use crate::value::{select_fields, Row, RowList, Value};

pub const STARTLIST: FieldSet = FieldSet::new(&[
    "rider_name",
    "rider_url",
    "nationality",
    "rider_number",
    "team_name",
    "team_url",
]);

/// Startlist of a race, `race/{id}/{year}/startlist`
pub struct RaceStartlist {
    reference: Reference,
    document: Document,
}

fn rider_row(li: ElementRef, team: Option<ElementRef>, number: Value) -> Result<Option<Row>> {
    let rider = match find_link(li, "rider")? {
        Some(a) => a,
        None => return Ok(None),
    };
    let mut row = Row::new();
    row.insert("rider_name", text_of(rider, None));
    row.insert("rider_url", Value::opt_text(attr(rider, "href").map(relative_href)));
    row.insert("nationality", Value::opt_text(scoped_first(li, ".flag")?.and_then(flag_code)));
    row.insert("rider_number", number);
    row.insert(
        "team_name",
        Value::opt_text(team.map(|a| strip_parenthesized(&text_of(a, None)).to_string())),
    );
    row.insert("team_url", Value::opt_text(team.and_then(|a| attr(a, "href")).map(relative_href)));
    Ok(Some(row))
}

impl RaceStartlist {
    /// Riders grouped by team, in startlist order. Older races only have a
    /// flat list, whose riders get no team and are numbered by position.
    pub fn startlist(&self, fields: &[&str]) -> Result<RowList> {
        let fields = STARTLIST.select(fields)?;
        let mut res = Vec::new();

        if let Some(teams) = self.document.first_opt("ul.startlist_v4")? {
            for team_li in child_elements(teams).filter(|c| c.value().name() == "li") {
                let team = find_link(team_li, "team")?;
                for rider_li in scoped(team_li, "ul li")? {
                    let number = match scoped_first(rider_li, ".bib")? {
                        Some(bib) => Value::from(parse_int(&text_of(bib, None))),
                        None => Value::Null,
                    };
                    if let Some(row) = rider_row(rider_li, team, number)? {
                        res.push(row);
                    }
                }
            }
        } else if let Some(flat) = self.document.first_opt("ul.startlist_flat")? {
            debug!("no teams in startlist, reading flat list");
            let riders = child_elements(flat).filter(|c| c.value().name() == "li");
            for (position, rider_li) in riders.enumerate() {
                if let Some(row) = rider_row(rider_li, None, Value::Int(position as i64 + 1))? {
                    res.push(row);
                }
            }
        } else {
            return Err(Error::unexpected("no startlist"));
        }

        Ok(select_fields(&res, &fields))
    }
}

impl PageProfile for RaceStartlist {
    const PROFILE: Profile = Profile::RaceStartlist;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        vec![Extractor::required("startlist", |s: &RaceStartlist| s.startlist(&[]).map(Value::from))]
    }
}
