use std::fmt;

use log::debug;

use super::{parse_table, Extractor, PageProfile, Profile};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fields::FieldSet;
use crate::reference::Reference;
use crate::select::parse_select_menu;
use crate::value::{RowList, Value};

pub const INDIVIDUAL: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "points",
]);
pub const TEAMS: FieldSet = FieldSet::new(&["rank", "prev_rank", "team_name", "team_url", "class", "nationality", "points"]);
pub const NATIONS: FieldSet = FieldSet::new(&["rank", "prev_rank", "nation_name", "nation_url", "nationality", "points"]);
pub const RACES: FieldSet = FieldSet::new(&["rank", "prev_rank", "race_name", "race_url", "nationality", "class", "points"]);
pub const INDIVIDUAL_WINS: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "first_places",
    "second_places",
    "third_places",
]);
pub const TEAM_WINS: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "team_name",
    "team_url",
    "nationality",
    "first_places",
    "second_places",
    "third_places",
]);
pub const NATION_WINS: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "nation_name",
    "nation_url",
    "nationality",
    "first_places",
    "second_places",
    "third_places",
]);
pub const DISTANCE: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "distance",
]);
pub const RACEDAYS: FieldSet = FieldSet::new(&[
    "rank",
    "prev_rank",
    "rider_name",
    "rider_url",
    "team_name",
    "team_url",
    "nationality",
    "racedays",
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingType {
    Individual,
    Teams,
    Nations,
    Races,
    IndividualWins,
    TeamWins,
    NationWins,
    Distance,
    Racedays,
}

impl RankingType {
    /// Infers the ranking from the reference path and its `s` parameter,
    /// "rankings/me/teams", "rankings.php?s=season-individual"...
    pub fn of(reference: &Reference) -> RankingType {
        let key = format!("{} {}", reference.path(), reference.query_value("s").unwrap_or(""));
        if key.contains("distance") {
            RankingType::Distance
        } else if key.contains("racedays") {
            RankingType::Racedays
        } else if key.contains("wins") {
            if key.contains("team") {
                RankingType::TeamWins
            } else if key.contains("nation") {
                RankingType::NationWins
            } else {
                RankingType::IndividualWins
            }
        } else if key.contains("team") {
            RankingType::Teams
        } else if key.contains("nation") {
            RankingType::Nations
        } else if key.contains("race") {
            RankingType::Races
        } else {
            RankingType::Individual
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RankingType::Individual => "individual",
            RankingType::Teams => "teams",
            RankingType::Nations => "nations",
            RankingType::Races => "races",
            RankingType::IndividualWins => "individual_wins",
            RankingType::TeamWins => "team_wins",
            RankingType::NationWins => "nation_wins",
            RankingType::Distance => "distance",
            RankingType::Racedays => "racedays",
        }
    }

    fn fields(&self) -> &'static FieldSet {
        match self {
            RankingType::Individual => &INDIVIDUAL,
            RankingType::Teams => &TEAMS,
            RankingType::Nations => &NATIONS,
            RankingType::Races => &RACES,
            RankingType::IndividualWins => &INDIVIDUAL_WINS,
            RankingType::TeamWins => &TEAM_WINS,
            RankingType::NationWins => &NATION_WINS,
            RankingType::Distance => &DISTANCE,
            RankingType::Racedays => &RACEDAYS,
        }
    }
}

impl fmt::Display for RankingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ranking page, `rankings/...` or `rankings.php?...`. One page holds one
/// kind of ranking; asking it for another kind is an expected error.
pub struct Ranking {
    reference: Reference,
    document: Document,
}

impl Ranking {
    pub fn ranking_type(&self) -> RankingType {
        RankingType::of(&self.reference)
    }

    fn ranking(&self, kind: RankingType, fields: &[&str]) -> Result<RowList> {
        let actual = self.ranking_type();
        if actual != kind {
            return Err(Error::expected(format!("{} ranking requested from a {} ranking page", kind, actual)));
        }
        let fields = kind.fields().select(fields)?;
        debug!("parsing {} ranking", kind);
        parse_table(self.document.first("table")?, &fields)
    }

    pub fn individual_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Individual, fields)
    }

    pub fn team_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Teams, fields)
    }

    pub fn nation_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Nations, fields)
    }

    pub fn races_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Races, fields)
    }

    pub fn individual_wins_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::IndividualWins, fields)
    }

    pub fn team_wins_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::TeamWins, fields)
    }

    pub fn nation_wins_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::NationWins, fields)
    }

    pub fn distance_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Distance, fields)
    }

    pub fn racedays_ranking(&self, fields: &[&str]) -> Result<RowList> {
        self.ranking(RankingType::Racedays, fields)
    }

    fn filter_select(&self, name: &str) -> Result<RowList> {
        parse_select_menu(&self.document, &format!("select[name=\"{}\"]", name))
    }

    pub fn date_select(&self) -> Result<RowList> {
        self.filter_select("date")
    }

    pub fn nation_select(&self) -> Result<RowList> {
        self.filter_select("nation")
    }

    pub fn team_select(&self) -> Result<RowList> {
        self.filter_select("team")
    }

    pub fn race_select(&self) -> Result<RowList> {
        self.filter_select("race")
    }

    pub fn page_select(&self) -> Result<RowList> {
        self.filter_select("offset")
    }

    pub fn teamlevel_select(&self) -> Result<RowList> {
        self.filter_select("teamlevel")
    }
}

impl PageProfile for Ranking {
    const PROFILE: Profile = Profile::Ranking;

    page_parts!();

    fn extractors() -> Vec<Extractor<Self>> {
        type E = Extractor<Ranking>;
        vec![
            E::required("ranking_type", |r| Ok(Value::from(r.ranking_type().name()))),
            E::optional("individual_ranking", |r| r.individual_ranking(&[]).map(Value::from)),
            E::optional("team_ranking", |r| r.team_ranking(&[]).map(Value::from)),
            E::optional("nation_ranking", |r| r.nation_ranking(&[]).map(Value::from)),
            E::optional("races_ranking", |r| r.races_ranking(&[]).map(Value::from)),
            E::optional("individual_wins_ranking", |r| r.individual_wins_ranking(&[]).map(Value::from)),
            E::optional("team_wins_ranking", |r| r.team_wins_ranking(&[]).map(Value::from)),
            E::optional("nation_wins_ranking", |r| r.nation_wins_ranking(&[]).map(Value::from)),
            E::optional("distance_ranking", |r| r.distance_ranking(&[]).map(Value::from)),
            E::optional("racedays_ranking", |r| r.racedays_ranking(&[]).map(Value::from)),
            E::optional("date_select", |r| r.date_select().map(Value::from)),
            E::optional("nation_select", |r| r.nation_select().map(Value::from)),
            E::optional("team_select", |r| r.team_select().map(Value::from)),
            E::optional("race_select", |r| r.race_select().map(Value::from)),
            E::optional("page_select", |r| r.page_select().map(Value::from)),
            E::optional("teamlevel_select", |r| r.teamlevel_select().map(Value::from)),
        ]
    }
}
