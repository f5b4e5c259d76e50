//! Page profiles.
//!
//! Every kind of page the site serves that we know how to read is a profile:
//! a predicate over references, a validity check over documents and a list
//! of named extractors.

use std::fmt;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use scraper::ElementRef;
use serde::Serialize;

use crate::document::{child_elements, scoped_first, text_of, Document};
use crate::error::{Error, ErrorKind, Result};
use crate::reference::Reference;
use crate::table::TableParser;
use crate::util::normalize_ws;
use crate::value::{Row, RowList, Value};

// Accessors every profile struct shares, must stay above the submodules
macro_rules! page_parts {
    () => {
        fn from_parts(reference: Reference, document: Document) -> Self {
            Self { reference, document }
        }

        fn reference(&self) -> &Reference {
            &self.reference
        }

        fn document(&self) -> &Document {
            &self.document
        }
    };
}

pub mod climbs;
pub mod combative;
pub mod race;
pub mod ranking;
pub mod rider;
pub mod rider_results;
pub mod stage;
pub mod startlist;
pub mod team;

pub use climbs::RaceClimbs;
pub use combative::RaceCombativeRiders;
pub use race::Race;
pub use ranking::{Ranking, RankingType};
pub use rider::Rider;
pub use rider_results::RiderResults;
pub use stage::Stage;
pub use startlist::RaceStartlist;
pub use team::Team;

const REGEX_RIDER: &'static str = r#"^rider/[^/]+(?:/\d{4})?$"#;
const REGEX_RIDER_RESULTS: &'static str = r#"^rider/[^/]+/results(?:/final-5k-analysis)?$"#;
const REGEX_RACE: &'static str = r#"^race/[^/]+/\d{4}(?:/overview)?$"#;
const REGEX_STAGE: &'static str = r#"^race/[^/]+/\d{4}/(?:(?:stage-\d+[a-z]?|prologue)(?:-(?:gc|points|kom|youth|teams))?|result|gc)(?:/result)?$"#;
const REGEX_RACE_STARTLIST: &'static str = r#"^race/[^/]+/\d{4}/startlist$"#;
const REGEX_RACE_CLIMBS: &'static str = r#"^race/[^/]+/\d{4}/route/climbs$"#;
const REGEX_RACE_COMBATIVE_RIDERS: &'static str = r#"^race/[^/]+/\d{4}/results/combative-riders$"#;
const REGEX_TEAM: &'static str = r#"^team/[^/]+$"#;
const REGEX_RANKING: &'static str = r#"^rankings(?:/[a-z0-9/-]+)?$"#;

lazy_static! {
    static ref RE_RIDER: Regex = Regex::new(REGEX_RIDER).unwrap();
    static ref RE_RIDER_RESULTS: Regex = Regex::new(REGEX_RIDER_RESULTS).unwrap();
    static ref RE_RACE: Regex = Regex::new(REGEX_RACE).unwrap();
    static ref RE_STAGE: Regex = Regex::new(REGEX_STAGE).unwrap();
    static ref RE_RACE_STARTLIST: Regex = Regex::new(REGEX_RACE_STARTLIST).unwrap();
    static ref RE_RACE_CLIMBS: Regex = Regex::new(REGEX_RACE_CLIMBS).unwrap();
    static ref RE_RACE_COMBATIVE_RIDERS: Regex = Regex::new(REGEX_RACE_COMBATIVE_RIDERS).unwrap();
    static ref RE_TEAM: Regex = Regex::new(REGEX_TEAM).unwrap();
    static ref RE_RANKING: Regex = Regex::new(REGEX_RANKING).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Profile {
    Rider,
    RiderResults,
    Race,
    Stage,
    RaceStartlist,
    RaceClimbs,
    RaceCombativeRiders,
    Team,
    Ranking,
}

impl Profile {
    pub const ALL: [Profile; 9] = [
        Profile::Rider,
        Profile::RiderResults,
        Profile::Race,
        Profile::Stage,
        Profile::RaceStartlist,
        Profile::RaceClimbs,
        Profile::RaceCombativeRiders,
        Profile::Team,
        Profile::Ranking,
    ];

    /// Most specific profiles first
    const DISPATCH_ORDER: [Profile; 9] = [
        Profile::RiderResults,
        Profile::Rider,
        Profile::RaceClimbs,
        Profile::RaceStartlist,
        Profile::RaceCombativeRiders,
        Profile::Stage,
        Profile::Race,
        Profile::Team,
        Profile::Ranking,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            Profile::Rider => &RE_RIDER,
            Profile::RiderResults => &RE_RIDER_RESULTS,
            Profile::Race => &RE_RACE,
            Profile::Stage => &RE_STAGE,
            Profile::RaceStartlist => &RE_RACE_STARTLIST,
            Profile::RaceClimbs => &RE_RACE_CLIMBS,
            Profile::RaceCombativeRiders => &RE_RACE_COMBATIVE_RIDERS,
            Profile::Team => &RE_TEAM,
            Profile::Ranking => &RE_RANKING,
        }
    }

    pub fn accepts(&self, reference: &Reference) -> bool {
        self.regex().is_match(reference.path())
    }

    /// The profile a reference belongs to
    pub fn dispatch(reference: &Reference) -> Result<Profile> {
        let profile = Profile::DISPATCH_ORDER
            .into_iter()
            .find(|p| p.accepts(reference))
            .ok_or_else(|| Error::value(format!("{:?} doesn't match any known page", reference.canonical())))?;
        debug!("{} -> {}", reference.canonical(), profile);
        Ok(profile)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Rider => "rider",
            Profile::RiderResults => "rider_results",
            Profile::Race => "race",
            Profile::Stage => "stage",
            Profile::RaceStartlist => "race_startlist",
            Profile::RaceClimbs => "race_climbs",
            Profile::RaceCombativeRiders => "race_combative_riders",
            Profile::Team => "team",
            Profile::Ranking => "ranking",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a failing extractor means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The data may be missing by design; absence is an expected error
    Optional,
    /// The data is always present; absence is a structural failure
    Required,
}

pub struct Extractor<P> {
    pub name: &'static str,
    pub policy: Policy,
    run: fn(&P) -> Result<Value>,
}

impl<P> Extractor<P> {
    pub fn optional(name: &'static str, run: fn(&P) -> Result<Value>) -> Self {
        Extractor {
            name,
            policy: Policy::Optional,
            run,
        }
    }

    pub fn required(name: &'static str, run: fn(&P) -> Result<Value>) -> Self {
        Extractor {
            name,
            policy: Policy::Required,
            run,
        }
    }

    pub fn call(&self, page: &P) -> Result<Value> {
        let res = (self.run)(page);
        match self.policy {
            Policy::Optional => res,
            Policy::Required => res.map_err(Error::into_unexpected),
        }
    }
}

/// What `parse` does with failing extractors
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Error kinds that don't abort parsing
    pub ignore: Vec<ErrorKind>,
    /// Whether an ignored failure still shows up, as null
    pub fill_on_ignored: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            ignore: vec![ErrorKind::Expected],
            fill_on_ignored: true,
        }
    }
}

impl ParseOptions {
    /// Every failure aborts parsing
    pub fn strict() -> Self {
        ParseOptions {
            ignore: Vec::new(),
            fill_on_ignored: true,
        }
    }
}

pub(crate) fn validate_document(document: &Document) -> Result<()> {
    if let Some(title) = document.first_opt("title")? {
        if text_of(title, None).to_lowercase().contains("page not found") {
            return Err(Error::value("invalid page: page not found"));
        }
    }
    if let Some(banner) = document.first_opt("div.page-content > div")? {
        if text_of(banner, None).contains("temporarily unavailable") {
            return Err(Error::value("invalid page: page temporarily unavailable"));
        }
    }
    Ok(())
}

pub(crate) fn has_heading(document: &Document, needle: &str) -> Result<bool> {
    let needle = needle.to_lowercase();
    Ok(document
        .all("h1, h2, h3, h4")?
        .into_iter()
        .any(|h| text_of(h, None).to_lowercase().contains(&needle)))
}

/// Value of the `<div>Label:</div><div>value</div>` info list entry
/// labelled `label`
pub(crate) fn info_value(document: &Document, label: &str) -> Result<String> {
    let label = label.to_lowercase();
    for li in document.all("ul.infolist > li")? {
        let mut cells = child_elements(li).filter(|c| c.value().name() == "div");
        let (Some(key), Some(value)) = (cells.next(), cells.next()) else {
            continue;
        };
        let key = text_of(key, None).trim_end_matches(':').trim().to_lowercase();
        if key == label {
            return Ok(normalize_ws(&text_of(value, None)));
        }
    }
    Err(Error::expected(format!("no {:?} in the info list", label)))
}

/// Like [`info_value`], but an empty value is absent too
pub(crate) fn info_value_nonempty(document: &Document, label: &str) -> Result<String> {
    let value = info_value(document, label)?;
    match value.as_str() {
        "" | "-" => Err(Error::expected(format!("{:?} is empty", label))),
        _ => Ok(value),
    }
}

/// The main heading of the page title block
pub(crate) fn page_title(document: &Document) -> Result<ElementRef<'_>> {
    document.first(".page-title > .main > h1")
}

/// Flag next to the page title
pub(crate) fn title_flag(document: &Document) -> Result<ElementRef<'_>> {
    let main = document.first(".page-title > .main")?;
    scoped_first(main, "span.flag")?.ok_or_else(|| Error::expected("no flag in the page title"))
}

pub(crate) fn parse_table(element: ElementRef, fields: &[&str]) -> Result<RowList> {
    let mut tp = TableParser::new(element)?;
    tp.parse(fields)?;
    Ok(tp.into_table())
}

/// A reference bound to its document under one profile
pub trait PageProfile: Sized {
    const PROFILE: Profile;

    fn from_parts(reference: Reference, document: Document) -> Self;
    fn reference(&self) -> &Reference;
    fn document(&self) -> &Document;

    /// Named extractors, in the order `parse` runs them
    fn extractors() -> Vec<Extractor<Self>>;

    /// Profile specific checks, run after the generic page validity check
    fn check_content(&self) -> Result<()> {
        Ok(())
    }

    fn new(url: &str, html: &str) -> Result<Self> {
        Self::with_reference(Reference::parse(url)?, html)
    }

    fn with_reference(reference: Reference, html: &str) -> Result<Self> {
        if !Self::PROFILE.accepts(&reference) {
            return Err(Error::value(format!(
                "{:?} is not a {} page",
                reference.canonical(),
                Self::PROFILE
            )));
        }
        let page = Self::from_parts(reference, Document::parse(html));
        validate_document(page.document())?;
        page.check_content()?;
        Ok(page)
    }

    /// Runs every extractor. Failures of an ignored kind become null (or are
    /// left out), anything else is returned.
    fn parse(&self, options: &ParseOptions) -> Result<Row> {
        let mut res = Row::new();
        for extractor in Self::extractors() {
            match extractor.call(self) {
                Ok(value) => res.insert(extractor.name, value),
                Err(e) if options.ignore.contains(&e.kind()) => {
                    debug!("{}: ignoring {}", extractor.name, e);
                    if options.fill_on_ignored {
                        res.insert(extractor.name, Value::Null);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(res)
    }
}

/// A page of any profile
pub enum Page {
    Rider(Rider),
    RiderResults(RiderResults),
    Race(Race),
    Stage(Stage),
    RaceStartlist(RaceStartlist),
    RaceClimbs(RaceClimbs),
    RaceCombativeRiders(RaceCombativeRiders),
    Team(Team),
    Ranking(Ranking),
}

macro_rules! each_page {
    ($page:expr, $p:ident => $body:expr) => {
        match $page {
            Page::Rider($p) => $body,
            Page::RiderResults($p) => $body,
            Page::Race($p) => $body,
            Page::Stage($p) => $body,
            Page::RaceStartlist($p) => $body,
            Page::RaceClimbs($p) => $body,
            Page::RaceCombativeRiders($p) => $body,
            Page::Team($p) => $body,
            Page::Ranking($p) => $body,
        }
    };
}

fn extractor_names<P: PageProfile>() -> Vec<&'static str> {
    P::extractors().iter().map(|e| e.name).collect()
}

impl Page {
    /// Binds `html` to the profile `url` dispatches to
    pub fn from_html(url: &str, html: &str) -> Result<Page> {
        let reference = Reference::parse(url)?;
        Page::with_reference(reference, html)
    }

    pub fn with_reference(reference: Reference, html: &str) -> Result<Page> {
        Ok(match Profile::dispatch(&reference)? {
            Profile::Rider => Page::Rider(Rider::with_reference(reference, html)?),
            Profile::RiderResults => Page::RiderResults(RiderResults::with_reference(reference, html)?),
            Profile::Race => Page::Race(Race::with_reference(reference, html)?),
            Profile::Stage => Page::Stage(Stage::with_reference(reference, html)?),
            Profile::RaceStartlist => Page::RaceStartlist(RaceStartlist::with_reference(reference, html)?),
            Profile::RaceClimbs => Page::RaceClimbs(RaceClimbs::with_reference(reference, html)?),
            Profile::RaceCombativeRiders => {
                Page::RaceCombativeRiders(RaceCombativeRiders::with_reference(reference, html)?)
            }
            Profile::Team => Page::Team(Team::with_reference(reference, html)?),
            Profile::Ranking => Page::Ranking(Ranking::with_reference(reference, html)?),
        })
    }

    pub fn profile(&self) -> Profile {
        match self {
            Page::Rider(_) => Profile::Rider,
            Page::RiderResults(_) => Profile::RiderResults,
            Page::Race(_) => Profile::Race,
            Page::Stage(_) => Profile::Stage,
            Page::RaceStartlist(_) => Profile::RaceStartlist,
            Page::RaceClimbs(_) => Profile::RaceClimbs,
            Page::RaceCombativeRiders(_) => Profile::RaceCombativeRiders,
            Page::Team(_) => Profile::Team,
            Page::Ranking(_) => Profile::Ranking,
        }
    }

    pub fn reference(&self) -> &Reference {
        each_page!(self, p => p.reference())
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        match self {
            Page::Rider(_) => extractor_names::<Rider>(),
            Page::RiderResults(_) => extractor_names::<RiderResults>(),
            Page::Race(_) => extractor_names::<Race>(),
            Page::Stage(_) => extractor_names::<Stage>(),
            Page::RaceStartlist(_) => extractor_names::<RaceStartlist>(),
            Page::RaceClimbs(_) => extractor_names::<RaceClimbs>(),
            Page::RaceCombativeRiders(_) => extractor_names::<RaceCombativeRiders>(),
            Page::Team(_) => extractor_names::<Team>(),
            Page::Ranking(_) => extractor_names::<Ranking>(),
        }
    }

    pub fn parse(&self, options: &ParseOptions) -> Result<Row> {
        each_page!(self, p => p.parse(options))
    }

    /// [`parse`](Self::parse) with the default options
    pub fn parse_all(&self) -> Result<Row> {
        self.parse(&ParseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_of(url: &str) -> Result<Profile> {
        Profile::dispatch(&Reference::parse(url)?)
    }

    #[test]
    fn test_dispatch() {
        let cases = [
            ("rider/tadej-pogacar", Profile::Rider),
            ("https://www.procyclingstats.com/rider/tadej-pogacar/results", Profile::RiderResults),
            ("rider/tadej-pogacar/results/final-5k-analysis", Profile::RiderResults),
            ("race/tour-de-france/2022", Profile::Race),
            ("race/tour-de-france/2022/overview/", Profile::Race),
            ("race/tour-de-france/2022/stage-18", Profile::Stage),
            ("race/tour-de-france/2022/prologue", Profile::Stage),
            ("race/tour-de-france/2022/stage-18-gc", Profile::Stage),
            ("race/tour-de-france/2022/gc", Profile::Stage),
            ("race/ronde-van-vlaanderen/2022/result", Profile::Stage),
            ("race/tour-de-france/2022/startlist", Profile::RaceStartlist),
            ("race/tour-de-france/2022/route/climbs", Profile::RaceClimbs),
            ("race/tour-de-france/2022/results/combative-riders", Profile::RaceCombativeRiders),
            ("team/uae-team-emirates-2022", Profile::Team),
            ("rankings/me/individual", Profile::Ranking),
            ("rankings.php?p=me&s=season-individual", Profile::Ranking),
        ];
        for (url, expected) in cases {
            assert_eq!(profile_of(url).unwrap(), expected, "{}", url);
        }
    }

    #[test]
    fn test_no_reference_matches_two_profiles() {
        let urls = [
            "rider/tadej-pogacar",
            "rider/tadej-pogacar/results",
            "race/tour-de-france/2022",
            "race/tour-de-france/2022/stage-1",
            "race/tour-de-france/2022/startlist",
            "race/tour-de-france/2022/route/climbs",
            "race/tour-de-france/2022/results/combative-riders",
            "team/ineos-grenadiers-2022",
            "rankings/me/teams",
        ];
        for url in urls {
            let r = Reference::parse(url).unwrap();
            let matching = Profile::ALL.iter().filter(|p| p.accepts(&r)).count();
            assert_eq!(matching, 1, "{}", url);
        }
    }

    #[test]
    fn test_unknown_reference() {
        assert!(matches!(profile_of("calendar/uci-world-tour"), Err(Error::Value(_))));
        assert!(matches!(profile_of("race/tour-de-france"), Err(Error::Value(_))));
    }

    #[test]
    fn test_invalid_pages() {
        let not_found = "<html><head><title>Page not found</title></head><body></body></html>";
        assert!(matches!(Page::from_html("team/ineos-2022", not_found), Err(Error::Value(_))));

        let unavailable = r#"<html><body><div class="page-content"><div>Due to technical difficulties this page is temporarily unavailable.</div></div></body></html>"#;
        assert!(matches!(Page::from_html("team/ineos-2022", unavailable), Err(Error::Value(_))));
    }

    #[test]
    fn test_profile_rejects_foreign_reference() {
        let html = "<html><body></body></html>";
        assert!(matches!(Team::new("rider/tadej-pogacar", html), Err(Error::Value(_))));
    }
}
