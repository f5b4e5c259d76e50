use crate::{
    fetch_profile, format_time, join_tables, Error, ErrorKind, Page, PageProfile, ParseOptions, Profile, Race,
    RaceClimbs, RaceCombativeRiders, RaceStartlist, Ranking, Reference, Rider, Row, RowList, Stage, Team, Value,
};
use crate::value::select_fields;

const RIDER: &str = include_str!("../../test-data/rider.html");
const STAGE: &str = include_str!("../../test-data/stage.html");
const STAGE_TTT: &str = include_str!("../../test-data/stage_ttt.html");
const RACE_ONE_DAY: &str = include_str!("../../test-data/race_one_day.html");
const RANKING: &str = include_str!("../../test-data/ranking_individual.html");
const TEAM: &str = include_str!("../../test-data/team.html");
const STARTLIST: &str = include_str!("../../test-data/startlist.html");
const CLIMBS: &str = include_str!("../../test-data/climbs.html");
const COMBATIVE: &str = include_str!("../../test-data/combative.html");

const FIXTURES: [(&str, &str, Profile); 9] = [
    ("rider/jure-novak", RIDER, Profile::Rider),
    ("race/tour-de-france/2022/stage-18", STAGE, Profile::Stage),
    ("race/tour-de-france/2019/stage-2", STAGE_TTT, Profile::Stage),
    ("race/ronde-van-vlaanderen/2022", RACE_ONE_DAY, Profile::Race),
    ("rankings/me/individual", RANKING, Profile::Ranking),
    ("team/uae-team-emirates-2022", TEAM, Profile::Team),
    ("race/tour-de-france/2022/startlist", STARTLIST, Profile::RaceStartlist),
    ("race/tour-de-france/2022/route/climbs", CLIMBS, Profile::RaceClimbs),
    ("race/tour-de-france/2022/results/combative-riders", COMBATIVE, Profile::RaceCombativeRiders),
];

fn column<'r>(rows: &'r RowList, field: &str) -> Vec<&'r Value> {
    rows.iter().map(|r| r.get(field).unwrap_or(&Value::Null)).collect()
}

fn texts(rows: &RowList, field: &str) -> Vec<String> {
    rows.iter()
        .map(|r| r.get(field).and_then(Value::as_str).unwrap_or("").to_string())
        .collect()
}

#[test]
fn test_rider_profile() {
    let rider = Rider::new("https://www.procyclingstats.com/rider/jure-novak", RIDER).unwrap();
    assert_eq!(rider.name().unwrap(), "Jure Novak");
    assert_eq!(rider.birthdate().unwrap(), "1990-1-1");
    assert_eq!(rider.weight().unwrap(), Value::Int(72));
    assert_eq!(rider.height().unwrap(), 1.80);
    assert_eq!(rider.nationality().unwrap(), "SI");
    assert_eq!(rider.place_of_birth().unwrap(), "Ljubljana");
    assert_eq!(rider.image_url().unwrap(), "images/riders/bp/jure-novak-2023.jpg");

    let teams = rider.seasons_teams(&[]).unwrap();
    assert_eq!(teams.len(), 3);
    assert_eq!(column(&teams, "season"), vec![&Value::Int(2023), &Value::Int(2023), &Value::Int(2022)]);
    assert_eq!(texts(&teams, "since"), vec!["08-01", "01-01", "01-01"]);
    assert_eq!(texts(&teams, "until"), vec!["12-31", "07-31", "12-31"]);
    assert_eq!(texts(&teams, "class"), vec!["WT", "CT", "CT"]);

    let seasons = rider.points_per_season(&[]).unwrap();
    assert_eq!(seasons[0].get("points"), Some(&Value::Int(412)));
    assert_eq!(seasons[1].get("rank"), Some(&Value::Int(231)));

    let specialities = rider.points_per_speciality().unwrap();
    assert_eq!(specialities.get("one_day_races"), Some(&Value::Int(1204)));
    assert_eq!(specialities.get("gc"), Some(&Value::Int(864)));
}

#[test]
fn test_stage_results_times_are_absolute() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    let results = stage.results(&[]).unwrap();
    assert_eq!(texts(&results, "time"), vec!["4:20:15", "4:20:25", "4:21:15"]);
    assert_eq!(texts(&results, "bonus"), vec!["0:00:10", "0:00:06", "0:00:00"]);
    assert_eq!(column(&results, "rider_number"), vec![&Value::Int(11), &Value::Int(1), &Value::Int(24)]);
    assert_eq!(texts(&results, "status"), vec!["DF", "DF", "DF"]);
    assert_eq!(results[0].get("nationality"), Some(&Value::text("DK")));
    assert_eq!(results[2].get("uci_points"), Some(&Value::Int(35)));
}

#[test]
fn test_stage_scalars() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    assert_eq!(stage.race_name().unwrap(), "Tour de France");
    assert!(!stage.is_one_day_race().unwrap());
    assert_eq!(stage.stage_type().unwrap(), "RR");
    assert_eq!(stage.date().unwrap(), Value::text("2022-07-21"));
    assert_eq!(stage.distance().unwrap(), 143.2);
    assert_eq!(stage.vertical_meters().unwrap(), 4187);
    assert_eq!(stage.profile_score().unwrap(), 310);
    assert_eq!(stage.profile_icon().unwrap(), "p5");
    assert_eq!(stage.start_time().unwrap(), "13:05");
    assert_eq!(stage.won_how().unwrap(), "Solo");
    assert_eq!(stage.race_startlist_quality_score().unwrap(), (1089, 1134));
    assert_eq!(stage.avg_speed_winner().unwrap(), 37.939);
}

#[test]
fn test_stage_classifications() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();

    let gc = stage.gc(&["rider_url", "prev_rank", "time"]).unwrap();
    assert_eq!(texts(&gc, "time"), vec!["71:53:34", "71:57:00", "72:01:34"]);
    assert_eq!(gc[1].get("prev_rank"), Some(&Value::Int(2)));

    let points = stage.points(&["rider_name", "points"]).unwrap();
    assert_eq!(column(&points, "points"), vec![&Value::Int(452), &Value::Int(218)]);

    let teams = stage.teams(&["team_name", "time"]).unwrap();
    assert_eq!(texts(&teams, "time"), vec!["216:03:29", "216:19:27"]);

    assert!(stage.kom(&[]).unwrap().is_empty());
    assert!(stage.youth(&[]).unwrap().is_empty());

    let climbs = stage.climbs(&[]).unwrap();
    assert_eq!(texts(&climbs, "climb_url")[2], "location/hautacam");
}

#[test]
fn test_team_time_trial_results() {
    let stage = Stage::new("race/tour-de-france/2019/stage-2", STAGE_TTT).unwrap();
    assert_eq!(stage.stage_type().unwrap(), "TTT");

    let results = stage.results(&["rank", "time", "bonus", "team_url"]).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(column(&results, "rank"), vec![&Value::Int(1), &Value::Int(1), &Value::Int(2), &Value::Int(2)]);
    assert_eq!(texts(&results, "time"), vec!["5:00:00", "5:00:00", "5:00:30", "5:00:30"]);
    assert!(results.iter().all(|r| r.get("bonus") == Some(&Value::text("0:00:00"))));
    assert_eq!(texts(&results, "team_url")[2], "team/team-ineos-2019");
}

#[test]
fn test_team_time_trial_fields_from_gc() {
    let stage = Stage::new("race/tour-de-france/2019/stage-2", STAGE_TTT).unwrap();
    let results = stage.results(&["rider_url", "nationality", "rider_number", "pcs_points"]).unwrap();
    assert_eq!(texts(&results, "nationality"), vec!["NL", "BE", "CO", "GB"]);
    assert_eq!(column(&results, "rider_number"), vec![&Value::Int(7), &Value::Int(8), &Value::Int(2), &Value::Int(1)]);
    assert_eq!(results[0].get("pcs_points"), Some(&Value::Int(50)));
}

#[test]
fn test_one_day_race_overview() {
    let race = Race::new("race/ronde-van-vlaanderen/2022", RACE_ONE_DAY).unwrap();
    assert!(race.is_one_day_race().unwrap());
    assert!(race.stages(&[]).unwrap().is_empty());
    assert!(race.stages_winners(&[]).unwrap().is_empty());
    assert_eq!(race.name().unwrap(), "Ronde van Vlaanderen");
    assert_eq!(race.year().unwrap(), 2022);
    assert_eq!(race.edition().unwrap(), 106);
    assert_eq!(race.nationality().unwrap(), "BE");
    assert_eq!(race.startdate().unwrap(), Value::text("2022-04-03"));
    assert_eq!(race.uci_tour().unwrap(), "UCI Worldtour");
    assert_eq!(race.prev_editions_select().unwrap().len(), 3);
}

#[test]
fn test_reference_spellings_are_one_page() {
    let spellings = [
        "rider/tadej-pogacar",
        "/rider/tadej-pogacar/",
        "https://www.procyclingstats.com/rider/tadej-pogacar",
        "http://procyclingstats.com/Rider/Tadej-Pogacar#teams",
    ];
    let first = Reference::parse(spellings[0]).unwrap();
    for s in &spellings[1..] {
        assert_eq!(Reference::parse(s).unwrap(), first, "{}", s);
    }
    assert_eq!(first.absolute(), "https://www.procyclingstats.com/rider/tadej-pogacar");

    let a = Reference::parse("rankings.php?s=season-individual&nation=&offset=0&p=me").unwrap();
    let b = Reference::parse("rankings.php?p=me&s=season-individual").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.canonical(), "rankings?p=me&s=season-individual");
}

#[test]
fn test_ranking_of_another_kind_is_expected() {
    let ranking = Ranking::new("rankings/me/individual", RANKING).unwrap();
    assert!(matches!(ranking.team_ranking(&[]), Err(Error::Expected(_))));

    let riders = ranking.individual_ranking(&[]).unwrap();
    assert_eq!(column(&riders, "points"), vec![&Value::Int(3490), &Value::Int(3356), &Value::Int(3112)]);
    assert_eq!(column(&riders, "prev_rank"), vec![&Value::Int(1), &Value::Int(3), &Value::Int(2)]);
    assert_eq!(texts(&riders, "nationality"), vec!["SI", "BE", "BE"]);
    assert_eq!(ranking.nation_select().unwrap().len(), 3);
    assert!(matches!(ranking.team_select(), Err(Error::Expected(_))));
}

#[test]
fn test_parse_options() {
    let page = Page::from_html("rankings/me/individual", RANKING).unwrap();

    let parsed = page.parse_all().unwrap();
    assert_eq!(parsed.get("ranking_type"), Some(&Value::text("individual")));
    assert_eq!(parsed.get("team_ranking"), Some(&Value::Null));
    assert_eq!(parsed.get("individual_ranking").and_then(Value::as_rows).map(Vec::len), Some(3));

    let quiet = ParseOptions {
        fill_on_ignored: false,
        ..ParseOptions::default()
    };
    let parsed = page.parse(&quiet).unwrap();
    assert!(!parsed.contains_key("team_ranking"));

    let err = page.parse(&ParseOptions::strict()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expected);
}

#[test]
fn test_complete_stage_parses_strictly() {
    let page = Page::from_html("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    let parsed = page.parse(&ParseOptions::strict()).unwrap();
    assert_eq!(parsed.keys().collect::<Vec<_>>(), page.extractor_names());
}

#[test]
fn test_team_roster_join() {
    let team = Team::new("team/uae-team-emirates-2022", TEAM).unwrap();
    assert_eq!(team.display_name().unwrap(), "UAE Team Emirates");
    assert_eq!(team.team_status().unwrap(), "WT");
    assert_eq!(team.abbreviation().unwrap(), "UAD");
    assert_eq!(team.wins_count().unwrap(), 61);
    assert_eq!(team.uci_ranking_position().unwrap(), 2);

    let riders = team.riders(&[]).unwrap();
    assert_eq!(
        texts(&riders, "rider_url"),
        vec!["rider/tadej-pogacar", "rider/mikkel-bjerg", "rider/marc-soler"]
    );
    let bjerg = &riders[1];
    assert_eq!(bjerg.get("age"), Some(&Value::Int(23)));
    assert_eq!(bjerg.get("since"), Some(&Value::text("08-01")));
    assert_eq!(bjerg.get("ranking_position"), Some(&Value::Int(512)));
    assert_eq!(bjerg.get("ranking_points"), Some(&Value::Int(95)));
    assert_eq!(bjerg.get("career_points"), Some(&Value::Int(1204)));
}

#[test]
fn test_startlist_by_team() {
    let startlist = RaceStartlist::new("race/tour-de-france/2022/startlist", STARTLIST).unwrap();
    let riders = startlist.startlist(&[]).unwrap();
    assert_eq!(riders.len(), 4);
    assert_eq!(column(&riders, "rider_number"), vec![&Value::Int(1), &Value::Int(2), &Value::Int(11), &Value::Int(12)]);
    assert_eq!(texts(&riders, "team_name")[0], "UAE Team Emirates");
    assert_eq!(texts(&riders, "team_url")[3], "team/jumbo-visma-2022");
}

#[test]
fn test_race_climbs() {
    let page = RaceClimbs::new("race/tour-de-france/2022/route/climbs", CLIMBS).unwrap();
    let climbs = page.climbs(&[]).unwrap();
    assert_eq!(texts(&climbs, "climb_name"), vec!["Col du Granon", "Hautacam", "Col de Spandelles"]);
    assert_eq!(climbs[0].get("top"), Some(&Value::Int(2413)));
    assert_eq!(climbs[2].get("km_before_finnish"), Some(&Value::Float(31.2)));
    assert_eq!(climbs[1].get("steepness"), Some(&Value::Float(7.8)));
}

#[test]
fn test_combative_riders() {
    let page = RaceCombativeRiders::new("race/tour-de-france/2022/results/combative-riders", COMBATIVE).unwrap();
    let riders = page.combative_riders(&[]).unwrap();
    assert_eq!(texts(&riders, "stage_url"), vec!["race/tour-de-france/2022/stage-2", "race/tour-de-france/2022/stage-3"]);
    assert_eq!(texts(&riders, "nationality"), vec!["DK", "FR"]);
}

#[test]
fn test_fixtures_dispatch() {
    for (url, html, profile) in FIXTURES {
        let page = Page::from_html(url, html).unwrap();
        assert_eq!(page.profile(), profile, "{}", url);
    }
}

#[test]
fn test_parsing_is_idempotent() {
    for (url, html, _) in FIXTURES {
        let page = Page::from_html(url, html).unwrap();
        let first = page.parse_all().unwrap();
        let second = page.parse_all().unwrap();
        assert_eq!(first, second, "{}", url);
        assert_eq!(first.keys().collect::<Vec<_>>(), page.extractor_names(), "{}", url);
    }
}

#[test]
fn test_requested_fields_only() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    let requested = ["time", "rider_name", "rank"];
    for row in stage.results(&requested).unwrap() {
        assert_eq!(row.keys().collect::<Vec<_>>(), requested.to_vec());
    }
    assert!(matches!(stage.results(&["rider_name", "shoe_size"]), Err(Error::Value(_))));
}

#[test]
fn test_requested_fields_match_the_default_table() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    let all = stage.results(&[]).unwrap();
    let subsets: [&[&str]; 5] = [
        &["time"],
        &["rank", "time"],
        &["bonus", "rider_url"],
        &["status"],
        &["rider_name", "status", "time"],
    ];
    for fields in subsets {
        assert_eq!(stage.results(fields).unwrap(), select_fields(&all, fields), "{:?}", fields);
    }
    let gc = stage.gc(&[]).unwrap();
    assert_eq!(stage.gc(&["rider_url", "time"]).unwrap(), select_fields(&gc, &["rider_url", "time"]));

    let ttt = Stage::new("race/tour-de-france/2019/stage-2", STAGE_TTT).unwrap();
    let all = ttt.results(&[]).unwrap();
    for fields in [&["rank", "rider_url", "time"][..], &["nationality", "age", "rider_url"][..]] {
        assert_eq!(ttt.results(fields).unwrap(), select_fields(&all, fields), "{:?}", fields);
    }

    let team = Team::new("team/uae-team-emirates-2022", TEAM).unwrap();
    let all = team.riders(&[]).unwrap();
    for fields in [&["age", "rider_url"][..], &["rider_name", "career_points"][..]] {
        assert_eq!(team.riders(fields).unwrap(), select_fields(&all, fields), "{:?}", fields);
    }

    let race = Race::new("race/ronde-van-vlaanderen/2022", RACE_ONE_DAY).unwrap();
    let all = race.stages(&[]).unwrap();
    assert_eq!(race.stages(&["stage_url"]).unwrap(), select_fields(&all, &["stage_url"]));
}

#[test]
fn test_rows_are_aligned() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    for rows in [stage.results(&[]).unwrap(), stage.gc(&[]).unwrap(), stage.teams(&[]).unwrap()] {
        let keys: Vec<&str> = rows[0].keys().collect();
        assert!(rows.iter().all(|r| r.keys().collect::<Vec<_>>() == keys));
    }
}

#[test]
fn test_parsed_times_are_canonical() {
    let stage = Stage::new("race/tour-de-france/2022/stage-18", STAGE).unwrap();
    for time in texts(&stage.gc(&["time"]).unwrap(), "time") {
        assert_eq!(format_time(&time).unwrap(), time);
    }
}

#[test]
fn test_join_keeps_primary_rows() {
    let team = Team::new("team/uae-team-emirates-2022", TEAM).unwrap();
    let primary = team.riders(&["rider_url", "career_points"]).unwrap();
    let ages = team.riders(&["rider_url", "age"]).unwrap();
    let joined = join_tables(&primary, &ages, "rider_url", false).unwrap();
    assert_eq!(texts(&joined, "rider_url"), texts(&primary, "rider_url"));
    for (row, base) in joined.iter().zip(&primary) {
        assert_eq!(row.get("career_points"), base.get("career_points"));
        assert!(row.contains_key("age"));
    }

    let partial: Vec<Row> = ages.into_iter().take(1).collect();
    assert!(matches!(join_tables(&primary, &partial, "rider_url", false), Err(Error::Value(_))));
    assert_eq!(join_tables(&primary, &partial, "rider_url", true).unwrap().len(), 1);
}

#[test]
fn test_invalid_pages() {
    let missing = "<html><head><title>Page not found</title></head><body></body></html>";
    assert!(matches!(Page::from_html("rider/nobody", missing), Err(Error::Value(_))));
    assert!(matches!(Rider::new("team/uae-team-emirates-2022", TEAM), Err(Error::Value(_))));
}

#[tokio::test]
async fn test_fetch_rejects_unknown_references() {
    let err = Page::fetch("race/tour-de-france").await.err().unwrap();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Value(_))));

    let err = fetch_profile::<Rider>("team/uae-team-emirates-2022").await.err().unwrap();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Value(_))));
}
