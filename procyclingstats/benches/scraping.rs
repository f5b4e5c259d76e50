use criterion::{black_box, criterion_group, criterion_main, Criterion};
use procyclingstats::{Page, PageProfile, Stage, Team};

const STAGE_HTML: &'static str = include_str!("../test-data/stage.html");

const STAGE_TTT_HTML: &'static str = include_str!("../test-data/stage_ttt.html");

const TEAM_HTML: &'static str = include_str!("../test-data/team.html");

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("stage results (3 riders, 4 tabs)", |b| {
        b.iter(|| {
            let stage = Stage::new("race/tour-de-france/2022/stage-18", black_box(STAGE_HTML)).unwrap();
            stage.results(&[]).unwrap()
        })
    });

    c.bench_function("stage parse_all", |b| {
        b.iter(|| {
            Page::from_html("race/tour-de-france/2022/stage-18", black_box(STAGE_HTML))
                .unwrap()
                .parse_all()
                .unwrap()
        })
    });

    c.bench_function("team time trial results with gc join", |b| {
        b.iter(|| {
            let stage = Stage::new("race/tour-de-france/2019/stage-2", black_box(STAGE_TTT_HTML)).unwrap();
            stage.results(&[]).unwrap()
        })
    });

    c.bench_function("team riders (4 roster tabs)", |b| {
        b.iter(|| {
            let team = Team::new("team/uae-team-emirates-2022", black_box(TEAM_HTML)).unwrap();
            team.riders(&[]).unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
