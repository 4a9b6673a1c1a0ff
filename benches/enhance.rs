use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voxcue::config::Config;
use voxcue::pipeline;
use voxcue::resolve::{self, EnhanceOverrides};
use voxcue::segment::Segment;

/// A transcript shaped like real dictation: a mix of compliant segments and
/// long multi-clause ones the splitter has to work on.
fn fixture_segments() -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut t = 0.0;
    for i in 0..50 {
        let (text, duration) = if i % 3 == 0 {
            (
                "This is a considerably longer segment, with several clauses, \
                 that keeps going well past the display limit. It even has a \
                 second sentence tacked on for good measure.",
                12.0,
            )
        } else {
            ("A short remark.", 2.0)
        };
        segments.push(Segment::new(text, t, t + duration));
        t += duration + 0.5;
    }
    segments
}

fn bench_split_pipeline(c: &mut Criterion) {
    let overrides =
        EnhanceOverrides::from_json(r#"{ "pipeline": "split", "split": { "max_chars": 42 } }"#)
            .unwrap();
    let resolved = resolve::resolve(&Config::default(), Some(&overrides)).unwrap();
    let segments = fixture_segments();

    c.bench_function("split_50_segments", |b| {
        b.iter(|| {
            let mut pipeline = pipeline::build(resolved.clone()).unwrap();
            let outcome = pipeline.run(black_box(segments.clone()), None).unwrap();
            black_box(outcome.segments.len())
        })
    });
}

fn bench_resolution(c: &mut Criterion) {
    let process = Config::default();
    let overrides = EnhanceOverrides::from_json(
        r#"{ "pipeline": "vad,refine,split", "vad": { "silero_threshold": 0.4 } }"#,
    )
    .unwrap();

    c.bench_function("resolve_config", |b| {
        b.iter(|| resolve::resolve(black_box(&process), Some(black_box(&overrides))).unwrap())
    });
}

criterion_group!(benches, bench_split_pipeline, bench_resolution);
criterion_main!(benches);
