use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};
use tui_choropleth::bind::{bind, Scene};
use tui_choropleth::color::parse_palette;
use tui_choropleth::config;
use tui_choropleth::data::{GeometrySet, StatisticRecord};
use tui_choropleth::map::{MapRenderer, Viewport};
use tui_choropleth::scale::Scales;

const GRID: usize = 60;

/// GRID x GRID unit squares, roughly the county count
fn fixture() -> (GeometrySet, Vec<StatisticRecord>) {
    let mut features = Vec::with_capacity(GRID * GRID);
    let mut records = Vec::with_capacity(GRID * GRID);
    for row in 0..GRID {
        for col in 0..GRID {
            let (x, y) = (col as f64 * 10.0, row as f64 * 10.0);
            let key = format!("{}", row * GRID + col);
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![vec![
                    vec![x, y],
                    vec![x + 10.0, y],
                    vec![x + 10.0, y + 10.0],
                    vec![x, y + 10.0],
                    vec![x, y],
                ]]))),
                id: Some(Id::String(key.clone())),
                properties: None,
                foreign_members: None,
            });
            records.push(StatisticRecord {
                key,
                name: format!("Region {row}-{col}"),
                group: "XX".into(),
                metric: ((row * 7 + col * 13) % 70) as f64 + 2.5,
            });
        }
    }

    let extent = GRID as f64 * 10.0;
    let mesh = (1..GRID)
        .map(|i| vec![vec![i as f64 * 10.0, 0.0], vec![i as f64 * 10.0, extent]])
        .collect();

    let geometry = GeometrySet {
        regions: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        mesh: Geometry::new(Value::MultiLineString(mesh)),
    };
    (geometry, records)
}

fn scene() -> Scene {
    let (geometry, records) = fixture();
    let palette = parse_palette(&config::PALETTE).unwrap();
    let scales = Scales::build(&records, &palette, config::LEGEND_RANGE).unwrap();
    bind(&geometry, &records, &scales, config::TITLE, config::SUBTITLE).unwrap()
}

fn bench_scales(c: &mut Criterion) {
    let (_, records) = fixture();
    let palette = parse_palette(&config::PALETTE).unwrap();

    c.bench_function("scales_build", |b| {
        b.iter(|| Scales::build(black_box(&records), &palette, config::LEGEND_RANGE).unwrap())
    });

    let scales = Scales::build(&records, &palette, config::LEGEND_RANGE).unwrap();
    c.bench_function("color_of_all_records", |b| {
        b.iter(|| {
            records
                .iter()
                .map(|r| scales.color.color_of(black_box(r.metric)))
                .fold(0u32, |acc, rgb| acc.wrapping_add(rgb.r as u32))
        })
    });
}

fn bench_bind(c: &mut Criterion) {
    let (geometry, records) = fixture();
    let palette = parse_palette(&config::PALETTE).unwrap();
    let scales = Scales::build(&records, &palette, config::LEGEND_RANGE).unwrap();

    c.bench_function("bind", |b| {
        b.iter(|| bind(black_box(&geometry), &records, &scales, "", "").unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let renderer = MapRenderer::new(scene());
    let (width, height) = (200, 60);
    let mut viewport = Viewport::fit(renderer.scene().bounds, width * 2, height * 4);

    c.bench_function("render_fit", |b| {
        b.iter(|| renderer.render(width, height, black_box(&viewport)))
    });

    viewport.zoom_in();
    viewport.zoom_in();
    c.bench_function("render_zoomed", |b| {
        b.iter(|| renderer.render(width, height, black_box(&viewport)))
    });

    c.bench_function("hit_test", |b| {
        b.iter(|| renderer.hit_test(black_box(301.5), black_box(299.5)))
    });
}

criterion_group!(benches, bench_scales, bench_bind, bench_render);
criterion_main!(benches);
