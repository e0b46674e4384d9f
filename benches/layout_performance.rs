//! Layout engine benchmarks
//!
//! Measures paginated layout of long documents: plain paragraphs, documents
//! with floats and footnotes, and runs of break-avoiding blocks that force
//! relayouts.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use flowbox::{DocumentSource, LayoutPipeline};
use serde_json::{Value, json};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                     tempor incididunt ut labore et dolore magna aliqua.";

fn document(children: Vec<Value>) -> DocumentSource {
    let doc = json!({
        "pageMasters": {
            "masters": { "default": { "size": "A4", "margins": "2cm" } },
            "defaultMaster": "default"
        },
        "root": { "type": "block", "children": children }
    });
    serde_json::from_value(doc).expect("Failed to build document")
}

fn paragraph(content: &str) -> Value {
    json!({ "type": "block", "children": [{ "type": "text", "content": content }] })
}

fn paragraphs(count: usize) -> DocumentSource {
    document((0..count).map(|_| paragraph(LOREM)).collect())
}

fn floats_and_footnotes(count: usize) -> DocumentSource {
    let children = (0..count)
        .map(|i| {
            let side = if i % 2 == 0 { "left" } else { "right" };
            json!({
                "type": "block",
                "children": [
                    {
                        "type": "block",
                        "style": { "float": side, "width": { "pt": 120.0 }, "height": { "pt": 40.0 } }
                    },
                    { "type": "text", "content": LOREM },
                    {
                        "type": "block",
                        "style": { "float": "footnote" },
                        "marker": format!("{}", i + 1),
                        "children": [{ "type": "text", "content": "A short note." }]
                    },
                    { "type": "text", "content": LOREM }
                ]
            })
        })
        .collect();
    document(children)
}

fn keep_together(count: usize) -> DocumentSource {
    let children = (0..count)
        .flat_map(|i| {
            vec![
                json!({
                    "type": "block",
                    "style": { "pageBreakAfter": "avoid", "fontSize": 18.0 },
                    "children": [{ "type": "text", "content": format!("Section {}", i) }]
                }),
                json!({
                    "type": "block",
                    "style": { "pageBreakInside": "avoid" },
                    "children": [{ "type": "text", "content": LOREM.repeat(3) }]
                }),
            ]
        })
        .collect();
    document(children)
}

fn bench_document(c: &mut Criterion, name: &str, build: fn(usize) -> DocumentSource) {
    let mut group = c.benchmark_group(name);
    let pipeline = LayoutPipeline::default();

    for count in [10, 100, 500] {
        let source = build(count);
        group.bench_with_input(BenchmarkId::new("blocks", count), &count, |b, _| {
            b.iter(|| {
                pipeline
                    .layout_source(&source)
                    .expect("Failed to lay out document")
            });
        });
    }

    group.finish();
}

fn benchmark_layout_paragraphs(c: &mut Criterion) {
    bench_document(c, "layout_paragraphs", paragraphs);
}

fn benchmark_layout_floats_and_footnotes(c: &mut Criterion) {
    bench_document(c, "layout_floats_and_footnotes", floats_and_footnotes);
}

fn benchmark_layout_keep_together(c: &mut Criterion) {
    bench_document(c, "layout_keep_together", keep_together);
}

criterion_group!(
    benches,
    benchmark_layout_paragraphs,
    benchmark_layout_floats_and_footnotes,
    benchmark_layout_keep_together
);
criterion_main!(benches);
