#![allow(dead_code)]

use flowbox::{FlowboxError, FontMetrics, LayoutPipeline, LayoutResult, TextMeasurer};
use flowbox::{FixedPitchMeasurer, LineRef};
use flowbox::style::FontSpec;
use serde_json::{Value, json};
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 60pt per word, spaces are free.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordMeasurer;

impl TextMeasurer for WordMeasurer {
    fn text_width(&self, _font: &FontSpec, text: &str) -> f32 {
        text.split(' ').filter(|w| !w.is_empty()).count() as f32 * 60.0
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        FixedPitchMeasurer::default().metrics(font)
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// A single default page master of the given size and margins.
pub fn page_masters(width: f32, height: f32, margins: &str) -> Value {
    json!({
        "masters": {
            "default": { "size": { "width": width, "height": height }, "margins": margins }
        },
        "defaultMaster": "default"
    })
}

pub fn text(content: &str) -> Value {
    json!({ "type": "text", "content": content })
}

pub fn block(style: Value, children: Vec<Value>) -> Value {
    json!({ "type": "block", "style": style, "children": children })
}

pub fn paragraph(content: &str) -> Value {
    block(json!({}), vec![text(content)])
}

/// A block of `count` one-word lines separated by line breaks.
pub fn lines(style: Value, count: usize) -> Value {
    let mut children = Vec::new();
    for i in 0..count {
        if i > 0 {
            children.push(json!({ "type": "line-break" }));
        }
        children.push(text("x"));
    }
    block(style, children)
}

pub fn document(masters: Value, children: Vec<Value>) -> Value {
    json!({
        "pageMasters": masters,
        "root": { "type": "block", "children": children }
    })
}

pub fn layout(doc: &Value) -> Result<LayoutResult, FlowboxError> {
    init_logger();
    LayoutPipeline::default().layout_json(&doc.to_string())
}

pub fn layout_with(pipeline: LayoutPipeline, doc: &Value) -> Result<LayoutResult, FlowboxError> {
    init_logger();
    pipeline.layout_json(&doc.to_string())
}

pub fn word_pipeline() -> LayoutPipeline {
    LayoutPipeline::new(Arc::new(WordMeasurer))
}

/// The nth child of the root.
pub fn child(result: &LayoutResult, index: usize) -> flowbox::BoxId {
    result.tree.get(result.root).map(|b| b.children[index]).expect("root child exists")
}

pub fn line_texts(result: &LayoutResult, block: flowbox::BoxId) -> Vec<String> {
    result
        .tree
        .get(block)
        .map(|b| b.lines.iter().map(|l| l.text()).collect())
        .unwrap_or_default()
}

/// Document Y of a line's top.
pub fn line_top(result: &LayoutResult, line: LineRef) -> f32 {
    let b = result.tree.get(line.block).expect("line block exists");
    b.geometry.content_origin().y + b.lines[line.index].y
}
