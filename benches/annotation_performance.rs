//! Benchmark suite for document annotation
//!
//! This benchmark measures:
//! - Full-document annotation as the number of component usages grows
//! - Range annotation of one screen of a large document
//! - Parent lookup at the end of a deeply nested document
//! - Delta encoding of the resulting spans

use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tower_lsp::lsp_types::{Position, Range};

use component_language_server::annotation::{annotate_with, encode, parent_component};
use component_language_server::components::{ComponentConfig, ComponentMap};
use component_language_server::document::TextDocument;

const COMPONENTS: &[&str] = &["Card", "Dialog", "Button", "Tabs", "Tab", "Layout", "Sidebar", "Avatar"];

fn component_map() -> ComponentMap {
    COMPONENTS.iter().map(|name| (*name, format!("/components/{}", name))).collect()
}

fn slots(_: &str, _: &Path) -> Option<ComponentConfig> {
    Some(ComponentConfig::new(["Header", "Body", "Footer"]))
}

/// A template with `blocks` cards, each holding slots, plain markup and a nested dialog.
fn generate_template(blocks: usize) -> String {
    let mut text = String::from("<Layout>\n");
    for i in 0..blocks {
        text.push_str(&format!(
            "  <Card id=\"card-{i}\">\n    <Header>Item {i}</Header>\n    <div class=\"row\">\n      <Button label=\"open\"/>\n      <Dialog>\n        <Body>details {i}</Body>\n      </Dialog>\n    </div>\n    <Footer/>\n  </Card>\n"
        ));
    }
    text.push_str("</Layout>\n");
    text
}

fn bench_full_annotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate_full");
    let components = component_map();
    for blocks in [10, 100, 1000] {
        let document = TextDocument::new(&generate_template(blocks));
        group.throughput(Throughput::Elements(document.len_chars() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &document, |b, document| {
            b.iter(|| annotate_with(black_box(document), &components, None, slots))
        });
    }
    group.finish();
}

fn bench_range_annotation(c: &mut Criterion) {
    let components = component_map();
    let document = TextDocument::new(&generate_template(1000));
    let visible = Range::new(Position::new(5000, 0), Position::new(5060, 0));
    c.bench_function("annotate_range_60_lines", |b| {
        b.iter(|| annotate_with(black_box(&document), &components, Some(visible), slots))
    });
}

fn bench_parent_lookup(c: &mut Criterion) {
    let components = component_map();
    let document = TextDocument::new(&generate_template(1000));
    let end = document.position_at(document.len_chars());
    c.bench_function("parent_component_at_end", |b| {
        b.iter(|| parent_component(black_box(&document), end, &components))
    });
}

fn bench_encode(c: &mut Criterion) {
    let components = component_map();
    let document = TextDocument::new(&generate_template(1000));
    let spans = annotate_with(&document, &components, None, slots);
    c.bench_function("encode_spans", |b| b.iter(|| encode(black_box(&spans))));
}

criterion_group!(benches, bench_full_annotation, bench_range_annotation, bench_parent_lookup, bench_encode);
criterion_main!(benches);
