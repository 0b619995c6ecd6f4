use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use xml_compare::{Epsilon, IgnoreSet, TreeComparator, XmlDocument, compare};

fn order_document(lines: usize, price_offset: f64) -> String {
    let mut xml = String::from("<order id=\"42\"><customer>ACME</customer><lines>");
    for i in 0..lines {
        xml.push_str(&format!(
            "<line no=\"{}\"><sku>SKU-{}</sku><qty>{}</qty><price currency=\"EUR\">{:.4}</price></line>",
            i,
            i,
            i % 7 + 1,
            10.0 + i as f64 * 0.25 + price_offset
        ));
    }
    xml.push_str("</lines><debug>generated</debug></order>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let xml = order_document(500, 0.0);
    c.bench_function("parse_order_500", |b| {
        b.iter(|| XmlDocument::parse_str("bench", black_box(&xml)))
    });
}

fn bench_identical(c: &mut Criterion) {
    let control = XmlDocument::parse_str("control", &order_document(500, 0.0)).unwrap();
    let test = XmlDocument::parse_str("test", &order_document(500, 0.0)).unwrap();
    let ignore = IgnoreSet::new();

    c.bench_function("compare_identical_500", |b| {
        b.iter(|| compare(black_box(&control), black_box(&test), &ignore, Epsilon::ZERO))
    });
}

fn bench_tolerance(c: &mut Criterion) {
    let control = XmlDocument::parse_str("control", &order_document(500, 0.0)).unwrap();
    let test = XmlDocument::parse_str("test", &order_document(500, 0.0002)).unwrap();
    let ignore = IgnoreSet::from_delimited("debug");
    let comparator = TreeComparator::new(&ignore, Epsilon::new(0.001).unwrap());

    c.bench_function("compare_tolerance_500", |b| {
        b.iter(|| comparator.compare(black_box(&control), black_box(&test)))
    });
}

fn bench_reordered(c: &mut Criterion) {
    let control = XmlDocument::parse_str("control", &order_document(200, 0.0)).unwrap();
    // Reversed lines force the matcher to scan siblings.
    let mut lines: Vec<String> = (0..200)
        .map(|i| format!("<line no=\"{}\"><sku>SKU-{}</sku></line>", i, i))
        .collect();
    lines.reverse();
    let test_xml = format!("<order id=\"42\"><lines>{}</lines></order>", lines.concat());
    let test = XmlDocument::parse_str("test", &test_xml).unwrap();
    let ignore = IgnoreSet::new();

    c.bench_function("compare_reordered_200", |b| {
        b.iter(|| compare(black_box(&control), black_box(&test), &ignore, Epsilon::ZERO))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_identical,
    bench_tolerance,
    bench_reordered
);
criterion_main!(benches);
