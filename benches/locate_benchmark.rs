//! Benchmarks for untable page handling.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic documents built with lopdf.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};
use untable::geometry::PageFrame;
use untable::region::ReconcileOptions;
use untable::{ImageBox, RawDetection};

/// Creates a document with `page_count` pages of table-like text.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 0..page_count {
        let mut content = format!("BT /F1 16 Tf 72 740 Td (Page {} summary) Tj ET\n", i + 1);
        for row in 0..20 {
            let y = 680 - row * 16;
            content.push_str(&format!(
                "BT /F1 10 Tf 72 {y} Td (Item {row}) Tj ET BT /F1 10 Tf 300 {y} Td ({}) Tj ET\n",
                row * 17
            ));
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Benchmark PDF header sniffing.
fn bench_format_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("sniff_valid_pdf", |b| {
        b.iter(|| untable::sniff_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("sniff_non_pdf", |b| {
        b.iter(|| untable::sniff_bytes(black_box(non_pdf_data)).is_err());
    });
}

/// Benchmark single-page extraction at various document sizes.
fn bench_extract_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_page");

    for page_count in [1, 5, 10].iter() {
        let document = untable::Document::from_bytes(create_test_pdf(*page_count), None).unwrap();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| document.extract_page(black_box(1)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark page loading and style indexing.
fn bench_style_index(c: &mut Criterion) {
    let document = untable::Document::from_bytes(create_test_pdf(1), None).unwrap();
    let single = document.extract_page(1).unwrap();

    c.bench_function("load_page", |b| {
        b.iter(|| single.page().unwrap());
    });

    let page = single.page().unwrap();
    c.bench_function("build_style_index", |b| {
        b.iter(|| untable::build_style_index(black_box(&page)).unwrap());
    });
}

/// Benchmark detection reconciliation.
fn bench_reconcile(c: &mut Criterion) {
    let frame = PageFrame::new(612.0, 792.0, 2550, 3300);
    let options = ReconcileOptions::default();
    let pair = vec![
        RawDetection::new(ImageBox::new(200.0, 400.0, 2300.0, 1500.0), 0.91, 0),
        RawDetection::new(ImageBox::new(200.0, 1400.0, 2300.0, 2800.0), 0.88, 0),
    ];

    c.bench_function("reconcile_pair", |b| {
        b.iter(|| untable::reconcile(black_box(&pair), frame, 1, &options));
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_extract_page,
    bench_style_index,
    bench_reconcile,
);
criterion_main!(benches);
