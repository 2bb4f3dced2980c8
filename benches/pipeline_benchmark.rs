//! Benchmarks for the transform pipeline and converter.
//!
//! Run with: cargo bench
//!
//! Documents are synthesized in memory: each page holds a title split into
//! fragments followed by body lines split into words.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfdown::{
    ConversionStrategy, Converter, Document, DocumentBuilder, ExtractedPage, Pipeline, RawItem,
};

/// Creates a synthetic document with the given number of pages.
fn create_test_document(page_count: usize) -> Document {
    let pages = (0..page_count)
        .map(|page| {
            let mut items = vec![
                RawItem::text_run("Sec", page, 72.0, 740.0, 36.0, 18.0, 18.0, "Helvetica-Bold"),
                RawItem::text_run("tion", page, 108.0, 740.0, 48.0, 18.0, 18.0, "Helvetica-Bold"),
            ];
            for line in 0..40 {
                let y = 710.0 - 14.0 * line as f64;
                let mut x = 72.0;
                for word in ["Benchmark", "content", "for", "pdfdown", "pipeline."] {
                    let width = 6.0 * word.len() as f64;
                    items.push(RawItem::text_run(word, page, x, y, width, 12.0, 12.0, "Helvetica"));
                    x += width + 4.0;
                }
            }
            ExtractedPage::new(page, items)
        })
        .collect();

    DocumentBuilder::new().build(pages).expect("valid document")
}

/// Benchmark the default pipeline at various sizes.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = Pipeline::with_defaults();

    for page_count in [1, 10, 50].iter() {
        let doc = create_test_document(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| pipeline.run(black_box(doc.clone())).unwrap());
        });
    }

    group.finish();
}

/// Benchmark Markdown rendering of a transformed document.
fn bench_markdown(c: &mut Criterion) {
    let doc = Pipeline::with_defaults().run(create_test_document(10)).unwrap();
    let strategy = ConversionStrategy::markdown();

    c.bench_function("markdown_10_pages", |b| {
        b.iter(|| Converter::convert(black_box(&doc), &strategy).unwrap());
    });
}

/// Benchmark format detection.
fn bench_format_detection(c: &mut Criterion) {
    let pdf_data = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<< >>\nendobj\n";
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("detect_valid_pdf", |b| {
        b.iter(|| pdfdown::sniff_bytes(black_box(pdf_data)).unwrap());
    });

    c.bench_function("detect_non_pdf", |b| {
        b.iter(|| pdfdown::sniff_bytes(black_box(non_pdf_data)).is_err());
    });
}

criterion_group!(benches, bench_pipeline, bench_markdown, bench_format_detection);
criterion_main!(benches);
