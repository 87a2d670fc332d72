use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::{HtmlTreeBuilder, ParseSettings, parse_document, run_tree_builder, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 64);
    out.push_str("<html><head><title>bench</title></head><body>");
    for i in 0..blocks {
        out.push_str(&format!(
            "<div class=box><a href=\"/item/{i}\">item &amp; {i}</a><img src=x></div>"
        ));
    }
    out.push_str("</body></html>");
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<style>");
    while body.len() < bytes {
        body.push_str("</sty");
        body.push('<');
        body.push_str("le");
    }
    body.push_str("</style>");
    body
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input), ParseSettings::HTML_DEFAULT);
            black_box(stream.len());
        });
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input), ParseSettings::HTML_DEFAULT);
            black_box(stream.len());
        });
    });
}

fn bench_tokenize_rawtext(c: &mut Criterion) {
    let input = make_rawtext_adversarial(256 * 1024);
    c.bench_function("bench_tokenize_rawtext", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input), ParseSettings::HTML_DEFAULT);
            black_box(stream.len());
        });
    });
}

fn bench_tree_build_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let stream = tokenize(&input, ParseSettings::HTML_DEFAULT);
    c.bench_function("bench_tree_build_large", |b| {
        b.iter_batched(
            HtmlTreeBuilder::new,
            |mut builder| {
                let nodes = run_tree_builder(&mut builder, black_box(&stream));
                black_box(nodes.map(|n| n.len()).unwrap_or_default());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_select_links_large(c: &mut Criterion) {
    let doc = parse_document(&make_blocks(LARGE_BLOCKS), Some("https://bench.test/"));
    c.bench_function("bench_select_links_large", |b| {
        b.iter(|| black_box(doc.select_links().len()));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_tokenize_rawtext,
    bench_tree_build_large,
    bench_select_links_large
);
criterion_main!(benches);
