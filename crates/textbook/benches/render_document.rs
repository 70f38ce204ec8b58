use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use textbook::RenderConfig;
use textbook::Renderer;
use textbook::segment::Segmenter;

fn sample_document(cells: usize) -> String {
    let mut s = String::new();
    for i in 0..cells {
        s.push_str("# %% [markdown]\n");
        s.push_str(&format!("# ## Section {i}\n#\n"));
        s.push_str("# The quick brown fox jumps over the lazy dog. ");
        s.push_str("Energy is $E = mc^2$ and the sum is $\\sum_{i=1}^{n} i$.\n");
        s.push_str("#\n# | name | value | notes |\n# |------|-------|-------|\n");
        s.push_str("# | foo  | 123   | wraps when the terminal is narrow |\n");
        s.push_str("# | bar  | 456   | **bold** and `code` |\n");
        s.push_str("# %% [code]\n");
        s.push_str("def f(x):\n");
        for j in 0..20 {
            s.push_str(&format!("    y{j} = x * {j} + 1\n"));
        }
        s.push_str("    return x\n");
    }
    s
}

fn bench_render(c: &mut Criterion) {
    let text = sample_document(50);
    let parsed = Segmenter::default().segment_text(&text).unwrap();

    let plain = Renderer::new(RenderConfig {
        theme: "none".to_string(),
        ..RenderConfig::default()
    })
    .unwrap();
    c.bench_function("render_document/no_highlight", |b| {
        b.iter(|| black_box(plain.render(black_box(&parsed)).unwrap()))
    });

    let highlighted = Renderer::new(RenderConfig::default()).unwrap();
    c.bench_function("render_document/syntect", |b| {
        b.iter(|| black_box(highlighted.render(black_box(&parsed)).unwrap()))
    });
}

fn bench_segment(c: &mut Criterion) {
    let text = sample_document(200);
    let segmenter = Segmenter::default();
    c.bench_function("segment/200_cells", |b| {
        b.iter(|| black_box(segmenter.segment_text(black_box(&text)).unwrap()))
    });
}

criterion_group!(benches, bench_render, bench_segment);
criterion_main!(benches);
