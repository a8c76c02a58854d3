use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sitecanvas::factory::create_element;
use sitecanvas::model::{Canvas, ElementType};
use sitecanvas::rendering::skeleton_digest;
use sitecanvas::{flatten, RenderMode, Renderer, Size};

// A few hundred elements, a tenth of them nested two per container.
fn large_canvas() -> Canvas {
    let mut canvas = Canvas::default();
    for n in 0..300 {
        let t = ElementType::ALL[n % ElementType::ALL.len()];
        let mut el = create_element(t, format!("e{}", n), (n % 20) as f64 * 60.0, (n / 20) as f64 * 50.0);
        el.z_index = (n % 7) as i64;
        canvas.push(el).expect("unique ids");
    }
    let containers: Vec<String> = canvas
        .elements
        .iter()
        .filter(|e| e.is_container())
        .map(|e| e.id.clone())
        .collect();
    let leaves: Vec<String> = canvas
        .elements
        .iter()
        .filter(|e| !e.is_container())
        .map(|e| e.id.clone())
        .collect();
    for (container, pair) in containers.iter().zip(leaves.chunks(2)) {
        for child in pair {
            canvas.add_to_container(child, container).expect("nest");
        }
    }
    canvas
}

fn bench_flatten(c: &mut Criterion) {
    let canvas = large_canvas();
    c.bench_function("flatten_300", |b| b.iter(|| flatten(black_box(&canvas))));
}

fn bench_render(c: &mut Criterion) {
    let canvas = large_canvas();
    let skeleton = Renderer::new(RenderMode::Preview);
    let mut editor = Renderer::new(RenderMode::Editor).hydrate();
    editor.set_selection(["e3", "e42"]);

    c.bench_function("render_skeleton_300", |b| b.iter(|| skeleton.render_canvas(black_box(&canvas))));
    c.bench_function("render_editor_300", |b| b.iter(|| editor.render_canvas(black_box(&canvas))));
}

fn bench_digest(c: &mut Criterion) {
    let canvas = large_canvas();
    let flat = flatten(&canvas);
    let size = Size::new(canvas.width, canvas.height);
    c.bench_function("skeleton_digest_300", |b| b.iter(|| skeleton_digest(size, black_box(&flat))));
}

criterion_group!(benches, bench_flatten, bench_render, bench_digest);
criterion_main!(benches);
