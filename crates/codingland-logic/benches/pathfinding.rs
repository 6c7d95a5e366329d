use codingland_logic::pathfinding::lookup_path;
use codingland_logic::vector::Vector;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn serpentine_walls(width: usize, height: usize) -> Vec<bool> {
    // Every other column is a wall with a gap alternating top/bottom.
    let mut walls = vec![false; width * height];
    for x in (1..width).step_by(2) {
        let gap = if (x / 2) % 2 == 0 { height - 1 } else { 0 };
        for y in 0..height {
            if y != gap {
                walls[y * width + x] = true;
            }
        }
    }
    walls
}

fn bench_lookup(c: &mut Criterion) {
    for &(w, h) in &[(8usize, 5usize), (32, 32)] {
        let walls = serpentine_walls(w, h);
        let size = Vector::new(w as f64, h as f64);
        let target = Vector::new((w - 1) as f64, (h - 1) as f64);
        c.bench_function(&format!("serpentine_{}x{}", w, h), |b| {
            b.iter(|| {
                lookup_path(size, Vector::new(0.0, 0.0), &[target], |cell| {
                    let (x, y) = cell.extract();
                    x < 0.0
                        || y < 0.0
                        || x >= w as f64
                        || y >= h as f64
                        || walls[y as usize * w + x as usize]
                })
            });
        });
    }

    c.bench_function("open_8x5_unreachable", |b| {
        b.iter(|| {
            lookup_path(
                black_box(Vector::new(8.0, 5.0)),
                Vector::new(0.0, 0.0),
                &[Vector::new(20.0, 20.0)],
                |cell| {
                    let (x, y) = cell.extract();
                    x < 0.0 || y < 0.0 || x >= 8.0 || y >= 5.0
                },
            )
        });
    });
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
