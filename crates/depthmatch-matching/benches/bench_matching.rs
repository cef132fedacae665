use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use depthmatch_3d::pose::RelativePose;
use depthmatch_3d::rotation::{euler_to_matrix, EulerAngles};
use depthmatch_3d::warp::{flow_from_depth, DepthMap};
use depthmatch_image::ImageSize;
use depthmatch_matching::{cross_check_matches, flow_to_matches};

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    let pose12 = RelativePose::new(
        euler_to_matrix(&EulerAngles::new(0.02, 0.01, -0.01)),
        [0.05, 0.0, 0.0],
    );
    let pose21 = pose12.inverse();

    for (width, height) in [(256, 192), (512, 384)].iter() {
        let size = ImageSize {
            width: *width,
            height: *height,
        };
        let depth = DepthMap::from_size_val(size, 0.25);
        let flow12 = flow_from_depth(&depth, &pose12, 228.13688);
        let flow21 = flow_from_depth(&depth, &pose21, 228.13688);
        let parameter_string = format!("{width}x{height}");

        group.bench_with_input(
            BenchmarkId::new("flow_to_matches", &parameter_string),
            &flow12,
            |b, flow| b.iter(|| black_box(flow_to_matches(flow))),
        );

        let forward = flow_to_matches(&flow12);
        let backward = flow_to_matches(&flow21);
        group.bench_with_input(
            BenchmarkId::new("cross_check_matches", &parameter_string),
            &(forward, backward),
            |b, (forward, backward)| {
                b.iter(|| black_box(cross_check_matches(forward, backward, 1.0)))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
