use criterion::{Criterion, criterion_group, criterion_main};
use phylotraits::layout::TreeLayout;
use phylotraits::newick::read_tree;
use phylotraits::treesub::TreesubNormalizer;

const TREESUB_FILES: &[(&str, &str)] = &[("treesub-n128", "benches/fixtures/treesub_n128.tree")];

const NEWICK_FILES: &[(&str, &str)] = &[("newick-n128", "benches/fixtures/n128.nwk")];

fn normalize(c: &mut Criterion) {
    let normalizer = TreesubNormalizer::new().with_preview(false);
    for (name, path) in TREESUB_FILES {
        let text = std::fs::read_to_string(path).unwrap();
        c.bench_function(name, |b| {
            b.iter(|| normalizer.normalize_str(&text).unwrap());
        });
    }
}

fn read_and_layout(c: &mut Criterion) {
    for (name, path) in NEWICK_FILES {
        c.bench_function(name, |b| {
            b.iter(|| {
                let tree = read_tree(path).unwrap();
                TreeLayout::compute(&tree)
            });
        });
    }
}

criterion_group!(regression, normalize, read_and_layout);
criterion_main!(regression);
