use criterion::{black_box, criterion_group, criterion_main, Criterion};
use riskcalc_core::model::{Kernel, Platt, SvmClassifier};
use riskcalc_core::{assess, Classifier, FeatureDictionary, ModelAdapter};
use std::sync::Arc;

fn rbf_model(support_vectors: usize) -> Classifier {
    let vectors = (0..support_vectors)
        .map(|i| {
            let i = i as f64;
            [i % 3.0, i % 4.0, i % 2.0, (i + 1.0) % 2.0, i % 2.0, 0.0]
        })
        .collect::<Vec<_>>();
    let dual_coef = (0..support_vectors)
        .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();

    Classifier::Svm(SvmClassifier {
        kernel: Kernel::Rbf { gamma: 0.1 },
        support_vectors: vectors,
        dual_coef,
        intercept: 0.1,
        platt: Platt { a: -1.2, b: 0.05 },
    })
}

fn bench_assess(c: &mut Criterion) {
    let dict = FeatureDictionary::standard();
    let adapter = ModelAdapter::with_model(Arc::new(rbf_model(400)));
    let pairs = [
        ("年龄", "70-79岁"),
        ("文化程度", "初中"),
        ("规律运动", "是"),
        ("糖尿病慢性并发症数量", "≥2个"),
        ("营养不良", "否"),
        ("抑郁", "是"),
    ];

    c.bench_function("assess_rbf_svm_400", |b| {
        b.iter(|| assess(&dict, &adapter, black_box(pairs)).unwrap())
    });

    c.bench_function("assemble_only", |b| {
        b.iter(|| dict.assemble(black_box(pairs)).unwrap())
    });
}

criterion_group!(benches, bench_assess);
criterion_main!(benches);
