#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wine_pipeline::validation::schema::WINE_FEATURES;
use wine_pipeline::{Dataset, Value};

/// Нормальное распределение через преобразование Бокса-Мюллера
fn gaussian(rng: &mut StdRng, mean: f64, sd: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Средние и разбросы, похожие на красное вино
const WINE_STATS: [(f64, f64); 11] = [
    (8.3, 0.8),
    (0.53, 0.08),
    (0.27, 0.05),
    (2.5, 0.3),
    (0.087, 0.01),
    (15.9, 2.0),
    (46.0, 6.0),
    (0.9967, 0.0019),
    (3.31, 0.15),
    (0.66, 0.07),
    (10.4, 0.5),
];

/// Синтетический датасет с исходными (ненормализованными) именами колонок
pub fn raw_wine(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<String> = WINE_FEATURES
        .iter()
        .map(|name| name.replace('_', " ").to_uppercase())
        .collect();
    columns.push("Quality".to_string());

    let rows = (0..n)
        .map(|_| {
            let mut row: Vec<Value> = WINE_STATS
                .iter()
                .map(|&(mean, sd)| Value::Float(gaussian(&mut rng, mean, sd)))
                .collect();
            row.push(Value::Int(rng.gen_range(3..=8)));
            row
        })
        .collect();

    Dataset::new(columns, rows).unwrap()
}

/// Два признака и равномерная целевая переменная в {3..8}
pub fn two_feature(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..n)
        .map(|_| {
            vec![
                Value::Float(gaussian(&mut rng, 50.0, 10.0)),
                Value::Float(gaussian(&mut rng, 150.0, 10.0)),
                Value::Int(rng.gen_range(3..=8)),
            ]
        })
        .collect();
    Dataset::new(
        vec!["feature1".into(), "feature2".into(), "quality".into()],
        rows,
    )
    .unwrap()
}
