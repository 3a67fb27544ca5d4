use std::fs;
use std::path::PathBuf;

use churnlab_clean::{CleanOptions, CleaningEngine, read_clean_customers};
use churnlab_core::{PlanCatalog, RawCustomer, UNKNOWN_REGION};
use churnlab_generate::{DefectConfig, GenerationEngine, GeneratorConfig};

fn generator(customers: i64, defects: DefectConfig) -> GeneratorConfig {
    GeneratorConfig {
        customers,
        seed: Some(2024),
        defects,
        ..GeneratorConfig::default()
    }
}

#[test]
fn default_defects_are_fully_repaired() {
    let dataset = GenerationEngine::new(generator(2_000, DefectConfig::default()))
        .generate()
        .expect("generate");
    let cleaned = CleaningEngine::new(CleanOptions::default())
        .clean(dataset.raw.clone())
        .expect("clean");
    let summary = &cleaned.summary;
    let defects = &dataset.defects;

    assert!(summary.is_conserved());
    assert_eq!(summary.duplicates_removed, defects.duplicates());
    assert_eq!(summary.invariant_violations, 0);
    assert_eq!(summary.prices_filled, defects.count("defect.null_price"));
    assert_eq!(summary.prices_corrected, 0);
    assert_eq!(summary.regions_filled, defects.count("defect.null_region"));
    assert_eq!(
        summary.text_normalized.get("plan_name").copied().unwrap_or(0),
        defects.count("defect.recase_plan_name")
    );
    assert_eq!(
        summary.dates_normalized.get("join_date").copied().unwrap_or(0),
        defects.count("defect.alternate_date_format")
    );
    assert_eq!(summary.derived_recomputed, 0);

    for (record, original) in cleaned.records.iter().zip(&dataset.customers) {
        if record.region == UNKNOWN_REGION {
            assert_eq!(record.customer_id, original.customer_id);
        } else {
            assert_eq!(record, original);
        }
    }
}

#[test]
fn opt_in_defects_are_rejected_and_conserved() {
    let defects = DefectConfig {
        unparseable_date_rate: 0.02,
        inverted_cancellation_rate: 0.05,
        ..DefectConfig::default()
    };
    let dataset = GenerationEngine::new(generator(3_000, defects))
        .generate()
        .expect("generate");
    let cleaned = CleaningEngine::new(CleanOptions::default())
        .clean(dataset.raw.clone())
        .expect("clean");
    let summary = &cleaned.summary;

    let unparseable = dataset.defects.count("defect.unparseable_join_date");
    let inverted = dataset.defects.count("defect.cancellation_before_join");
    assert!(unparseable > 0 && inverted > 0);
    assert_eq!(summary.unparseable_values.get("join_date"), Some(&unparseable));
    assert!(summary.invariant_violations >= unparseable.max(inverted));
    assert!(summary.invariant_violations <= unparseable + inverted);
    assert!(summary.is_conserved());

    let catalog = PlanCatalog::standard();
    for record in &cleaned.records {
        assert_eq!(catalog.price_of(&record.plan_name), Some(record.plan_price));
        if let Some(cancelled) = record.cancellation_date {
            assert!(cancelled >= record.join_date);
        }
    }
}

#[test]
fn cleaning_clean_output_changes_nothing() {
    let out_dir = temp_out_dir("idempotent");
    let generated = GenerationEngine::new(generator(1_000, DefectConfig::default()))
        .run(&out_dir.join("data"))
        .expect("run generation");
    let engine = CleaningEngine::new(CleanOptions::default());
    let result = engine
        .run(&generated.raw_path, &out_dir.join("clean"))
        .expect("run cleaning");

    let records = read_clean_customers(&result.clean_path).expect("read clean csv");
    let again = engine
        .clean(records.iter().map(RawCustomer::from).collect())
        .expect("clean again");

    assert_eq!(again.records, records);
    assert_eq!(again.summary.duplicates_removed, 0);
    assert!(again.summary.text_normalized.is_empty());
    assert!(again.summary.dates_normalized.is_empty());
    assert_eq!(again.summary.prices_filled + again.summary.prices_corrected, 0);
    assert_eq!(again.summary.regions_filled, 0);
    assert_eq!(again.summary.derived_recomputed, 0);
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("churnlab_clean_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}
