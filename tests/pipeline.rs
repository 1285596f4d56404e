use std::collections::BTreeMap;

use penguin_predictor::data::model::FieldValue;
use penguin_predictor::data::schema::CategoricalField;
use penguin_predictor::encode::FeatureEncoder;
use penguin_predictor::forest::{ForestConfig, RandomForestClassifier};
use penguin_predictor::labels::{LabelCodec, PENGUIN_SPECIES};
use penguin_predictor::{PipelineError, Predictor, RawRecord, ReferenceDataset, Stage};

fn penguin(species: &str, island: &str, sex: &str, m: [f64; 4]) -> RawRecord {
    RawRecord {
        island: island.to_string(),
        sex: sex.to_string(),
        bill_length_mm: m[0],
        bill_depth_mm: m[1],
        flipper_length_mm: m[2],
        body_mass_g: m[3],
        species: Some(species.to_string()),
    }
}

/// One row per species with clearly separated measurements.
fn three_species() -> ReferenceDataset {
    ReferenceDataset::new(vec![
        penguin("Adelie", "Torgersen", "male", [39.1, 18.7, 181.0, 3750.0]),
        penguin("Chinstrap", "Dream", "female", [46.5, 17.9, 192.0, 3500.0]),
        penguin("Gentoo", "Biscoe", "female", [46.1, 13.2, 211.0, 4500.0]),
    ])
    .unwrap()
}

fn predictor() -> Predictor {
    Predictor::new(ForestConfig::default().with_seed(42))
}

#[test]
fn duplicate_of_adelie_row_is_predicted_adelie() {
    let reference = three_species();
    let query = reference.records()[0].without_species();

    let report = predictor().predict(&query, &reference).unwrap();
    assert_eq!(report.predicted_label(), "Adelie");

    let adelie = report.result.probability_of("Adelie").unwrap();
    let chinstrap = report.result.probability_of("Chinstrap").unwrap();
    let gentoo = report.result.probability_of("Gentoo").unwrap();
    assert!(adelie >= chinstrap && adelie >= gentoo);
    assert!(report.advisories.is_empty());
}

#[test]
fn single_species_reference_is_insufficient() {
    let reference = ReferenceDataset::new(vec![
        penguin("Adelie", "Torgersen", "male", [39.1, 18.7, 181.0, 3750.0]),
        penguin("Adelie", "Dream", "female", [37.8, 18.3, 174.0, 3400.0]),
    ])
    .unwrap();

    let err = predictor()
        .predict(&RawRecord::default_query(), &reference)
        .unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData(_)));
    assert_eq!(err.stage(), Stage::Train);
}

#[test]
fn single_species_fails_when_fitting_directly() {
    let reference = ReferenceDataset::new(vec![penguin(
        "Gentoo",
        "Biscoe",
        "female",
        [46.1, 13.2, 211.0, 4500.0],
    )])
    .unwrap();
    let x = FeatureEncoder::default().encode_reference(&reference).unwrap();
    let y = LabelCodec::penguins().encode_dataset(&reference).unwrap();

    let mut classifier = RandomForestClassifier::new(ForestConfig::default().with_seed(1));
    let err = classifier.fit(x.view(), &y, 3).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientData(_)));
    assert!(!classifier.is_fitted());
}

#[test]
fn wrong_case_field_name_is_a_schema_mismatch() {
    let mut fields = BTreeMap::new();
    fields.insert("Island".to_string(), FieldValue::String("Biscoe".into()));
    fields.insert("sex".to_string(), FieldValue::String("male".into()));
    fields.insert("bill_length_mm".to_string(), FieldValue::Float(43.9));
    fields.insert("bill_depth_mm".to_string(), FieldValue::Float(17.2));
    fields.insert("flipper_length_mm".to_string(), FieldValue::Integer(201));
    fields.insert("body_mass_g".to_string(), FieldValue::Integer(4207));

    let err = RawRecord::from_fields(&fields).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { ref field, .. } if field == "Island"));
    assert_eq!(err.stage(), Stage::Encode);
}

#[test]
fn island_missing_from_reference_still_predicts() {
    let reference = ReferenceDataset::new(vec![
        penguin("Adelie", "Dream", "male", [39.1, 18.7, 181.0, 3750.0]),
        penguin("Chinstrap", "Dream", "female", [46.5, 17.9, 192.0, 3500.0]),
        penguin("Gentoo", "Biscoe", "female", [46.1, 13.2, 211.0, 4500.0]),
    ])
    .unwrap();
    let mut query = RawRecord::default_query();
    query.island = "Torgersen".to_string();

    let report = predictor().predict(&query, &reference).unwrap();
    assert!(report.is_low_confidence());
    let advisory = &report.advisories[0];
    assert_eq!(advisory.field, CategoricalField::Island);
    assert_eq!(advisory.value, "Torgersen");
    assert!(!advisory.out_of_vocabulary);

    // The indicator column exists and is set only for the query.
    let encoded = FeatureEncoder::default().encode(&query, &reference).unwrap();
    let col = encoded.layout.position("island_Torgersen").unwrap();
    assert_eq!(encoded.query[col], 1.0);
    assert!(encoded.reference.column(col).iter().all(|&v| v == 0.0));
}

#[test]
fn value_outside_vocabulary_still_predicts() {
    let reference = three_species();
    let mut query = RawRecord::default_query();
    query.island = "Anvers".to_string();
    query.sex = "unknown".to_string();

    let report = predictor().predict(&query, &reference).unwrap();
    assert_eq!(report.advisories.len(), 2);
    assert!(report.advisories.iter().all(|a| a.out_of_vocabulary));
    assert_eq!(report.layout.width(), 9);
    assert!(PENGUIN_SPECIES.iter().any(|s| *s == report.predicted_label()));
}

#[test]
fn reference_rows_get_normalized_probabilities() {
    let reference = three_species();
    let predictor = Predictor::new(ForestConfig::default().with_seed(7).with_trees(25));
    for row in reference.records() {
        let report = predictor.predict(&row.without_species(), &reference).unwrap();
        let probs = &report.prediction.probabilities;
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        assert!(probs[report.prediction.class_index] >= 0.0);
    }
}

#[test]
fn species_names_survive_encode_decode() {
    let codec = LabelCodec::penguins();
    for name in PENGUIN_SPECIES {
        let index = codec.encode(name).unwrap();
        assert_eq!(codec.decode(index).unwrap(), name);
    }
}

#[test]
fn result_row_carries_input_probabilities_and_label() {
    let reference = three_species();
    let report = predictor()
        .predict(&RawRecord::default_query(), &reference)
        .unwrap();

    let headers = report.result.headers();
    let values = report.result.values();
    assert_eq!(headers.len(), values.len());
    assert_eq!(headers.first().map(String::as_str), Some("island"));
    assert_eq!(headers.last().map(String::as_str), Some("prediction"));
    assert_eq!(values.last().map(String::as_str), Some(report.predicted_label()));
    assert_eq!(report.result.input, RawRecord::default_query());
}

#[test]
fn seeded_predictions_are_reproducible() {
    let reference = three_species();
    let query = RawRecord::default_query();
    let a = predictor().predict(&query, &reference).unwrap();
    let b = predictor().predict(&query, &reference).unwrap();
    assert_eq!(a.prediction, b.prediction);
}

#[test]
fn custom_class_order_drives_columns_and_probabilities() {
    let codec = LabelCodec::new(["Gentoo", "Chinstrap", "Adelie"]).unwrap();
    let predictor = Predictor::new(ForestConfig::default().with_seed(42)).with_codec(codec);
    let reference = three_species();
    let query = reference.records()[0].without_species();

    let report = predictor.predict(&query, &reference).unwrap();

    let headers = report.result.headers();
    assert_eq!(
        headers[6..],
        ["Gentoo", "Chinstrap", "Adelie", "prediction"].map(String::from)
    );
    assert_eq!(report.predicted_label(), "Adelie");
    assert_eq!(report.prediction.class_index, 2);

    let probs = &report.prediction.probabilities;
    for (i, class) in ["Gentoo", "Chinstrap", "Adelie"].into_iter().enumerate() {
        assert_eq!(report.result.probability_of(class), Some(probs[i]));
    }
    assert!(probs[2] >= probs[0] && probs[2] >= probs[1]);
}
