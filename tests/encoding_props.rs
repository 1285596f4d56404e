use penguin_predictor::encode::FeatureEncoder;
use penguin_predictor::forest::ForestConfig;
use penguin_predictor::{Predictor, RawRecord, ReferenceDataset};
use proptest::prelude::*;

fn arb_island() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Biscoe".to_string()),
        Just("Dream".to_string()),
        Just("Torgersen".to_string()),
        "[A-Z][a-z]{2,8}",
    ]
}

fn arb_sex() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("male".to_string()),
        Just("female".to_string()),
        "[a-z]{1,6}",
    ]
}

fn arb_record() -> impl Strategy<Value = RawRecord> {
    (
        arb_island(),
        arb_sex(),
        30.0f64..60.0,
        13.0f64..22.0,
        170.0f64..235.0,
        2700.0f64..6300.0,
    )
        .prop_map(|(island, sex, bl, bd, fl, bm)| RawRecord {
            island,
            sex,
            bill_length_mm: bl,
            bill_depth_mm: bd,
            flipper_length_mm: fl,
            body_mass_g: bm,
            species: None,
        })
}

fn arb_species() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Adelie".to_string()),
        Just("Chinstrap".to_string()),
        Just("Gentoo".to_string()),
    ]
}

fn arb_reference() -> impl Strategy<Value = ReferenceDataset> {
    prop::collection::vec((arb_record(), arb_species()), 1..12).prop_map(|rows| {
        let records = rows
            .into_iter()
            .map(|(record, species)| RawRecord {
                species: Some(species),
                ..record
            })
            .collect();
        ReferenceDataset::new(records).unwrap()
    })
}

/// Reference data holding every species at least once.
fn arb_mixed_reference() -> impl Strategy<Value = ReferenceDataset> {
    (arb_record(), arb_record(), arb_record(), arb_reference()).prop_map(|(a, b, c, extra)| {
        let mut records = vec![
            RawRecord { species: Some("Adelie".into()), ..a },
            RawRecord { species: Some("Chinstrap".into()), ..b },
            RawRecord { species: Some("Gentoo".into()), ..c },
        ];
        records.extend(extra.records().iter().cloned());
        ReferenceDataset::new(records).unwrap()
    })
}

proptest! {
    #[test]
    fn query_and_reference_share_columns(query in arb_record(), reference in arb_reference()) {
        let encoded = FeatureEncoder::default().encode(&query, &reference).unwrap();
        prop_assert_eq!(encoded.query.len(), encoded.layout.width());
        prop_assert_eq!(encoded.reference.ncols(), encoded.layout.width());
        prop_assert_eq!(encoded.reference.nrows(), reference.len());
        prop_assert_eq!(encoded.layout.names().len(), encoded.layout.width());
        let default_encoder = FeatureEncoder::default();
        prop_assert_eq!(encoded.layout.names(), default_encoder.layout().names());
    }

    #[test]
    fn encoding_is_idempotent(query in arb_record(), reference in arb_reference()) {
        let encoder = FeatureEncoder::default();
        let first = encoder.encode(&query, &reference).unwrap();
        let second = encoder.encode(&query, &reference).unwrap();
        prop_assert_eq!(first.query, second.query);
        prop_assert_eq!(first.reference, second.reference);
        prop_assert_eq!(first.advisories, second.advisories);
    }

    #[test]
    fn stacked_encoding_matches_separate_encoding(query in arb_record(), reference in arb_reference()) {
        let encoder = FeatureEncoder::default();
        let stacked = encoder.encode(&query, &reference).unwrap();
        prop_assert_eq!(stacked.query, encoder.encode_query(&query).unwrap());
        prop_assert_eq!(stacked.reference, encoder.encode_reference(&reference).unwrap());
    }

    #[test]
    fn indicators_are_binary_with_at_most_one_hot_per_field(query in arb_record()) {
        let encoder = FeatureEncoder::default();
        let row = encoder.encode_query(&query).unwrap();
        let names = encoder.layout().names();
        for prefix in ["island_", "sex_"] {
            let hot: Vec<f64> = names
                .iter()
                .zip(row.iter())
                .filter(|(name, _)| name.starts_with(prefix))
                .map(|(_, &v)| v)
                .collect();
            prop_assert!(hot.iter().all(|&v| v == 0.0 || v == 1.0));
            prop_assert!(hot.iter().sum::<f64>() <= 1.0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn reference_rows_predict_a_distribution(reference in arb_mixed_reference(), seed in any::<u64>()) {
        let predictor = Predictor::new(ForestConfig::default().with_seed(seed).with_trees(10));
        for row in reference.records().iter().take(3) {
            let report = predictor.predict(&row.without_species(), &reference).unwrap();
            let probs = &report.prediction.probabilities;
            let sum: f64 = probs.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-6);
            prop_assert!(probs.iter().all(|&p| p >= 0.0));
            prop_assert_eq!(probs.len(), 3);
        }
    }
}
