use embedgate_dispatch::batching::{estimate_tokens, generate_batches};
use proptest::prelude::*;

fn inputs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(".{0,40}", 0..60)
}

proptest! {
    #[test]
    fn concatenation_restores_input(
        texts in inputs(),
        size in 1usize..10,
        limit in 1.0f64..50.0,
    ) {
        let batches = generate_batches(&texts, size, limit, 3.0);
        let flat: Vec<String> = batches.into_iter().flatten().collect();
        prop_assert_eq!(flat, texts);
    }

    #[test]
    fn batches_are_non_empty_and_bounded(
        texts in inputs(),
        size in 1usize..10,
        limit in 1.0f64..50.0,
    ) {
        for batch in generate_batches(&texts, size, limit, 3.0) {
            prop_assert!(!batch.is_empty());
            prop_assert!(batch.len() <= size);
        }
    }

    #[test]
    fn multi_text_batches_stay_under_token_limit(
        texts in inputs(),
        size in 1usize..10,
        limit in 1.0f64..50.0,
        avg in 0.33f64..4.0,
    ) {
        for batch in generate_batches(&texts, size, limit, avg) {
            if batch.len() < 2 {
                continue;
            }
            // Every text after the first was admitted below the limit.
            let mut running = 0.0;
            for (i, text) in batch.iter().enumerate() {
                let estimate = estimate_tokens(text, avg);
                if i > 0 {
                    prop_assert!(running + estimate < limit);
                }
                running += estimate;
            }
        }
    }

    #[test]
    fn lower_ratio_never_yields_fewer_batches(
        texts in inputs(),
        size in 1usize..10,
        limit in 1.0f64..50.0,
    ) {
        let default = generate_batches(&texts, size, limit, 3.0).len();
        let fallback = generate_batches(&texts, size, limit, 0.33).len();
        prop_assert!(fallback >= default);
    }
}
