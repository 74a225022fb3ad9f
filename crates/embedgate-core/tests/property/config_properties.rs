use embedgate_core::config::{ApiKeyCredentials, ErrorHandlingConfig, ModelConfig};
use embedgate_core::{
    CanonicalModelConfig, EmbeddingConfig, EmbeddingProvider, EmbeddingServiceConfig,
};
use proptest::prelude::*;

fn token() -> impl Strategy<Value = String> {
    "sk-[a-z0-9]{16,32}"
}

fn model_config() -> impl Strategy<Value = ModelConfig> {
    (
        proptest::option::of(1u32..4096),
        proptest::option::of(1usize..2000),
        proptest::option::of(1u32..200_000),
    )
        .prop_map(|(dims, size, limit)| ModelConfig {
            output_dimensions: dims,
            truncation: None,
            batch_size: size,
            batch_token_limit: limit,
        })
}

proptest! {
    #[test]
    fn credentials_id_follows_the_token(a in token(), b in token(), exp in "[0-9]{4}-[0-9]{2}-[0-9]{2}") {
        let left = ApiKeyCredentials::new(a.clone());
        let right = ApiKeyCredentials::new(b.clone()).with_expiration(exp);
        prop_assert_eq!(left.credentials_id() == right.credentials_id(), a == b);
        prop_assert_eq!(left == right, a == b);
    }

    #[test]
    fn overlay_with_nothing_is_identity(base in model_config()) {
        prop_assert_eq!(base.overlay(&ModelConfig::default()), base);
    }

    #[test]
    fn fully_set_overrides_win(base in model_config(), over in model_config()) {
        let merged = base.overlay(&over);
        prop_assert_eq!(merged.batch_size, over.batch_size.or(base.batch_size));
        prop_assert_eq!(merged.batch_token_limit, over.batch_token_limit.or(base.batch_token_limit));
        prop_assert_eq!(merged.output_dimensions, over.output_dimensions.or(base.output_dimensions));
    }

    #[test]
    fn sanitized_configs_never_leak_tokens(secret in token()) {
        let config = EmbeddingServiceConfig::new(
            EmbeddingProvider::Voyage,
            "voyage-3-large",
            EmbeddingConfig::new(
                ModelConfig::default(),
                ErrorHandlingConfig::default(),
                ApiKeyCredentials::new(secret.clone()),
            ),
        );
        let sanitized = config.copy_sanitized("<redacted>");
        let rendered = serde_json::to_string(&sanitized).unwrap();
        prop_assert!(!rendered.contains(&secret));
        let debug_rendered = format!("{:?}", config);
        prop_assert!(!debug_rendered.contains(&secret));
    }

    #[test]
    fn well_formed_configs_validate(
        size in 1usize..2000,
        limit in 1u32..200_000,
        initial in 1u64..1000,
        extra in 0u64..10_000,
        jitter in 0.0f64..=1.0,
    ) {
        let config = EmbeddingConfig::new(
            ModelConfig {
                batch_size: Some(size),
                batch_token_limit: Some(limit),
                ..ModelConfig::default()
            },
            ErrorHandlingConfig::new(3, initial, initial + extra, jitter),
            ApiKeyCredentials::new("token"),
        );
        let canonical = CanonicalModelConfig::create("voyage-3-large", EmbeddingProvider::Voyage, &config);
        prop_assert!(canonical.validate().is_ok());
    }
}
