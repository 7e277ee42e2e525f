//! Configuration models.

pub mod config;
pub mod field;

pub use config::{
    DateOrder, EngineConfig, GridConfig, LocaleConfig, PhoneticAlgorithm, PhoneticConfig,
    SimilarityAlgorithm, SimilarityConfig,
};
pub use field::{
    Expression, FieldConfig, FieldSpec, HorizontalStatus, ROOT_NAME, ScalarType, SearchParams,
    ValueType,
};
