/// Data layer: core types, loading, filtering, aggregation, and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (derives date/hour/day_part once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, facet indices, immutable post-load
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌───────────┐      ┌──────────┐
///   │  filter   │ ───▶ │ analysis  │ ───▶ │  export   │
///   └──────────┘      └───────────┘      └──────────┘
///    criteria →        group/aggregate,    filtered view →
///    row indices       anomalies, corr     .csv / .json
/// ```
///
/// Everything below `loader` is a pure function of `(&Dataset, inputs)`;
/// the dataset is never mutated after load.

pub mod analysis;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
