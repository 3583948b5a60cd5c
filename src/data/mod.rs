/// Data layer: core types, parsing, coercion and splitting.
///
/// Architecture:
/// ```text
///  raw .arff bytes
///        │
///        ▼
///   ┌──────────┐
///   │   arff    │  parse bytes → Table (+ ParseStats)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  coerce   │  column-wide numeric normalization
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ stratify  │  pick a label-like categorical column
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  seeded two-stage split → train / val / test
///   └──────────┘
/// ```

pub mod arff;
pub mod coerce;
pub mod loader;
pub mod model;
pub mod split;
pub mod stratify;
