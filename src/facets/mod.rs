//! Facet counting, facet filtering, and facet censoring over raw hits.

pub mod censor;
pub mod counter;
pub mod filter;

pub use censor::censor;
pub use counter::count_facets;
pub use filter::{FacetFilters, FieldEquals, FilterClause};
