//! Statistics and text distributions for a table and its split subsets.

pub mod chart;
pub mod summary;
