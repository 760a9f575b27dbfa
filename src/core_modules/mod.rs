pub mod disjoint_set;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod island_filter;
pub mod island_labeler;
pub mod island_ranker;
pub mod threshold;
pub mod utils;
