//! Monthly spending summary, broken down by category.

mod aggregation;
mod charts;
mod page;

pub use page::get_summary_page;
