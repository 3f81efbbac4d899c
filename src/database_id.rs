/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
