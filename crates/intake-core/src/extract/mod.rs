//! Field extraction pipeline: normalize, split, match, extract, classify.

mod classify;
mod dates;
mod extractor;
mod key;
mod matcher;
mod normalize;

pub use classify::{classify, classify_record, classify_value, invoice_fields};
pub use dates::normalize_date;
pub use extractor::{FieldExtractor, extract_fields};
pub use key::split_key;
pub use matcher::find_matching_field;
pub use normalize::normalize;
