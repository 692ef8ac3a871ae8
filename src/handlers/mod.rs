pub mod find_similar_records;
pub mod index_records;
