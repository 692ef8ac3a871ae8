pub mod record_point_qdrant_repository;
