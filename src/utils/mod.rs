pub mod db_utils;
pub mod document_cache;
