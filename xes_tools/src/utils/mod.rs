/// Helper utils regarding XML export
pub mod xml_utils;
