pub mod error_details;
