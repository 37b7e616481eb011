pub mod interaction;
pub mod job;
pub mod job_match;
pub mod saved_search;
pub mod user;
