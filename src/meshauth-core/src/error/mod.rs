pub mod configuration;
pub mod fs;
pub mod handle_request;
pub mod lookup;
pub mod reqwest;
pub mod structured_file;
pub mod who_is;
