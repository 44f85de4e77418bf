pub mod local_file_storage;
pub mod reqwest_transport;
