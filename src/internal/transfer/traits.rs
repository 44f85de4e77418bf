pub mod destination_storage;
pub mod progress_sink;
pub mod range_transport;
