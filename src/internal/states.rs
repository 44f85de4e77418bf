pub mod transfer_monitor;
