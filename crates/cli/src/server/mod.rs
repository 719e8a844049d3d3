pub mod dns;

pub use dns::{spawn_signal_handler, start_dns_server};
