pub mod forwarder;
pub mod header;
pub mod message_builder;
pub mod query_parser;
pub mod record_type_map;
pub mod response_parser;

pub use forwarder::UdpForwarder;
pub use message_builder::MessageBuilder;
pub use query_parser::QueryParser;
pub use record_type_map::RecordTypeMapper;
pub use response_parser::ResponseParser;

/// Size of the fixed DNS message header (RFC 1035 §4.1.1).
pub const DNS_HEADER_LEN: usize = 12;
