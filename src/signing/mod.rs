pub mod hmac;

pub use hmac::{encode_query, ApiCredentials, HmacAuth};
