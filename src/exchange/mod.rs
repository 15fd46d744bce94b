pub mod factory;
pub mod scripted;
mod traits;

pub use factory::build_gateway;
pub use scripted::ScriptedGateway;
pub use traits::ExchangeGateway;

#[cfg(test)]
pub use traits::MockExchangeGateway;
