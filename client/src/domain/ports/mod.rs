//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Both gateways are driven ports: the hosted backend sits behind them and
//! the domain never sees HTTP. Each trait exposes a typed error enum so
//! adapters map transport failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod data_gateway;
mod notifier;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{
    AuthEvent, AuthEventKind, AuthGateway, AuthGatewayError, SessionSubscription,
};
#[cfg(test)]
pub use data_gateway::MockDataGateway;
pub use data_gateway::{
    DataGateway, DataGatewayError, Filter, Order, Query, Record, Table, decode_record,
    decode_rows, encode_record,
};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notification, NotificationLevel, Notifier};
