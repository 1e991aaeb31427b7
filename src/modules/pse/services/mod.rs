pub mod intent;
pub mod pse_client;
pub mod reconciliation;
pub mod signature;
pub mod status_map;

pub use intent::PaymentIntentBuilder;
pub use pse_client::{CreatePaymentRequest, EpaycoClient, GatewayPaymentData, PseGateway};
pub use reconciliation::{ReconciliationEngine, ReconciliationResult};
pub use signature::{SignatureCodec, CURRENCY_COP};
pub use status_map::map_response_code;
