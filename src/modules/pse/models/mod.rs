mod bank;
mod payment_intent;
mod webhook_event;

pub use bank::Bank;
pub use payment_intent::PaymentIntent;
pub use webhook_event::PseWebhookEvent;
