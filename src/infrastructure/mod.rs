pub mod checkout;

pub use checkout::{
    checkout_unavailable, CheckoutGate, CheckoutPermit, CheckoutSession, CheckoutSurface,
    ConsoleCheckout,
};
