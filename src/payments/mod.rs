pub mod razorpay;

pub use razorpay::{GatewayOrder, RazorpayClient};
