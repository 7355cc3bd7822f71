use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use crate::config::PaymentConfig;
use crate::utils::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Order record returned by the gateway's order API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Razorpay REST client. Order creation goes over the wire; signature
/// verification is local HMAC arithmetic and needs no network.
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayClient {
    pub fn new(cfg: &PaymentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id: cfg.key_id.clone(),
            key_secret: cfg.key_secret.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Creates a gateway order. `amount` is in the currency's smallest
    /// unit (paise for INR).
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ApiError> {
        let url = format!("{}/v1/orders", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("order request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!(
                "order creation returned {}: {}",
                status, body
            )));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| ApiError::Gateway(format!("malformed order response: {}", e)))
    }

    fn expected_signature(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks the signature the checkout flow posts back after payment:
    /// HMAC-SHA256 of `"{order_id}|{payment_id}"` under the key secret.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        self.expected_signature(order_id, payment_id)
            .eq_ignore_ascii_case(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RazorpayClient {
        RazorpayClient::new(&PaymentConfig {
            key_id: "rzp_test_key".into(),
            key_secret: "rzp_test_secret".into(),
            base_url: "https://api.razorpay.com".into(),
            connection_fee: 49900,
            currency: "INR".into(),
        })
    }

    #[test]
    fn valid_signature_verifies() {
        let client = client();
        let signature = client.expected_signature("order_abc", "pay_xyz");
        assert!(client.verify_payment_signature("order_abc", "pay_xyz", &signature));
        // Hex case must not matter.
        assert!(client.verify_payment_signature("order_abc", "pay_xyz", &signature.to_uppercase()));
    }

    #[test]
    fn wrong_ids_or_signature_fail() {
        let client = client();
        let signature = client.expected_signature("order_abc", "pay_xyz");
        assert!(!client.verify_payment_signature("order_other", "pay_xyz", &signature));
        assert!(!client.verify_payment_signature("order_abc", "pay_other", &signature));
        assert!(!client.verify_payment_signature("order_abc", "pay_xyz", &"0".repeat(64)));
    }

    #[test]
    fn trailing_slash_in_base_url_is_normalized() {
        let client = RazorpayClient::new(&PaymentConfig {
            key_id: "k".into(),
            key_secret: "s".into(),
            base_url: "https://api.razorpay.com/".into(),
            connection_fee: 100,
            currency: "INR".into(),
        });
        assert_eq!(client.base_url, "https://api.razorpay.com");
    }
}
