//! HTTP implementation of the engine's payment-gateway seam.
//!
//! Talks to a Daraja-style STK push endpoint. Any transport or gateway
//! error surfaces as a `GatewayError`; the engine treats that as a hard
//! failure and never credits a wallet for it.

use async_trait::async_trait;
use serde::Deserialize;

use engine::{GatewayError, PaymentGateway};

use crate::settings;

pub struct MpesaHttpGateway {
    http: reqwest::Client,
    base_url: String,
    shortcode: String,
    api_token: String,
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    correlation_id: String,
}

impl MpesaHttpGateway {
    pub fn new(config: settings::Mpesa) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            shortcode: config.shortcode,
            api_token: config.api_token,
            callback_url: config.callback_url,
        }
    }
}

#[async_trait]
impl PaymentGateway for MpesaHttpGateway {
    async fn stk_push(
        &self,
        phone: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<String, GatewayError> {
        // The gateway bills whole shillings.
        let amount = amount_minor / 100;
        let response = self
            .http
            .post(format!("{}/stkpush", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "shortcode": self.shortcode,
                "phone": phone,
                "amount": amount,
                "reference": reference,
                "callback_url": self.callback_url,
            }))
            .send()
            .await
            .map_err(|err| GatewayError(format!("stk push request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(GatewayError(format!(
                "stk push rejected with status {}",
                response.status()
            )));
        }

        let body: StkPushResponse = response
            .json()
            .await
            .map_err(|err| GatewayError(format!("invalid stk push response: {err}")))?;
        Ok(body.correlation_id)
    }
}
