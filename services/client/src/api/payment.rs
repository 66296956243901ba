//! services/client/src/api/payment.rs
//!
//! Wallet top-up and withdrawal. Required fields are checked before any
//! request leaves the client.

use marketplace_core::domain::{Bank, PaymentLink, WithdrawalRequest};
use marketplace_core::ports::{ApiRequest, PortError, PortResult};
use serde_json::json;

use super::wire::{BankRecord, PageBody, PaymentLinkRecord};
use super::MarketplaceApi;

impl MarketplaceApi {
    /// POST /payment/create - returns the checkout link for a wallet top-up.
    pub async fn create_payment(&self, amount: i64) -> PortResult<PaymentLink> {
        if amount <= 0 {
            return Err(PortError::Validation(
                "Top-up amount must be greater than zero".to_string(),
            ));
        }
        let request = ApiRequest::post("/payment/create").json(json!({ "amount": amount }));
        self.client
            .send_json::<PaymentLinkRecord>(request)
            .await
            .map(PaymentLinkRecord::to_domain)
    }

    /// POST /payment/withdraw
    pub async fn withdraw(&self, withdrawal: &WithdrawalRequest) -> PortResult<()> {
        validate_withdrawal(withdrawal)?;
        let request = ApiRequest::post("/payment/withdraw").json(json!({
            "amount": withdrawal.amount,
            "bankCode": withdrawal.bank_code,
            "accountNumber": withdrawal.account_number.trim(),
            "accountName": withdrawal.account_name.trim(),
        }));
        self.client.send_ok(request).await?;
        Ok(())
    }

    /// GET /payment/banks
    pub async fn banks(&self) -> PortResult<Vec<Bank>> {
        let body: PageBody<BankRecord> = self
            .client
            .get_json(ApiRequest::get("/payment/banks"))
            .await?;
        Ok(body.into_parts().0.into_iter().map(BankRecord::to_domain).collect())
    }
}

pub fn validate_withdrawal(withdrawal: &WithdrawalRequest) -> PortResult<()> {
    if withdrawal.amount <= 0 {
        return Err(PortError::Validation(
            "Withdrawal amount must be greater than zero".to_string(),
        ));
    }
    let required = [
        ("bank", &withdrawal.bank_code),
        ("account number", &withdrawal.account_number),
        ("account name", &withdrawal.account_name),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(PortError::Validation(format!("Missing {}", field)));
    }
    if !withdrawal.account_number.trim().chars().all(|c| c.is_ascii_digit()) {
        return Err(PortError::Validation(
            "Account number must contain digits only".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdrawal() -> WithdrawalRequest {
        WithdrawalRequest {
            amount: 50_000,
            bank_code: "970436".into(),
            account_number: "0123456789".into(),
            account_name: "NGUYEN VAN A".into(),
        }
    }

    #[test]
    fn accepts_complete_withdrawal() {
        assert!(validate_withdrawal(&withdrawal()).is_ok());
    }

    #[test]
    fn rejects_missing_fields() {
        let mut w = withdrawal();
        w.account_name = "  ".into();
        let err = validate_withdrawal(&w).unwrap_err();
        assert!(matches!(err, PortError::Validation(msg) if msg == "Missing account name"));

        let mut w = withdrawal();
        w.amount = 0;
        assert!(validate_withdrawal(&w).is_err());

        let mut w = withdrawal();
        w.account_number = "01-23".into();
        assert!(validate_withdrawal(&w).is_err());
    }
}
