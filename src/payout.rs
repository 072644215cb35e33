//! Parameter and result types of the payout endpoints.
//!
//! Parameters serialize with the provider's camelCase field names; unset
//! optional fields are omitted from the request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::types::{BeneficiaryId, TransferId};

/// Bank account to check with `validation/bankDetails`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BankDetails {
    pub bank_account: String,
    pub ifsc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl BankDetails {
    #[must_use]
    pub fn new(bank_account: impl Into<String>, ifsc: impl Into<String>) -> Self {
        Self {
            bank_account: bank_account.into(),
            ifsc: ifsc.into(),
            name: None,
            phone: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Result of a bank account validation. Only returned when the account exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BankValidation {
    pub account_exists: String,
    #[serde(default)]
    pub name_at_bank: Option<String>,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// New payee for `addBeneficiary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct NewBeneficiary {
    pub bene_id: BeneficiaryId,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifsc: Option<String>,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

impl NewBeneficiary {
    #[must_use]
    pub fn new(
        bene_id: BeneficiaryId,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        address1: impl Into<String>,
    ) -> Self {
        Self {
            bene_id,
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            bank_account: None,
            ifsc: None,
            address1: address1.into(),
            address2: None,
            city: None,
            state: None,
            pincode: None,
        }
    }

    /// Bank account the beneficiary is paid into.
    #[must_use]
    pub fn with_bank_account(
        mut self,
        bank_account: impl Into<String>,
        ifsc: impl Into<String>,
    ) -> Self {
        self.bank_account = Some(bank_account.into());
        self.ifsc = Some(ifsc.into());
        self
    }

    #[must_use]
    pub fn with_address2(mut self, address2: impl Into<String>) -> Self {
        self.address2 = Some(address2.into());
        self
    }

    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn with_pincode(mut self, pincode: impl Into<String>) -> Self {
        self.pincode = Some(pincode.into());
        self
    }
}

/// Bank account to resolve with `getBeneId`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryLookup {
    pub bank_account: String,
    pub ifsc: String,
}

impl BeneficiaryLookup {
    #[must_use]
    pub fn new(bank_account: impl Into<String>, ifsc: impl Into<String>) -> Self {
        Self {
            bank_account: bank_account.into(),
            ifsc: ifsc.into(),
        }
    }
}

/// Beneficiary to delete with `removeBeneficiary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBeneficiary {
    pub bene_id: BeneficiaryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifsc: Option<String>,
}

impl RemoveBeneficiary {
    #[must_use]
    pub fn new(bene_id: BeneficiaryId) -> Self {
        Self { bene_id, ifsc: None }
    }
}

/// Cursor-style paging shared by `getBeneficiaries` and `getTransfers`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_return: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_return_id: Option<String>,
}

/// Transfer mode accepted by `requestTransfer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum TransferMode {
    Banktransfer,
    Upi,
    Paytm,
    Amazonpay,
    Card,
}

/// Payout request for `requestTransfer`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TransferRequest {
    pub bene_id: BeneficiaryId,
    /// Amount in rupees; sent as a JSON number.
    pub amount: f64,
    pub transfer_id: TransferId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_mode: Option<TransferMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl TransferRequest {
    #[must_use]
    pub fn new(bene_id: BeneficiaryId, amount: f64, transfer_id: TransferId) -> Self {
        Self {
            bene_id,
            amount,
            transfer_id,
            transfer_mode: None,
            remarks: None,
        }
    }

    #[must_use]
    pub fn with_transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// Transfer to look up with `getTransferStatus`. Either id is enough.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLookup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<TransferId>,
}

impl TransferLookup {
    #[must_use]
    pub fn by_transfer_id(transfer_id: TransferId) -> Self {
        Self {
            reference_id: None,
            transfer_id: Some(transfer_id),
        }
    }

    #[must_use]
    pub fn by_reference_id(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: Some(reference_id.into()),
            transfer_id: None,
        }
    }
}
