use std::time::Duration;

pub const PRODUCTION_BASE_URL: &str = "https://payout-api.cashfree.com";
pub const TEST_BASE_URL: &str = "https://payout-gamma.cashfree.com";

/// Transport timeout applied to every call unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const AUTHENTICATE: &str = "/payout/v1/authorize";
pub const VERIFY_TOKEN: &str = "/payout/v1/verifyToken";
pub const ADD_BENEFICIARY: &str = "/payout/v1/addBeneficiary";
pub const VALIDATE_BENEFICIARY: &str = "/payout/v1/validation/bankDetails";
pub const GET_BENEFICIARIES: &str = "/payout/v1/getBeneficiaries";
pub const GET_BENEFICIARY_ID: &str = "/payout/v1/getBeneId";
pub const GET_BENEFICIARY: &str = "/payout/v1/getBeneficiary";
pub const REMOVE_BENEFICIARY: &str = "/payout/v1/removeBeneficiary";
pub const REQUEST_TRANSFER: &str = "/payout/v1/requestTransfer";
pub const GET_BALANCE: &str = "/payout/v1/getBalance";
pub const LIST_TRANSFERS: &str = "/payout/v1/getTransfers";
pub const GET_TRANSFER: &str = "/payout/v1/getTransferStatus";
