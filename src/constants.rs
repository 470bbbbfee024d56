// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";

// Auth configuration
pub const MIN_AUTH_SECRET_LENGTH: usize = 32;

// Query limits and defaults
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 500;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MAX_WALLET_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_CATEGORY_LENGTH: usize = 100;
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;

// Transfers are recorded as two linked transactions under this category.
pub const TRANSFER_CATEGORY: &str = "Transfer";

// Error messages
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_NO_TOKEN: &str = "Not authorized, no token";
pub const ERR_TOKEN_FAILED: &str = "Not authorized, token failed";
pub const ERR_TOKEN_EXPIRED: &str = "Authorization token expired";
pub const ERR_WALLET_NOT_FOUND: &str = "Wallet not found";
pub const ERR_TRANSACTION_NOT_FOUND: &str = "Transaction not found";
pub const ERR_INSUFFICIENT_FUNDS: &str = "Insufficient wallet balance";
pub const ERR_WALLET_HAS_TRANSACTIONS: &str = "Cannot delete wallet with existing transactions";
