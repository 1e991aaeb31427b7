use crate::modules::payments::TransactionStatus;

/// Map a PSE gateway response code to the internal transaction status.
///
/// Total over every possible input: unknown codes resolve to Pending so
/// an operator or a later webhook settles them. An unrecognized code is
/// never treated as approved.
pub fn map_response_code(code: &str) -> TransactionStatus {
    match code {
        "1" => TransactionStatus::Approved,
        "2" | "4" | "6" | "7" | "8" | "9" | "10" => TransactionStatus::Rejected,
        "3" => TransactionStatus::Pending,
        _ => TransactionStatus::Pending,
    }
}
