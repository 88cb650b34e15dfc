use super::ApiError;
use crate::domain::{AccountId, RecordId};

pub fn validate_account_id(id: i32) -> Result<AccountId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(AccountId::new(id))
}

pub fn validate_record_id(id: i32) -> Result<RecordId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid keyword record ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(RecordId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ids() {
        assert_eq!(validate_account_id(7).unwrap(), AccountId::new(7));
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(-3).is_err());
        assert_eq!(validate_record_id(1).unwrap(), RecordId::new(1));
        assert!(validate_record_id(0).is_err());
    }
}
