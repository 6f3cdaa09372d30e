//! HTTP handlers: parse the request, call one data-access helper, map the
//! outcome to a status code.

pub mod comments;
pub mod posts;
pub mod users;

use crate::error::AppError;

pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::parse_id;
    use crate::error::AppError;

    #[test]
    fn numeric_ids_parse() {
        assert_eq!(parse_id("7").unwrap(), 7);
        assert_eq!(parse_id("-1").unwrap(), -1);
    }

    #[test]
    fn non_numeric_ids_are_bad_requests() {
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id(""), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("1.5"), Err(AppError::BadRequest(_))));
    }
}
