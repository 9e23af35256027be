use garde::Validate;
use serde::Deserialize;

use crate::Constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Paging parameters as sent, they are parsed leniently.
#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Validate)]
pub struct PageRequest {
    #[garde(custom(is_valid_page))]
    pub page: i64,
    #[garde(custom(is_valid_limit))]
    pub limit: i64,
}

// Leading integer of `raw`, ignoring whatever trails it ("12abc" is 12)
pub fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

// Missing, unparsable and zero all mean "use the default"
fn or_default(raw: &Option<String>, default: u32) -> i64 {
    match raw.as_deref().and_then(leading_integer) {
        None | Some(0) => default as i64,
        Some(value) => value,
    }
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: or_default(&self.page, DEFAULT_PAGE),
            limit: or_default(&self.limit, DEFAULT_PAGE_SIZE),
        }
    }
}

pub fn is_valid_page(value: &i64, _: &()) -> garde::Result {
    if *value < 1 {
        return Err(garde::Error::new("Page must be greater than 0"));
    }
    Ok(())
}

pub fn is_valid_limit(value: &i64, _: &()) -> garde::Result {
    if *value < 1 || *value > MAX_PAGE_SIZE as i64 {
        return Err(garde::Error::new("Limit must be between 1 and 100"));
    }
    Ok(())
}
