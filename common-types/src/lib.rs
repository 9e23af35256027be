#[allow(non_snake_case)]
pub mod Question {
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
    pub struct MatchPair {
        #[serde(rename = "columnA")]
        pub column_a: String,
        #[serde(rename = "columnB")]
        pub column_b: String,
    }

    /// Either a single answer (`"B"`, `"true"`) or several answers for
    /// multiple choice questions.
    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
    #[serde(untagged)]
    pub enum CorrectAnswer {
        Single(String),
        Multiple(Vec<String>),
    }

    impl CorrectAnswer {
        // An empty string or an empty list carries no answer
        pub fn is_blank(&self) -> bool {
            match self {
                CorrectAnswer::Single(answer) => answer.is_empty(),
                CorrectAnswer::Multiple(answers) => answers.is_empty(),
            }
        }
    }
}

#[allow(non_snake_case)]
pub mod Envelope {
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
    pub struct FieldError {
        pub field: String,
        pub message: String,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pagination {
        pub page: u32,
        pub limit: u32,
        pub total: u64,
        #[serde(rename = "totalPages")]
        pub total_pages: u64,
    }

    impl Pagination {
        pub fn new(page: u32, limit: u32, total: u64) -> Self {
            let total_pages = match limit {
                0 => 0,
                limit => total.div_ceil(limit as u64),
            };
            Self { page, limit, total, total_pages }
        }
    }

    /// Uniform body of every response the service sends.
    #[derive(Deserialize, Serialize, Debug, Clone)]
    pub struct Response<T> {
        pub success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub data: Option<T>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub details: Option<Vec<FieldError>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub pagination: Option<Pagination>,
    }

    impl<T> Response<T> {
        pub fn ok<M: ToString>(message: M, data: T) -> Self {
            Self {
                success: true,
                message: Some(message.to_string()),
                error: None,
                data: Some(data),
                details: None,
                pagination: None,
            }
        }

        pub fn with_pagination(mut self, pagination: Pagination) -> Self {
            self.pagination = Some(pagination);
            self
        }
    }

    impl Response<()> {
        pub fn message<M: ToString>(message: M) -> Self {
            Self {
                success: true,
                message: Some(message.to_string()),
                error: None,
                data: None,
                details: None,
                pagination: None,
            }
        }

        pub fn failure<E: ToString>(error: E) -> Self {
            Self {
                success: false,
                message: None,
                error: Some(error.to_string()),
                data: None,
                details: None,
                pagination: None,
            }
        }

        pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
            self.details = Some(details);
            self
        }
    }
}

#[allow(non_snake_case)]
pub mod Ip {
    // Proxies in front of the service report the client in one of these,
    // checked in order. 'host' is only trusted in development.

    use ::std::net::{Ipv4Addr, Ipv6Addr};
    use axum::http::HeaderMap;

    const HEADERS: [&'static str; 6] = [
        "cf-connecting-ip",
        "x-forwarded-for",
        "x-real-ip",
        "fly-client-ip",
        "true-client-ip",
        "host",
    ];

    // https://superuser.com/questions/381022/how-many-characters-can-an-ip-address-be
    const MAX_ADDRESS_LEN: usize = 62;

    fn parse_address(data: &str) -> Option<Ipv6Addr> {
        let data = data.trim();
        if let Ok(ipv6) = data.parse::<Ipv6Addr>() {
            return Some(ipv6)
        }
        if let Ok(ipv4) = data.parse::<Ipv4Addr>() {
            return Some(ipv4.to_ipv6_mapped())
        }
        // ipv4 with a port attached
        data.split_once(':')
            .and_then(|(ip_str, _)| ip_str.parse::<Ipv4Addr>().ok())
            .map(|ipv4| ipv4.to_ipv6_mapped())
    }

    pub fn try_fetch_ipv6(headers: &HeaderMap, development_mode: bool) -> Option<Ipv6Addr> {
        let trusted = match development_mode {
            true => &HEADERS[..],
            false => &HEADERS[..HEADERS.len() - 1],
        };
        for header_name in trusted {
            let Some(header_value) = headers.get(*header_name) else {
                continue
            };
            let Ok(str_header_value) = header_value.to_str() else {
                continue
            };
            let candidate = match *header_name {
                "x-forwarded-for" => str_header_value.split(',').next().unwrap_or_default(),
                _ if str_header_value.len() > MAX_ADDRESS_LEN => continue,
                _ => str_header_value,
            };
            if let Some(ipv6) = parse_address(candidate) {
                return Some(ipv6)
            }
        }
        if development_mode {
            return Some(Ipv6Addr::LOCALHOST)
        }
        None
    }

}
