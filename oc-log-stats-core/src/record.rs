use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RECORD_PATTERN: Regex = Regex::new(concat!(
        r"^(.*)",
        r"# REMOTE_ADDR:(.*)",
        r"# HTTP_USER_AGENT:(.*)",
        r"# HTTP_REFERER:(.*)",
        r"# HTTP_HOST:(.*)",
        r"# REQUEST_URI:(.*)",
        r"# HTTP_AUTHORIZATION:(.*)$",
    ))
    .expect("Failed to compile access log record pattern");
    static ref AUTHORIZATION_PATTERN: Regex = Regex::new(r"HTTP_AUTHORIZATION: ([^\s#]+)")
        .expect("Failed to compile authorization header pattern");
}

/// One access log line split into its fields.
///
/// Only `request_uri` and `authorization` drive the statistics; the rest are
/// kept so richer reports can be built on the same parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub preamble: &'a str,
    pub remote_addr: &'a str,
    pub user_agent: &'a str,
    pub referer: &'a str,
    pub host: &'a str,
    pub request_uri: &'a str,
    pub authorization: &'a str,
}

impl<'a> LogRecord<'a> {
    /// Returns `None` for lines that do not follow the access log grammar.
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = RECORD_PATTERN.captures(line.trim())?;
        let field = |idx: usize| caps.get(idx).map_or("", |m| m.as_str().trim());

        Some(LogRecord {
            preamble: field(1),
            remote_addr: field(2),
            user_agent: field(3),
            referer: field(4),
            host: field(5),
            request_uri: field(6),
            authorization: field(7),
        })
    }
}

/// Finds the authorization value anywhere in a line, without requiring the
/// rest of the record to be well formed.
pub fn scan_authorization(line: &str) -> Option<&str> {
    AUTHORIZATION_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "2024-03-01 10:00:00 # REMOTE_ADDR: 10.0.0.1 # HTTP_USER_AGENT: curl/8.0 \
        # HTTP_REFERER: None # HTTP_HOST: api.opencitations.net \
        # REQUEST_URI: /index/api/v1/citations/10.1007/s11192 \
        # HTTP_AUTHORIZATION: 0f1e2d3c-4b5a-6978-8a9b-0c1d2e3f4a5b";

    #[test]
    fn parses_all_fields_and_trims_them() {
        let record = LogRecord::parse(LINE).expect("line should match");
        assert_eq!(record.preamble, "2024-03-01 10:00:00");
        assert_eq!(record.remote_addr, "10.0.0.1");
        assert_eq!(record.user_agent, "curl/8.0");
        assert_eq!(record.referer, "None");
        assert_eq!(record.host, "api.opencitations.net");
        assert_eq!(record.request_uri, "/index/api/v1/citations/10.1007/s11192");
        assert_eq!(record.authorization, "0f1e2d3c-4b5a-6978-8a9b-0c1d2e3f4a5b");
    }

    #[test]
    fn tolerates_hash_inside_values() {
        let line = "ts # REMOTE_ADDR: 1.1.1.1 # HTTP_USER_AGENT: bot#2 # HTTP_REFERER: x \
            # HTTP_HOST: h # REQUEST_URI: /sparql?q=a#frag # HTTP_AUTHORIZATION: None";
        let record = LogRecord::parse(line).expect("line should match");
        assert_eq!(record.user_agent, "bot#2");
        assert_eq!(record.request_uri, "/sparql?q=a#frag");
        assert_eq!(record.authorization, "None");
    }

    #[test]
    fn rejects_lines_missing_a_segment() {
        let line = "ts # REMOTE_ADDR: 1.1.1.1 # HTTP_USER_AGENT: x # HTTP_HOST: h \
            # REQUEST_URI: /sparql # HTTP_AUTHORIZATION: None";
        assert!(LogRecord::parse(line).is_none());
        assert!(LogRecord::parse("").is_none());
        assert!(LogRecord::parse("GET /sparql HTTP/1.1").is_none());
    }

    #[test]
    fn rejects_segments_out_of_order() {
        let line = "ts # HTTP_USER_AGENT: x # REMOTE_ADDR: 1.1.1.1 # HTTP_REFERER: r \
            # HTTP_HOST: h # REQUEST_URI: /sparql # HTTP_AUTHORIZATION: None";
        assert!(LogRecord::parse(line).is_none());
    }

    #[test]
    fn scans_authorization_without_full_grammar() {
        assert_eq!(
            scan_authorization("junk HTTP_AUTHORIZATION: abc-def#rest"),
            Some("abc-def")
        );
        assert_eq!(
            scan_authorization(LINE),
            Some("0f1e2d3c-4b5a-6978-8a9b-0c1d2e3f4a5b")
        );
        assert_eq!(scan_authorization("no header here"), None);
    }
}
