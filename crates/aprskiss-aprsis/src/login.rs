use std::fmt;

/// Passcode that logs in receive-only.
pub const RECEIVE_ONLY_PASSCODE: &str = "-1";

/// Software identifier sent in the `vers` field of the login line.
pub const DEFAULT_CLIENT_ID: &str = concat!("aprskiss ", env!("CARGO_PKG_VERSION"));

/// APRS-IS login identity.
///
/// The passcode is credential material: it never appears in `Debug` output
/// or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    passcode: String,
    client_id: String,
}

impl Credentials {
    /// Receive-only credentials for `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            passcode: RECEIVE_ONLY_PASSCODE.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
        }
    }

    pub fn with_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.passcode = passcode.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `user <user> pass <passcode> vers <client-id>`, also the first line of
    /// HTTP and UDP submissions.
    pub fn auth_line(&self) -> String {
        format!(
            "user {} pass {} vers {}",
            self.user, self.passcode, self.client_id
        )
    }

    /// Prefix filter on the user's own callsign: `p/<user>`.
    pub fn default_filter(&self) -> String {
        format!("p/{}", self.user)
    }

    /// Full TCP login line, without the line terminator.
    pub fn login_line(&self, filter: Option<&str>) -> String {
        let filter = match filter {
            Some(filter) if !filter.trim().is_empty() => filter.to_string(),
            _ => self.default_filter(),
        };
        format!("{} filter {}", self.auth_line(), filter)
    }

    /// The login line with the passcode masked, for logs.
    pub(crate) fn redacted_login_line(&self, filter: Option<&str>) -> String {
        self.login_line(filter).replacen(
            &format!(" pass {} ", self.passcode),
            " pass <redacted> ",
            1,
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field(
                "passcode",
                &format_args!("<redacted:{} bytes>", self.passcode.len()),
            )
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// A parsed `# logresp` server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogResp {
    pub callsign: String,
    pub verified: bool,
    pub server: Option<String>,
}

/// Parse `# logresp N0CALL verified, server T2EXAMPLE`.
///
/// Returns `None` for any other line.
pub fn parse_logresp(line: &str) -> Option<LogResp> {
    let rest = line.strip_prefix('#')?.trim_start().strip_prefix("logresp")?;
    let mut words = rest.split_whitespace();
    let callsign = words.next()?.to_string();
    let verified = match words.next()?.trim_end_matches(',') {
        "verified" => true,
        "unverified" => false,
        _ => return None,
    };
    let server = match words.next() {
        Some("server") => words.next().map(str::to_string),
        _ => None,
    };
    Some(LogResp {
        callsign,
        verified,
        server,
    })
}
