//! Checks applied to caller-supplied URLs before anything is fetched.

use std::net::IpAddr;

use url::{Host, Url};

use sentinel_common::{Result, SentinelError};

const MAX_URL_LEN: usize = 2048;
const MAX_REDIRECTS: usize = 10;

/// Parse `url` and reject anything that is not a public http(s) address.
pub fn validate_url(url: &str) -> Result<Url> {
    let url = url.trim();
    if url.is_empty() {
        return Err(invalid("URL must not be empty"));
    }
    if url.len() > MAX_URL_LEN {
        return Err(invalid("URL too long (max 2048 characters)"));
    }

    let parsed = Url::parse(url).map_err(|_| invalid("Invalid URL"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid("URL must use http or https scheme"));
    }

    // Block private/loopback IPs to prevent SSRF
    match parsed.host() {
        None => return Err(invalid("URL must have a host")),
        Some(Host::Ipv4(v4)) => reject_private(IpAddr::V4(v4))?,
        Some(Host::Ipv6(v6)) => reject_private(IpAddr::V6(v6))?,
        Some(Host::Domain(domain)) => {
            // `localhost.` resolves exactly like `localhost`
            let lower = domain.trim_end_matches('.').to_lowercase();
            if lower == "localhost"
                || lower.ends_with(".localhost")
                || lower.ends_with(".local")
                || lower.ends_with(".internal")
            {
                return Err(invalid("URLs pointing to internal hosts are not allowed"));
            }
        }
    }

    Ok(parsed)
}

/// Redirect hops get the same checks as the submitted URL.
pub(crate) fn check_redirect(next: &Url, previous_hops: usize) -> Result<()> {
    if previous_hops >= MAX_REDIRECTS {
        return Err(invalid("Too many redirects"));
    }
    validate_url(next.as_str()).map(|_| ())
}

fn reject_private(ip: IpAddr) -> Result<()> {
    if is_private_ip(ip) {
        return Err(invalid(
            "URLs pointing to private/loopback addresses are not allowed",
        ));
    }
    Ok(())
}

fn invalid(msg: &str) -> SentinelError {
    SentinelError::Validation(msg.to_string())
}

/// Loopback, link-local (cloud metadata included), RFC 1918 and RFC 4193.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || a == 10
                || (a == 172 && (16..=31).contains(&b))
                || (a == 192 && b == 168)
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_ip(IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (v6.segments()[0] & 0xfe00) == 0xfc00
                    || (v6.segments()[0] & 0xffc0) == 0xfe80
            }
        },
    }
}
