//! Maps raw HTTP status codes onto the outcomes the session state machine
//! reacts to.
//!
//! Only an exact `200` ends a call chain successfully. `201`, `204` and the
//! rest of the 2xx range classify as [`StatusClass::Other`] and surface to the
//! caller as non-retryable failures.

/// Semantic outcome of a single response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// Exactly `200`.
    Ok,
    /// Exactly `401`.
    Unauthorized,
    /// `300..=307`.
    Redirect,
    /// Everything else.
    Other,
}

/// Classifies a status code.
pub fn classify(code: u16) -> StatusClass {
    if is_ok(code) {
        StatusClass::Ok
    } else if is_unauthorized(code) {
        StatusClass::Unauthorized
    } else if is_redirect(code) {
        StatusClass::Redirect
    } else {
        StatusClass::Other
    }
}

pub fn is_ok(code: u16) -> bool {
    code == 200
}

pub fn is_unauthorized(code: u16) -> bool {
    code == 401
}

/// `300 Multiple Choices` through `307 Temporary Redirect`, inclusive.
pub fn is_redirect(code: u16) -> bool {
    (300..=307).contains(&code)
}

pub fn is_created(code: u16) -> bool {
    code == 201
}

pub fn is_no_content(code: u16) -> bool {
    code == 204
}

/// Formats `"<code> <reason>"`, e.g. `"503 Service Unavailable"`.
pub fn status_line(code: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());
    match reason {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, is_created, is_no_content, status_line, StatusClass};

    #[test]
    fn only_exact_200_is_ok() {
        assert_eq!(classify(200), StatusClass::Ok);
        for code in [201, 202, 204, 206, 299] {
            assert_eq!(classify(code), StatusClass::Other, "code {code}");
        }
    }

    #[test]
    fn unauthorized_is_exactly_401() {
        assert_eq!(classify(401), StatusClass::Unauthorized);
        assert_eq!(classify(403), StatusClass::Other);
        assert_eq!(classify(407), StatusClass::Other);
    }

    #[test]
    fn redirect_range_is_300_to_307_inclusive() {
        for code in 300..=307 {
            assert_eq!(classify(code), StatusClass::Redirect, "code {code}");
        }
        assert_eq!(classify(299), StatusClass::Other);
        assert_eq!(classify(308), StatusClass::Other);
    }

    #[test]
    fn remaining_codes_are_other() {
        for code in [0, 100, 400, 404, 500, 502, 503, 599] {
            assert_eq!(classify(code), StatusClass::Other, "code {code}");
        }
    }

    #[test]
    fn auxiliary_predicates() {
        assert!(is_created(201));
        assert!(!is_created(200));
        assert!(is_no_content(204));
        assert!(!is_no_content(200));
    }

    #[test]
    fn status_line_uses_canonical_reason() {
        assert_eq!(status_line(503), "503 Service Unavailable");
        assert_eq!(status_line(599), "599");
    }
}
