//! Federate and federation names.
//!
//! A federate is named `S<site>A<application>` and a federation
//! `E<exercise>`. Parsing accepts exactly what the generators produce:
//! decimal digits without signs, leading zeros or surrounding text.

use crate::error::{NetIoError, Result};

pub fn make_federate_name(site: u16, application: u16) -> String {
    format!("S{}A{}", site, application)
}

/// Federation name for an exercise; exercise ids start at 1.
pub fn make_federation_name(exercise: u8) -> Result<String> {
    if exercise == 0 {
        return Err(NetIoError::InvalidConfig(
            "exercise id must be greater than zero".to_string(),
        ));
    }
    Ok(format!("E{}", exercise))
}

/// Recovers (site, application) from a federate name.
pub fn parse_federate_name(name: &str) -> Result<(u16, u16)> {
    let invalid = || NetIoError::InvalidFormat(name.to_string());

    let rest = name.strip_prefix('S').ok_or_else(invalid)?;
    let (site, application) = rest.split_once('A').ok_or_else(invalid)?;
    Ok((
        parse_number(site).ok_or_else(invalid)?,
        parse_number(application).ok_or_else(invalid)?,
    ))
}

/// Recovers the exercise id from a federation name.
pub fn parse_federation_name(name: &str) -> Result<u8> {
    let invalid = || NetIoError::InvalidFormat(name.to_string());

    let digits = name.strip_prefix('E').ok_or_else(invalid)?;
    match parse_number::<u8>(digits) {
        Some(exercise) if exercise > 0 => Ok(exercise),
        _ => Err(invalid()),
    }
}

/// Canonical decimal only: non-empty, ASCII digits, no leading zero.
fn parse_number<T: std::str::FromStr>(digits: &str) -> Option<T> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if !canonical {
        return None;
    }
    digits.parse().ok()
}
