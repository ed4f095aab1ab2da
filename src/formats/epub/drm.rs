//! Encryption descriptor inspection. Anything but font obfuscation is refused.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, warn};

use crate::error::{ParseError, Result};
use crate::formats::xml::{attr, local_name};

pub const ENCRYPTION_PATH: &str = "META-INF/encryption.xml";

/// Font obfuscation algorithms (IDPF and Adobe).
pub const FONT_OBFUSCATION: &[&str] = &[
    "http://www.idpf.org/2008/embedding",
    "http://ns.adobe.com/pdf/enc#RC",
];

/// Fail with [`ParseError::DrmProtected`] unless every encrypted entry is an
/// obfuscated font. A descriptor that cannot be read counts as protected.
pub fn check_encryption(descriptor: &str) -> Result<()> {
    let mut reader = Reader::from_str(descriptor);
    reader.config_mut().trim_text(true);

    // Algorithm of the EncryptedData being read, if it has declared one.
    let mut current: Option<Option<String>> = None;
    let mut entries = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"EncryptedData" => current = Some(None),
                b"EncryptionMethod" => record_algorithm(&mut current, attr(&e, b"Algorithm")),
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"EncryptedData" => {
                    entries += 1;
                    verdict(None)?;
                }
                b"EncryptionMethod" => record_algorithm(&mut current, attr(&e, b"Algorithm")),
                _ => {}
            },
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == b"EncryptedData" => {
                entries += 1;
                verdict(current.take().flatten().as_deref())?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "unreadable encryption descriptor");
                return Err(ParseError::DrmProtected(format!(
                    "unreadable {ENCRYPTION_PATH}: {e}"
                )));
            }
            _ => {}
        }
    }

    debug!(entries, "only font obfuscation in encryption descriptor");
    Ok(())
}

fn record_algorithm(current: &mut Option<Option<String>>, algorithm: Option<String>) {
    if let Some(slot) = current
        && slot.is_none()
    {
        *slot = algorithm.map(|a| a.trim().to_string());
    }
}

fn verdict(algorithm: Option<&str>) -> Result<()> {
    match algorithm {
        Some(a) if FONT_OBFUSCATION.contains(&a) => Ok(()),
        Some(a) => {
            warn!(algorithm = a, "content is encrypted");
            Err(ParseError::DrmProtected(format!("encryption algorithm {a}")))
        }
        None => {
            warn!("encrypted entry without algorithm");
            Err(ParseError::DrmProtected("encrypted entry without algorithm".into()))
        }
    }
}
