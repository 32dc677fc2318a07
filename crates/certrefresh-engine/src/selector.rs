//! Picking the certificate a key should be served with

use certrefresh_cdn::Certificate;

/// Latest-expiring certificate valid at `epoch` (unix seconds)
///
/// The validity window is inclusive at both ends. When several certificates
/// share the greatest `not_after`, the first one wins.
pub fn select_latest_valid<'a, I>(certs: I, epoch: i64) -> Option<&'a Certificate>
where
    I: IntoIterator<Item = &'a Certificate>,
{
    certs
        .into_iter()
        .filter(|c| c.is_valid_at(epoch))
        .fold(None, |best: Option<&Certificate>, cert| match best {
            Some(b) if b.not_after >= cert.not_after => Some(b),
            _ => Some(cert),
        })
}
