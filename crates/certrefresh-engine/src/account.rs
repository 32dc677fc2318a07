//! Per-account context passed into every operation

use certrefresh_cdn::CdnDirectory;
use std::fmt;
use std::sync::Arc;

/// One provider account
///
/// Accounts are independent; nothing is shared or correlated between them.
#[derive(Clone)]
pub struct Account {
    /// Name used in logs and reports
    pub display_name: String,
    /// Prefix of the names of certificates this tool manages
    pub cert_name_prefix: String,
    /// Certificate and domain inventories of the account
    pub directory: Arc<dyn CdnDirectory>,
}

impl Account {
    /// Create an account context
    pub fn new(
        display_name: impl Into<String>,
        cert_name_prefix: impl Into<String>,
        directory: Arc<dyn CdnDirectory>,
    ) -> Self {
        Account {
            display_name: display_name.into(),
            cert_name_prefix: cert_name_prefix.into(),
            directory,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("display_name", &self.display_name)
            .field("cert_name_prefix", &self.cert_name_prefix)
            .field("directory", &self.directory)
            .finish()
    }
}
