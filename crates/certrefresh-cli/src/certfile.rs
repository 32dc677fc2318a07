//! Reading certificate chains and private keys from disk

use anyhow::{anyhow, Context, Result};
use certrefresh_engine::CertificateBundle;
use std::path::Path;
use tracing::debug;
use x509_parser::pem::Pem;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Subject common name of the first certificate in a PEM buffer
///
/// Blocks with other labels (keys, parameters) are skipped. A certificate
/// without a common name yields an empty string.
pub fn common_name_from_pem(pem: &[u8]) -> Result<String> {
    for block in Pem::iter_from_buffer(pem) {
        let block = block.map_err(|e| anyhow!("Invalid PEM data: {:?}", e))?;
        if block.label != CERTIFICATE_LABEL {
            debug!(label = %block.label, "skipping PEM block");
            continue;
        }

        let cert = block
            .parse_x509()
            .map_err(|e| anyhow!("Failed to parse certificate: {}", e))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or_default()
            .to_string();
        return Ok(common_name);
    }

    Err(anyhow!("No certificate in input"))
}

/// Read a chain and its private key into an upload bundle
pub async fn load_bundle(cert_path: &Path, key_path: &Path) -> Result<CertificateBundle> {
    let chain_pem = tokio::fs::read_to_string(cert_path)
        .await
        .with_context(|| format!("Failed to read certificate chain {}", cert_path.display()))?;
    let private_key_pem = tokio::fs::read_to_string(key_path)
        .await
        .with_context(|| format!("Failed to read private key {}", key_path.display()))?;

    let common_name = common_name_from_pem(chain_pem.as_bytes())
        .with_context(|| format!("Bad certificate chain {}", cert_path.display()))?;
    debug!(cert = %cert_path.display(), common_name = %common_name, "certificate bundle loaded");

    Ok(CertificateBundle {
        common_name,
        chain_pem,
        private_key_pem,
    })
}
