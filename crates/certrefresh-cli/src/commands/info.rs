use crate::context::AppContext;
use crate::output;
use anyhow::Result;
use certrefresh_engine::{inventory, Inventory};
use clap::Parser;
use console::style;
use tracing::{debug, error};

/// Show the certificates of every account and the domains bound to them
#[derive(Parser, Debug, Default)]
pub struct InfoCmd {
    /// Print a JSON document instead of text
    #[arg(long)]
    pub json: bool,
}

impl InfoCmd {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        debug!("invoked the info command");

        let mut inventories = Vec::with_capacity(ctx.accounts.len());
        for (i, account) in ctx.accounts.iter().enumerate() {
            match inventory::collect(account, ctx.refresher.budget()).await {
                Ok(inv) => {
                    if !self.json {
                        if i > 0 {
                            println!();
                        }
                        print_inventory(&inv);
                    }
                    inventories.push(inv);
                }
                Err(e) => {
                    error!(account = %account.display_name, error = %e, "failed to show one account");
                    output::error(&format!("Account {}: {:#}", account.display_name, e));
                }
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&inventories)?);
        }

        Ok(())
    }
}

/// Render one account's certificates in text form
pub fn print_inventory(inv: &Inventory) {
    output::header(&format!("Account {}", inv.account));

    if inv.certificates.is_empty() {
        output::info("No certificates");
        return;
    }

    for entry in &inv.certificates {
        let cert = &entry.certificate;
        println!();
        println!("- ID:         {}", style(&cert.id).yellow());
        println!("  Name:       {}", cert.name);
        println!("  CommonName: {}", cert.common_name);
        println!(
            "  NotBefore:  {}",
            output::timestamp(cert.not_before, cert.not_before_utc())
        );
        println!(
            "  NotAfter:   {}",
            output::timestamp(cert.not_after, cert.not_after_utc())
        );
        println!(
            "  CreatedAt:  {}",
            output::timestamp(cert.create_time, cert.created_utc())
        );
        print_list("DNSNames", &cert.dns_names);
        print_list("Domains", &entry.domains);
    }
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("  {}: []", label);
        return;
    }
    println!("  {}:", label);
    for item in items {
        println!("    - {}", item);
    }
}
