use anyhow::Result;
use clap::Subcommand;
use scratchcard_core::PersistenceSync;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Show the store configuration
    Show,
    /// Update branding and contact fields locally
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        /// Primary color, e.g. #4f46e5
        #[arg(long)]
        color: Option<String>,
        /// Number that receives redemption messages
        #[arg(long)]
        whatsapp: Option<String>,
        /// Number that receives new-store leads
        #[arg(long)]
        admin_contact: Option<String>,
    },
}

pub async fn handle_store_command(cmd: StoreCommands, sync: &Arc<PersistenceSync>) -> Result<()> {
    match cmd {
        StoreCommands::Show => {
            let config = sync.load().await.config;

            println!("Store Configuration:");
            println!("  Name: {}", config.name);
            println!("  Logo: {}", config.logo_url);
            println!("  Color: {}", config.primary_color);
            println!("  WhatsApp: {}", config.whatsapp_number);
            println!("  Admin contact: {}", config.admin_contact_number);
            println!("  Platform clients: {}", config.platform_clients.len());
        }

        StoreCommands::Set {
            name,
            logo_url,
            color,
            whatsapp,
            admin_contact,
        } => {
            let mut config = sync.config();

            if let Some(name) = name {
                config.name = name;
            }
            if let Some(logo_url) = logo_url {
                config.logo_url = logo_url;
            }
            if let Some(color) = color {
                config.primary_color = color;
            }
            if let Some(whatsapp) = whatsapp {
                config.whatsapp_number = whatsapp;
            }
            if let Some(admin_contact) = admin_contact {
                config.admin_contact_number = admin_contact;
            }

            sync.set_local_config(config).await?;
            println!("Store configuration updated.");
            if !sync.is_local_only() {
                println!("Run 'scratchcard sync push' to publish the change");
            }
        }
    }

    Ok(())
}
