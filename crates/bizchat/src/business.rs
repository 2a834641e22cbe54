// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bizchat business` command implementation.

use bizchat_config::BizchatConfig;
use bizchat_core::phone::canonical_phone;
use bizchat_core::types::Business;
use bizchat_core::{BizchatError, StorageAdapter};
use bizchat_storage::SqliteStorage;
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum BusinessCommand {
    /// Create or update a business.
    Add(AddArgs),
    /// Show a business by id.
    Show {
        #[arg(long)]
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    /// Business-side number inbound messages are addressed to.
    #[arg(long)]
    pub phone: Option<String>,
    /// UPI virtual payment address, e.g. `shop@okbank`.
    #[arg(long)]
    pub upi_id: Option<String>,
    #[arg(long)]
    pub gstin: Option<String>,
    /// ISO 3166 alpha-2 country code.
    #[arg(long)]
    pub country: Option<String>,
}

impl AddArgs {
    fn into_business(self) -> Business {
        Business {
            id: self.id,
            name: self.name,
            phone: self
                .phone
                .as_deref()
                .map(canonical_phone)
                .filter(|p| !p.is_empty()),
            upi_id: self.upi_id.filter(|u| !u.trim().is_empty()),
            gstin: self.gstin,
            country: self.country.map(|c| c.to_ascii_uppercase()),
        }
    }
}

pub async fn run(config: &BizchatConfig, command: BusinessCommand) -> Result<(), BizchatError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let result = match command {
        BusinessCommand::Add(args) => {
            let business = args.into_business();
            storage.upsert_business(&business).await?;
            println!(
                "business {} saved (phone: {}, upi: {})",
                business.id,
                business.phone.as_deref().unwrap_or("-"),
                business.upi_id.as_deref().unwrap_or("-"),
            );
            Ok(())
        }
        BusinessCommand::Show { id } => match storage.get_business(&id).await? {
            Some(business) => {
                println!("{business:#?}");
                Ok(())
            }
            None => Err(BizchatError::NotFound {
                entity: "business",
                id,
            }),
        },
    };

    storage.close().await?;
    result
}
