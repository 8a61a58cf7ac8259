//! Estate Desk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ed-cli migrate
//!
//! # Seed the application status table
//! ed-cli seed statuses
//!
//! # Create a superuser
//! ed-cli user create-superuser -e admin@example.com -n "Admin Name" -p 'long password'
//!
//! # Delete a user
//! ed-cli user delete -e former@example.com
//!
//! # Show the change history of an agency
//! ed-cli audit show --entity agency --id 3
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use estate_desk_core::AuditEntity;

mod commands;

#[derive(Parser)]
#[command(name = "ed-cli")]
#[command(author, version, about = "Estate Desk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed lookup tables
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Inspect the audit log
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert the fixed application statuses
    Statuses,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a staff superuser
    CreateSuperuser {
        /// Email address (login)
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 5 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Show the change history of one entity
    Show {
        /// Entity type (`agency`, `solicitor`, `user`, `team`, `application`)
        #[arg(long)]
        entity: AuditEntity,

        /// Entity id
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Statuses => commands::seed::statuses().await?,
        },
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                email,
                name,
                password,
            } => {
                commands::user::create_superuser(&email, &name, &password).await?;
            }
            UserAction::Delete { email } => commands::user::delete(&email).await?,
        },
        Commands::Audit { action } => match action {
            AuditAction::Show { entity, id } => commands::audit::show(entity, id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_audit_show() {
        let cli =
            Cli::try_parse_from(["ed-cli", "audit", "show", "--entity", "agency", "--id", "3"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Audit {
                action: AuditAction::Show {
                    entity: AuditEntity::Agency,
                    id: 3
                }
            })
        ));
    }

    #[test]
    fn test_unknown_audit_entity_rejected() {
        let cli =
            Cli::try_parse_from(["ed-cli", "audit", "show", "--entity", "estate", "--id", "1"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_parse_create_superuser() {
        let cli = Cli::try_parse_from([
            "ed-cli",
            "user",
            "create-superuser",
            "-e",
            "admin@example.com",
            "-n",
            "Admin",
            "-p",
            "hunter2hunter2",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::CreateSuperuser { .. }
            })
        ));
    }
}
