use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use shelfguard::authz::{AccessPolicy, Guard, PermissionRegistry, Principal, RoleStore};
use shelfguard::config::HstsConfig;
use shelfguard::headers::{DirectiveSet, SecurityHeaderBuilder};
use shelfguard::provision::provision_defaults;

#[derive(Parser, Debug)]
#[command(author, version, about = "shelfguard admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the provisioned role table with each role's capabilities
    Roles,
    /// Show the effective capability union for a set of role names
    Effective {
        roles: Vec<String>,
        #[arg(long)]
        superuser: bool,
    },
    /// Run a single authorization check
    Check {
        role: String,
        action: String,
        resource_type: String,
    },
    /// Print the security headers as they would be attached to responses
    Headers {
        /// Render as for a production (trusted transport) deployment
        #[arg(long)]
        production: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let registry = PermissionRegistry::new();
    let roles = Arc::new(RoleStore::new());
    provision_defaults(&registry, &roles)?;
    let guard = Guard::new(Arc::clone(&roles));

    match cli.command {
        Commands::Roles => {
            for name in roles.role_names() {
                let granted = roles.granted(&name)?;
                let capabilities: Vec<String> = granted.iter().map(ToString::to_string).collect();
                println!("{:<12} {}", name, capabilities.join(", "));
            }
        }
        Commands::Effective { roles: names, superuser } => {
            let principal = Principal::new(Uuid::new_v4())
                .with_roles(names)
                .with_superuser(superuser);

            if principal.superuser {
                println!("superuser: every capability on every resource type");
            } else {
                let effective = guard.effective_capabilities(&principal);
                if effective.is_empty() {
                    println!("no capabilities");
                } else {
                    for capability in effective {
                        println!("{}", capability);
                    }
                }
            }
        }
        Commands::Check { role, action, resource_type } => {
            let principal = Principal::new(Uuid::new_v4()).with_roles(vec![role.clone()]);
            let decision = guard.authorize(&principal, &action, &resource_type);
            println!("{} -> {}.{}: {:?}", role, resource_type, action, decision);
        }
        Commands::Headers { production } => {
            let builder = SecurityHeaderBuilder::new(
                DirectiveSet::default_policy(),
                HstsConfig::default(),
                production,
            );
            for (name, value) in builder.headers() {
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}
