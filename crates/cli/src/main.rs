use clap::{Parser, Subcommand};

use bidanku_core::{db, AppConfig, AuditLog, AuthService, LogMailer, NewUser};

#[derive(Parser)]
#[command(name = "bidanku")]
#[command(about = "Admin CLI for the clinic backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database file
    Migrate,
    /// Create a staff account
    CreateUser {
        /// Display name
        nama: String,
        /// Login username
        username: String,
        /// Email address (receives OTP codes)
        email: String,
        /// Password; prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List staff accounts
    ListUsers,
}

fn read_password_from_stdin() -> anyhow::Result<String> {
    use std::io::Write;
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("config: {e}"))?;

    match cli.command {
        Some(Commands::Migrate) => {
            let pool = db::connect(&config).await?;
            db::migrate(&pool).await?;
            println!("Database ready at {}", config.database_path.display());
        }
        Some(Commands::CreateUser {
            nama,
            username,
            email,
            password,
        }) => {
            let pool = db::connect(&config).await?;
            db::migrate(&pool).await?;

            let password = match password {
                Some(p) => p,
                None => read_password_from_stdin()?,
            };

            let audit = AuditLog::new(pool.clone());
            let auth = AuthService::new(
                pool,
                audit,
                std::sync::Arc::new(LogMailer),
                config.otp_expiry_minutes,
                config.bcrypt_cost,
            );

            match auth
                .create_user(
                    None,
                    &NewUser {
                        nama,
                        username,
                        email,
                        password,
                    },
                )
                .await
            {
                Ok(user) => println!("Created user {} ({})", user.username, user.id),
                Err(e) => eprintln!("Error creating user: {e}"),
            }
        }
        Some(Commands::ListUsers) => {
            let pool = db::connect(&config).await?;
            db::migrate(&pool).await?;

            let audit = AuditLog::new(pool.clone());
            let auth = AuthService::new(
                pool,
                audit,
                std::sync::Arc::new(LogMailer),
                config.otp_expiry_minutes,
                config.bcrypt_cost,
            );

            let users = auth.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                for user in users {
                    println!(
                        "ID: {}, Username: {}, Nama: {}, Email: {}",
                        user.id, user.username, user.nama, user.email
                    );
                }
            }
        }
        None => {
            println!("Use 'bidanku --help' for commands");
        }
    }

    Ok(())
}
