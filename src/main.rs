use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kcutils::keycloak::{
    ClientRepresentation, CredentialRepresentation, Credentials, KeycloakClient,
    UserRepresentation,
};
use kcutils::{telemetry, Config};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "kcutils", about = "Keycloak REST utilities", version)]
struct Cli {
    /// Realm to operate on (defaults to KC_INITIAL_REALM)
    #[arg(long, global = true)]
    realm: Option<String>,

    /// Account used to obtain a token (defaults to KC_INITIAL_USERNAME)
    #[arg(long = "username", global = true)]
    admin_username: Option<String>,

    /// Password of that account (defaults to KC_INITIAL_PASSWORD)
    #[arg(long = "password", global = true)]
    admin_password: Option<String>,

    /// Client used for the password grant (defaults to KC_INITIAL_CLIENT)
    #[arg(long = "client-id", global = true)]
    admin_client: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a token for the configured account
    Token,
    /// Introspect a token with a confidential client's credentials
    Introspect {
        token: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        secret: String,
    },
    /// Show userinfo claims for a token
    Userinfo {
        token: String,
        #[arg(long)]
        secret: String,
    },
    /// Show the realm's OpenID Connect discovery document
    WellKnown,
    #[command(flatten)]
    Admin(AdminCommand),
}

/// Subcommands that first obtain an admin token
#[derive(Subcommand)]
enum AdminCommand {
    /// Create a client
    CreateClient {
        client_id: String,
        #[arg(long)]
        bearer_only: bool,
        #[arg(long)]
        public: bool,
        #[arg(long)]
        direct_access_grants: bool,
    },
    /// Look up a client by clientId
    GetClient { client_id: String },
    /// Delete a client by clientId
    DeleteClient { client_id: String },
    /// Print a client's secret
    ClientSecret { client_id: String },
    /// Print realm keys, or only the active key of one type
    RealmKeys {
        #[arg(long = "type")]
        key_type: Option<String>,
    },
    /// Create a user and set its password
    CreateUser {
        username: String,
        #[arg(long)]
        user_password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Look up a user by username
    GetUser { username: String },
    /// List users
    ListUsers,
    /// Reset a user's password
    ResetPassword {
        username: String,
        new_password: String,
        #[arg(long)]
        temporary: bool,
    },
    /// Delete a user by username
    DeleteUser { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init(&config.telemetry);

    let cli = Cli::parse();
    let account = &config.initial_account;
    let credentials = Credentials::new(
        cli.admin_username.unwrap_or_else(|| account.username.clone()),
        cli.admin_password.unwrap_or_else(|| account.password.clone()),
        cli.realm.unwrap_or_else(|| account.realm.clone()),
        cli.admin_client.unwrap_or_else(|| account.client_id.clone()),
    );

    let kc = KeycloakClient::from_config(&config.keycloak)?;
    info!(base_url = kc.base_url(), realm = %credentials.realm, "Using Keycloak");

    run(&kc, &credentials, cli.command).await
}

async fn run(kc: &KeycloakClient, credentials: &Credentials, command: Command) -> Result<()> {
    let realm = credentials.realm.as_str();

    match command {
        Command::Token => print_json(&kc.get_token(credentials).await?),
        Command::Introspect {
            token,
            client,
            secret,
        } => print_json(&kc.validate_token(&token, realm, &client, &secret).await?),
        Command::Userinfo { token, secret } => {
            print_json(&kc.get_user_info(&secret, &token, realm).await?)
        }
        Command::WellKnown => print_json(&kc.get_openid_configuration(realm).await?),
        Command::Admin(command) => {
            let admin_token = kc
                .get_token_with(credentials, |t| t.access_token)
                .await
                .context("Failed to obtain admin token")?;
            run_admin(kc, &admin_token, realm, command).await
        }
    }
}

async fn run_admin(
    kc: &KeycloakClient,
    token: &str,
    realm: &str,
    command: AdminCommand,
) -> Result<()> {
    match command {
        AdminCommand::CreateClient {
            client_id,
            bearer_only,
            public,
            direct_access_grants,
        } => {
            let client = ClientRepresentation::new(client_id)
                .bearer_only(bearer_only)
                .public_client(public)
                .direct_access_grants_enabled(direct_access_grants);
            let created = kc.create_client(token, realm, &client).await?;
            print_json(&serde_json::json!({ "id": created.id() }))
        }
        AdminCommand::GetClient { client_id } => {
            print_json(&kc.get_client(token, realm, &client_id).await?)
        }
        AdminCommand::DeleteClient { client_id } => {
            let id = client_uuid(kc, token, realm, &client_id).await?;
            kc.delete_client(token, realm, &id).await?;
            info!(client_id = %client_id, id = %id, "Deleted client");
            Ok(())
        }
        AdminCommand::ClientSecret { client_id } => {
            let id = client_uuid(kc, token, realm, &client_id).await?;
            let secret = kc
                .get_client_secret_with(token, realm, &id, |s| s.value)
                .await?;
            print_json(&secret)
        }
        AdminCommand::RealmKeys { key_type: None } => {
            print_json(&kc.get_realm_keys(token, realm).await?)
        }
        AdminCommand::RealmKeys {
            key_type: Some(key_type),
        } => {
            let key = kc
                .get_realm_keys_with(token, realm, |keys| keys.active_key(&key_type).cloned())
                .await?;
            print_json(&key)
        }
        AdminCommand::CreateUser {
            username,
            user_password,
            email,
            first_name,
            last_name,
        } => {
            let user = UserRepresentation {
                username: username.clone(),
                email,
                first_name,
                last_name,
                enabled: Some(true),
                credentials: vec![CredentialRepresentation::password(&user_password, false)],
                ..Default::default()
            };
            let created = kc.create_user(token, realm, &user).await?;
            // Creation-time credentials are not reliably applied.
            let id = match created.id() {
                Some(id) => id.to_string(),
                None => user_id(kc, token, realm, &username).await?,
            };
            kc.reset_password(token, realm, &id, &user_password, false)
                .await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        AdminCommand::GetUser { username } => {
            print_json(&kc.get_user(token, realm, &username).await?)
        }
        AdminCommand::ListUsers => print_json(&kc.list_users(token, realm).await?),
        AdminCommand::ResetPassword {
            username,
            new_password,
            temporary,
        } => {
            let id = user_id(kc, token, realm, &username).await?;
            kc.reset_password(token, realm, &id, &new_password, temporary)
                .await?;
            info!(username = %username, temporary, "Password reset");
            Ok(())
        }
        AdminCommand::DeleteUser { username } => {
            let id = user_id(kc, token, realm, &username).await?;
            kc.delete_user(token, realm, &id).await?;
            info!(username = %username, id = %id, "Deleted user");
            Ok(())
        }
    }
}

async fn client_uuid(
    kc: &KeycloakClient,
    token: &str,
    realm: &str,
    client_id: &str,
) -> Result<String> {
    kc.get_client_with(token, realm, client_id, |c| c.id)
        .await?
        .flatten()
        .with_context(|| format!("Client '{}' not found in realm '{}'", client_id, realm))
}

async fn user_id(
    kc: &KeycloakClient,
    token: &str,
    realm: &str,
    username: &str,
) -> Result<String> {
    kc.get_user_with(token, realm, username, |u| u.id)
        .await?
        .flatten()
        .with_context(|| format!("User '{}' not found in realm '{}'", username, realm))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_account_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kcutils",
            "get-user",
            "jimbob",
            "--realm",
            "demo",
            "--username",
            "admin",
            "--password",
            "secret",
            "--client-id",
            "admin-cli",
        ])
        .unwrap();

        assert_eq!(cli.realm.as_deref(), Some("demo"));
        assert_eq!(cli.admin_username.as_deref(), Some("admin"));
        assert_eq!(cli.admin_password.as_deref(), Some("secret"));
        assert_eq!(cli.admin_client.as_deref(), Some("admin-cli"));
        match cli.command {
            Command::Admin(AdminCommand::GetUser { username }) => assert_eq!(username, "jimbob"),
            _ => panic!("expected get-user"),
        }
    }
}
