//! Git authentication configuration
//!
//! Authentication is delegated entirely to git's native credential system:
//! - SSH agent, then keys from `~/.ssh/`
//! - Git credential helpers for HTTPS
//! - Anonymous access for public repositories

use git2::{Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks};

const SSH_KEY_NAMES: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

fn auth_error(message: &str) -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Http, message)
}

fn anonymous_credentials() -> Option<Cred> {
    ["git", "anonymous"]
        .iter()
        .find_map(|username| Cred::userpass_plaintext(username, "").ok())
}

fn ssh_key_credentials(username: &str) -> Result<Cred, Error> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");

    for key_name in SSH_KEY_NAMES {
        let private_key = ssh_dir.join(key_name);
        if !private_key.exists() {
            continue;
        }
        let public_key = ssh_dir.join(format!("{key_name}.pub"));
        let public_key = public_key.exists().then_some(public_key.as_path());

        if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None) {
            log::debug!("Using SSH key {}", private_key.display());
            return Ok(cred);
        }
    }

    Err(auth_error("SSH key not found"))
}

fn helper_credentials(url: &str, username_from_url: Option<&str>) -> Result<Cred, Error> {
    let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;

    if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
        return Ok(cred);
    }

    username_from_url
        .and_then(|username| Cred::userpass_plaintext(username, "").ok())
        .or_else(anonymous_credentials)
        .ok_or_else(|| auth_error("authentication failed"))
}

/// Set up authentication callbacks for git operations
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks<'_>) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            return match username_from_url {
                Some(username) => {
                    Cred::ssh_key_from_agent(username).or_else(|_| ssh_key_credentials(username))
                }
                None => anonymous_credentials().ok_or_else(|| auth_error("authentication failed")),
            };
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return helper_credentials(url, username_from_url);
        }

        Err(auth_error("authentication failed"))
    });
}
