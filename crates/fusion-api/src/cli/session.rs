//! Auth session CLI commands: issue, revoke.

use anyhow::Result;
use console::style;

use fusion_core::profile::ProfileRepository;
use fusion_core::session::SessionResolver;
use fusion_types::profile::UserId;

use crate::state::AppState;

/// Issue a session token for a user. The plaintext token is shown once.
pub async fn issue_session(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let user_id: UserId = user_id.parse()?;

    // Refuse to issue tokens for accounts that don't exist.
    if state.profiles.get(&user_id).await?.is_none() {
        anyhow::bail!("no account with user id {user_id}");
    }

    let token = state.sessions.issue(&user_id).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user_id": user_id,
                "token": token,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Session token issued (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();
    Ok(())
}

/// Revoke a session token.
pub async fn revoke_session(state: &AppState, token: &str, json: bool) -> Result<()> {
    state.sessions.revoke(token).await?;

    if json {
        println!("{}", serde_json::json!({ "revoked": true }));
        return Ok(());
    }

    println!();
    println!("  {} Session revoked", style("✓").green());
    println!();
    Ok(())
}
