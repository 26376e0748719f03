//! Account CLI commands: create, show, set-tier.

use anyhow::Result;
use console::style;

use fusion_core::profile::ProfileRepository;
use fusion_core::quota::QuotaPolicy;
use fusion_types::profile::{Profile, Tier, UserId};
use fusion_types::quota::MeteredAction;

use crate::state::AppState;

/// Create a new account and print its user id.
pub async fn create_account(state: &AppState, pro: bool, json: bool) -> Result<()> {
    let profile = Profile::new(UserId::new());
    state.profiles.create(&profile).await?;
    if pro {
        state.profiles.set_tier(&profile.user_id, Tier::Pro).await?;
    }
    let tier = if pro { Tier::Pro } else { Tier::Free };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user_id": profile.user_id,
                "tier": tier,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Account created on the {} tier",
        style("✓").green(),
        style(tier).cyan()
    );
    println!("  user id: {}", style(profile.user_id).yellow().bold());
    println!();
    Ok(())
}

/// Show a profile with its remaining allowances.
pub async fn show_account(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let user_id: UserId = user_id.parse()?;
    let profile = state
        .profiles
        .get(&user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no account with user id {user_id}"))?;

    let remaining_messages = QuotaPolicy::remaining_at(
        profile.tier,
        MeteredAction::SendMessage,
        profile.daily_message_count,
    );
    let remaining_images = QuotaPolicy::remaining_at(
        profile.tier,
        MeteredAction::GenerateImage,
        profile.image_generation_count,
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user_id": profile.user_id,
                "tier": profile.tier,
                "daily_message_count": profile.daily_message_count,
                "image_generation_count": profile.image_generation_count,
                "remaining_messages": remaining_messages,
                "remaining_images": remaining_images,
            }))?
        );
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Account").bold(), style(profile.user_id).dim());
    println!("  tier:      {}", style(profile.tier).cyan());
    println!(
        "  messages:  {} used today, {} remaining",
        profile.daily_message_count,
        style(remaining_messages).green()
    );
    println!(
        "  images:    {} generated, {} remaining",
        profile.image_generation_count,
        style(remaining_images).green()
    );
    println!();
    Ok(())
}

/// Change an account's tier.
pub async fn set_tier(state: &AppState, user_id: &str, tier: &str, json: bool) -> Result<()> {
    let user_id: UserId = user_id.parse()?;
    let tier: Tier = tier.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    state.profiles.set_tier(&user_id, tier).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user_id": user_id,
                "tier": tier,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} {} is now on the {} tier",
        style("✓").green(),
        user_id,
        style(tier).cyan()
    );
    println!();
    Ok(())
}
