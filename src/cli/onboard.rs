use crate::config::{Config, DEFAULT_NOTIFY_BEFORE_MINUTES, parse_hhmm};
use crate::db::Database;
use crate::model::{Platform, PlatformCounts, parse_count};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to GrindLog onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/4] Daily targets");
    println!("  Problems you aim to solve each day. New days start from these.");

    let mut default_targets = PlatformCounts::default();
    for platform in Platform::ALL {
        let raw: String = Input::with_theme(&theme)
            .with_prompt(format!("  {platform}"))
            .default("0".to_string())
            .interact_text()
            .with_context(|| format!("Failed to read {platform} target"))?;
        default_targets.set(platform, parse_count(&raw));
    }
    println!("  ✓ {} problems per day in total", default_targets.total());

    println!("\n[2/4] Daily summary");
    let daily_summary_enabled = Confirm::with_theme(&theme)
        .with_prompt("  Send a summary notification every evening?")
        .default(true)
        .interact()
        .context("Failed to read daily summary input")?;

    let summary_time = if daily_summary_enabled {
        let time: String = Input::with_theme(&theme)
            .with_prompt("  Summary time")
            .default("23:55".to_string())
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                parse_hhmm(input)
                    .map(|_| ())
                    .map_err(|_| "Use HH:MM format (example: 23:55)")
            })
            .interact_text()
            .context("Failed to read summary time")?;
        println!("  ✓ Summary will be sent daily at {time}");
        time
    } else {
        println!("  ✓ Daily summary disabled");
        Config::default().summary_time
    };

    println!("\n[3/4] Reminder lead time");
    let notify_before: String = Input::with_theme(&theme)
        .with_prompt("  Minutes before a reminder to notify")
        .default(DEFAULT_NOTIFY_BEFORE_MINUTES.to_string())
        .interact_text()
        .context("Failed to read reminder lead time")?;
    let default_notify_before_minutes = notify_before
        .trim()
        .parse::<u32>()
        .unwrap_or(DEFAULT_NOTIFY_BEFORE_MINUTES);
    println!("  ✓ {default_notify_before_minutes} minutes");

    println!("\n[4/4] Desktop notifications");
    let notifications_enabled = Confirm::with_theme(&theme)
        .with_prompt("  Enable desktop notifications?")
        .default(true)
        .interact()
        .context("Failed to read notification input")?;

    let config = Config {
        summary_time,
        daily_summary_enabled,
        default_notify_before_minutes,
        notifications_enabled,
        default_targets,
        ..Config::default()
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    let _ = Database::open(&config.db_path)?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Log progress with: grindlog log leetcode 3");
    println!("  Run grindlog service to receive reminders.");
    println!("──────────────────────────────────────────");

    Ok(config)
}

/// Asks before destroying data unless `assume_yes` is set.
pub fn confirm_wipe(assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Delete all entries, todos, reminders and journal notes?")
        .default(false)
        .interact()
        .context("Failed to read confirmation input")
}
