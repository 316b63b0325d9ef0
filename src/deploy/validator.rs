use crate::domain::errors::ValidationError;
use crate::domain::types::{
    DeploymentIntent, LaunchBuyConfig, LiquidityPosition, RewardRecipient, VaultLockConfig,
    BPS_DENOMINATOR, MAX_ALIGNED_TICK, MAX_RECIPIENTS, MIN_ALIGNED_TICK,
    MIN_VAULT_LOCKUP_SECONDS, TICK_SPACING,
};
use alloy_primitives::U256;

/// Checks an intent against protocol invariants. Fails on the first violation:
/// recipient count, reward split, pool geometry, vault lock, then launch buy.
pub fn validate_intent(intent: &DeploymentIntent) -> Result<(), ValidationError> {
    validate_recipients(&intent.recipients)?;
    validate_pool_geometry(intent.starting_tick(), intent.positions.as_deref())?;
    if let Some(vault) = &intent.vault {
        validate_vault(vault)?;
    }
    if let Some(launch_buy) = &intent.launch_buy {
        validate_launch_buy(launch_buy)?;
    }
    Ok(())
}

pub fn validate_recipients(recipients: &[RewardRecipient]) -> Result<(), ValidationError> {
    if recipients.len() > MAX_RECIPIENTS {
        return Err(ValidationError::TooManyRecipients {
            got: recipients.len(),
        });
    }
    let sum = recipients
        .iter()
        .map(|recipient| u64::from(recipient.bps))
        .sum::<u64>();
    if sum != BPS_DENOMINATOR {
        return Err(ValidationError::InvalidSplit { got: sum });
    }
    Ok(())
}

fn validate_pool_geometry(
    starting_tick: i32,
    positions: Option<&[LiquidityPosition]>,
) -> Result<(), ValidationError> {
    check_tick("starting tick", starting_tick)?;
    let Some(positions) = positions else {
        // the default position spans [starting_tick, MAX_ALIGNED_TICK)
        if starting_tick >= MAX_ALIGNED_TICK {
            return Err(geometry(format!(
                "starting tick {starting_tick} leaves no room below {MAX_ALIGNED_TICK} for the default position"
            )));
        }
        return Ok(());
    };
    if positions.is_empty() {
        return Err(geometry("custom positions must not be empty".to_string()));
    }
    let sum = positions
        .iter()
        .map(|position| u64::from(position.bps))
        .sum::<u64>();
    if sum != BPS_DENOMINATOR {
        return Err(geometry(format!(
            "position bps must sum to {BPS_DENOMINATOR}, got {sum}"
        )));
    }
    for (index, position) in positions.iter().enumerate() {
        if position.tick_lower >= position.tick_upper {
            return Err(geometry(format!(
                "position {index}: tick_lower {} must be below tick_upper {}",
                position.tick_lower, position.tick_upper
            )));
        }
        check_tick(&format!("position {index} tick_lower"), position.tick_lower)?;
        check_tick(&format!("position {index} tick_upper"), position.tick_upper)?;
    }
    let lowest = positions
        .iter()
        .map(|position| position.tick_lower)
        .min()
        .unwrap_or(starting_tick);
    if starting_tick > lowest {
        return Err(geometry(format!(
            "starting tick {starting_tick} is above the lowest tick_lower {lowest}"
        )));
    }
    Ok(())
}

fn check_tick(label: &str, tick: i32) -> Result<(), ValidationError> {
    if tick % TICK_SPACING != 0 {
        return Err(geometry(format!(
            "{label} {tick} is not a multiple of {TICK_SPACING}"
        )));
    }
    if !(MIN_ALIGNED_TICK..=MAX_ALIGNED_TICK).contains(&tick) {
        return Err(geometry(format!(
            "{label} {tick} is outside [{MIN_ALIGNED_TICK}, {MAX_ALIGNED_TICK}]"
        )));
    }
    Ok(())
}

fn geometry(reason: String) -> ValidationError {
    ValidationError::InvalidPoolGeometry { reason }
}

fn validate_vault(vault: &VaultLockConfig) -> Result<(), ValidationError> {
    if vault.percentage == 0 || vault.percentage > 100 {
        return Err(ValidationError::InvalidVaultConfig {
            reason: format!(
                "percentage must be in 1..=100, got {}",
                vault.percentage
            ),
        });
    }
    if vault.lockup_seconds < MIN_VAULT_LOCKUP_SECONDS {
        return Err(ValidationError::InvalidVaultConfig {
            reason: format!(
                "lockup of {}s is below the {MIN_VAULT_LOCKUP_SECONDS}s minimum",
                vault.lockup_seconds
            ),
        });
    }
    Ok(())
}

/// The launch-buy extension carries the minimum output as `uint128`.
fn validate_launch_buy(launch_buy: &LaunchBuyConfig) -> Result<(), ValidationError> {
    if launch_buy.minimum_tokens_out > U256::from(u128::MAX) {
        return Err(ValidationError::InvalidLaunchBuy {
            reason: format!(
                "minimum_tokens_out {} does not fit in uint128",
                launch_buy.minimum_tokens_out
            ),
        });
    }
    Ok(())
}
