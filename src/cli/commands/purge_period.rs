use anyhow::{bail, Result};
use compute::{values, Period};
use sea_orm::Database;
use tracing::{debug, error, info, trace};

pub async fn purge_period(database_url: &str, year: i32, month: u32, yes: bool) -> Result<()> {
    trace!("Entering purge_period function");
    let period = Period::new(month, year)?;

    if !yes {
        error!("Refusing to purge {} without --yes", period);
        bail!("pass --yes to delete every value of {}", period);
    }

    debug!("Database URL: {}", database_url);
    let db = Database::connect(database_url).await?;

    match values::purge_period(&db, period).await {
        Ok(deleted) => {
            info!("Deleted {} value(s) of {}", deleted, period);
            Ok(())
        }
        Err(e) => {
            error!("Failed to purge {}: {}", period, e);
            Err(e.into())
        }
    }
}
