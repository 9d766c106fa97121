use anyhow::{bail, Result};
use compute::registry::{load_accounts, standard_chart, validate_chart, AccountFilter};
use sea_orm::Database;
use tracing::{debug, error, info, trace};

pub async fn check_formulas(database_url: &str) -> Result<()> {
    trace!("Entering check_formulas function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url).await?;
    let mut accounts = load_accounts(&db, AccountFilter::default()).await?;
    if accounts.is_empty() {
        info!("No accounts in the database, checking the standard chart instead");
        accounts = standard_chart();
    }

    let issues = validate_chart(&accounts);
    if issues.is_empty() {
        let derived = accounts.iter().filter(|a| a.is_derived()).count();
        info!(
            "Chart of accounts is valid: {} accounts, {} derived",
            accounts.len(),
            derived
        );
        return Ok(());
    }

    for issue in &issues {
        error!("{}", issue);
    }
    bail!("chart of accounts has {} issue(s)", issues.len())
}
