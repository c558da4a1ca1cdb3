use sqlx::PgPool;
use tracing::info;

use crate::database::schema::SchemaPlan;

/// Asks PostgREST to rebuild its schema cache. Delivered when the transaction commits.
const SQL_RELOAD_SCHEMA_CACHE: &str = "NOTIFY pgrst, 'reload schema'";

/// Statements sent over the direct connection: the plan, then the cache reload so the
/// REST API sees a freshly created relation.
pub fn transaction_statements(plan: &SchemaPlan) -> Vec<String> {
    let mut statements = plan.statements();
    statements.push(SQL_RELOAD_SCHEMA_CACHE.to_string());
    statements
}

/// Runs every statement of `plan` in one transaction over the direct connection.
pub async fn apply_schema_plan(pool: &PgPool, plan: &SchemaPlan) -> sqlx::Result<usize> {
    let statements = transaction_statements(plan);
    let mut tx = pool.begin().await?;

    for statement in &statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    info!(
        relation = plan.relation,
        statements = statements.len(),
        "schema plan applied"
    );
    Ok(statements.len())
}
