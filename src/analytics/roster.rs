use tracing::{debug, instrument};

use crate::model::user::User;
use crate::store::{AttendanceStore, EmployeeFilter, StoreResult};

/// Active employees matching `filter`, ordered by name.
#[instrument(name = "get_employee_list", skip(store))]
pub async fn get_employee_list(
    store: &dyn AttendanceStore,
    filter: &EmployeeFilter,
) -> StoreResult<Vec<User>> {
    let users = store.active_users(filter).await?;
    debug!(count = users.len(), "Employee roster fetched");
    Ok(users)
}
