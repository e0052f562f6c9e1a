//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! Every function is generic over [`PgExecutor`] so it can run against the
//! pool or inside a transaction (`&mut *tx`). All query functions include
//! error context logging to aid debugging.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use tracing::error;
use uuid::Uuid;

use super::models::{
    AccountStatus, Assignment, BasicUser, Group, GroupView, Message, Role, Submission,
    SubmissionStatus, User, UserDetails, UserView,
};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
    ($query:expr) => {
        |e| {
            error!(query = $query, error = %e, "Database query failed");
            e
        }
    };
}

/// Whether an error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

// ============================================================================
// User Queries
// ============================================================================

const USER_VIEW_SELECT: &str = r"
    SELECT u.id, u.username, u.email, u.role, u.status, gm.group_id, u.created_at, u.updated_at
    FROM users u
    LEFT JOIN group_members gm ON gm.user_id = u.id
";

/// Find user by ID.
pub async fn find_user_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by username.
pub async fn find_user_by_username<'e>(
    executor: impl PgExecutor<'e>,
    username: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_user_by_username", username = %username))
}

/// Check if username exists.
pub async fn username_exists<'e>(
    executor: impl PgExecutor<'e>,
    username: &str,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(executor)
        .await
        .map_err(db_error!("username_exists", username = %username))
}

/// Check if email exists.
pub async fn email_exists<'e>(executor: impl PgExecutor<'e>, email: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(db_error!("email_exists"))
}

/// Find a user together with their group membership.
pub async fn find_user_view<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<UserView>> {
    sqlx::query_as::<_, UserView>(&format!("{USER_VIEW_SELECT} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_user_view", user_id = %id))
}

/// Find the id/username/email projection of a user.
pub async fn find_basic_user<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<BasicUser>> {
    sqlx::query_as::<_, BasicUser>("SELECT id, username, email FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_basic_user", user_id = %id))
}

/// List all users with the given role, oldest first.
pub async fn list_users_by_role<'e>(
    executor: impl PgExecutor<'e>,
    role: Role,
) -> sqlx::Result<Vec<UserView>> {
    sqlx::query_as::<_, UserView>(&format!(
        "{USER_VIEW_SELECT} WHERE u.role = $1 ORDER BY u.created_at, u.id"
    ))
    .bind(role)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_users_by_role", role = %role))
}

/// List all admin accounts, oldest first.
pub async fn list_admins<'e>(executor: impl PgExecutor<'e>) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'admin' ORDER BY created_at, id")
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_admins"))
}

/// The admin that receives onboarding messages: the oldest admin account.
pub async fn find_primary_admin<'e>(executor: impl PgExecutor<'e>) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE role = 'admin' ORDER BY created_at, id LIMIT 1",
    )
    .fetch_optional(executor)
    .await
    .map_err(db_error!("find_primary_admin"))
}

/// Create a new user. Creation defaults (role, status) are chosen by the caller.
pub async fn create_user<'e>(
    executor: impl PgExecutor<'e>,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    status: AccountStatus,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (id, username, email, password_hash, role, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING *
        ",
    )
    .bind(Uuid::now_v7())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(status)
    .fetch_one(executor)
    .await
    .map_err(db_error!("create_user", username = %username))
}

/// Overwrite username, email and role of a user.
pub async fn update_user_account<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    username: &str,
    email: &str,
    role: Role,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r"
        UPDATE users
        SET username = $2, email = $3, role = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(role)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("update_user_account", user_id = %id))
}

/// Set the account status of a user.
pub async fn update_user_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: AccountStatus,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("update_user_status", user_id = %id, status = %status))
}

// ============================================================================
// Group Queries
// ============================================================================

const GROUP_VIEW_SELECT: &str = r"
    SELECT g.id, g.name, g.description,
           COALESCE(
               ARRAY_AGG(gm.user_id ORDER BY gm.joined_at, gm.user_id)
                   FILTER (WHERE gm.user_id IS NOT NULL),
               '{}'
           ) AS member_ids,
           g.created_at, g.updated_at
    FROM groups g
    LEFT JOIN group_members gm ON gm.group_id = g.id
";

/// Find group by ID.
pub async fn find_group_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<Group>> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_group_by_id", group_id = %id))
}

/// Find group by name.
pub async fn find_group_by_name<'e>(
    executor: impl PgExecutor<'e>,
    name: &str,
) -> sqlx::Result<Option<Group>> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = $1")
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_group_by_name", name = %name))
}

/// Find a group with its member ids.
pub async fn find_group_view<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<GroupView>> {
    sqlx::query_as::<_, GroupView>(&format!("{GROUP_VIEW_SELECT} WHERE g.id = $1 GROUP BY g.id"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_group_view", group_id = %id))
}

/// List all groups with their member ids, by name.
pub async fn list_groups<'e>(executor: impl PgExecutor<'e>) -> sqlx::Result<Vec<GroupView>> {
    sqlx::query_as::<_, GroupView>(&format!("{GROUP_VIEW_SELECT} GROUP BY g.id ORDER BY g.name"))
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_groups"))
}

/// Create a group.
pub async fn create_group<'e>(
    executor: impl PgExecutor<'e>,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<Group> {
    sqlx::query_as::<_, Group>(
        r"
        INSERT INTO groups (id, name, description, created_at, updated_at)
        VALUES ($1, $2, $3, NOW(), NOW())
        RETURNING *
        ",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
    .map_err(db_error!("create_group", name = %name))
}

/// Rename / re-describe a group.
pub async fn update_group<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<Option<Group>> {
    sqlx::query_as::<_, Group>(
        r"
        UPDATE groups SET name = $2, description = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("update_group", group_id = %id))
}

/// Delete a group row. Fails while members are still attached.
pub async fn delete_group<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<u64> {
    sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map(|r| r.rows_affected())
        .map_err(db_error!("delete_group", group_id = %id))
}

/// Attach a user to a group, moving them out of any previous group.
///
/// Returns the group the user belonged to before, if any.
pub async fn attach_user_to_group<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    group_id: Uuid,
) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Option<Uuid>>(
        r"
        WITH previous AS (
            SELECT group_id FROM group_members WHERE user_id = $1
        )
        INSERT INTO group_members (user_id, group_id, joined_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (user_id) DO UPDATE
            SET group_id = EXCLUDED.group_id, joined_at = EXCLUDED.joined_at
        RETURNING (SELECT group_id FROM previous)
        ",
    )
    .bind(user_id)
    .bind(group_id)
    .fetch_one(executor)
    .await
    .map_err(db_error!("attach_user_to_group", user_id = %user_id, group_id = %group_id))
}

/// Detach a user from whatever group they are in. Returns that group.
pub async fn detach_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "DELETE FROM group_members WHERE user_id = $1 RETURNING group_id",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(db_error!("detach_user", user_id = %user_id))
}

/// Detach every member of a group. Returns the detached user ids.
pub async fn detach_all_members<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "DELETE FROM group_members WHERE group_id = $1 RETURNING user_id",
    )
    .bind(group_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("detach_all_members", group_id = %group_id))
}

/// The group a user belongs to, if any.
pub async fn find_user_group_id<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Uuid>("SELECT group_id FROM group_members WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_user_group_id", user_id = %user_id))
}

/// Members of a group, in join order.
pub async fn list_group_members<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> sqlx::Result<Vec<UserView>> {
    sqlx::query_as::<_, UserView>(&format!(
        "{USER_VIEW_SELECT} WHERE gm.group_id = $1 ORDER BY gm.joined_at, u.id"
    ))
    .bind(group_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_group_members", group_id = %group_id))
}

// ============================================================================
// Message Queries
// ============================================================================

/// Insert a message. Exactly one of `receiver_id` / `group_id` must be set.
pub async fn insert_message<'e>(
    executor: impl PgExecutor<'e>,
    sender_id: Uuid,
    receiver_id: Option<Uuid>,
    group_id: Option<Uuid>,
    content: &str,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(
        r"
        INSERT INTO messages (id, sender_id, receiver_id, group_id, content, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING *
        ",
    )
    .bind(Uuid::now_v7())
    .bind(sender_id)
    .bind(receiver_id)
    .bind(group_id)
    .bind(content)
    .fetch_one(executor)
    .await
    .map_err(db_error!("insert_message", sender_id = %sender_id))
}

/// Direct messages exchanged between a user and the primary admin, oldest first.
pub async fn list_onboarding_thread<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as::<_, Message>(
        r"
        WITH primary_admin AS (
            SELECT id FROM users WHERE role = 'admin' ORDER BY created_at, id LIMIT 1
        )
        SELECT m.*
        FROM messages m, primary_admin a
        WHERE m.group_id IS NULL
          AND ((m.sender_id = $1 AND m.receiver_id = a.id)
            OR (m.sender_id = a.id AND m.receiver_id = $1))
        ORDER BY m.created_at, m.id
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_onboarding_thread", user_id = %user_id))
}

/// Every direct message sent or received by a user, oldest first.
pub async fn list_direct_messages<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as::<_, Message>(
        r"
        SELECT * FROM messages
        WHERE group_id IS NULL AND (sender_id = $1 OR receiver_id = $1)
        ORDER BY created_at, id
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_direct_messages", user_id = %user_id))
}

/// Messages of a group, oldest first.
pub async fn list_group_thread<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE group_id = $1 ORDER BY created_at, id",
    )
    .bind(group_id)
    .fetch_all(executor)
    .await
    .map_err(db_error!("list_group_thread", group_id = %group_id))
}

// ============================================================================
// Assignment Queries
// ============================================================================

const ASSIGNMENT_COLUMNS: &str = r"
    a.id, a.title, a.description, a.due_date, a.group_id, g.name AS group_name,
    a.created_by, u.username AS created_by_username,
    (SELECT COUNT(*) FROM submissions s WHERE s.assignment_id = a.id) AS submission_count,
    a.created_at, a.updated_at
";

fn assignment_query(source: &str, tail: &str) -> String {
    format!(
        "{source} SELECT {ASSIGNMENT_COLUMNS} FROM a_src a \
         JOIN groups g ON g.id = a.group_id \
         JOIN users u ON u.id = a.created_by {tail}"
    )
}

/// Create an assignment.
pub async fn create_assignment<'e>(
    executor: impl PgExecutor<'e>,
    title: &str,
    description: Option<&str>,
    due_date: Option<DateTime<Utc>>,
    group_id: Uuid,
    created_by: Uuid,
) -> sqlx::Result<Assignment> {
    let sql = assignment_query(
        r"WITH a_src AS (
            INSERT INTO assignments (id, title, description, due_date, group_id, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
        )",
        "",
    );
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(Uuid::now_v7())
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(group_id)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(db_error!("create_assignment", group_id = %group_id))
}

/// Find an assignment by ID.
pub async fn find_assignment<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<Assignment>> {
    let sql = assignment_query("WITH a_src AS (SELECT * FROM assignments)", "WHERE a.id = $1");
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_assignment", assignment_id = %id))
}

/// Assignments of a group, earliest due date first (undated last).
pub async fn list_assignments_for_group<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> sqlx::Result<Vec<Assignment>> {
    let sql = assignment_query(
        "WITH a_src AS (SELECT * FROM assignments)",
        "WHERE a.group_id = $1 ORDER BY a.due_date ASC NULLS LAST, a.created_at",
    );
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(group_id)
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_assignments_for_group", group_id = %group_id))
}

/// All assignments, newest first.
pub async fn list_all_assignments<'e>(
    executor: impl PgExecutor<'e>,
) -> sqlx::Result<Vec<Assignment>> {
    let sql = assignment_query(
        "WITH a_src AS (SELECT * FROM assignments)",
        "ORDER BY a.created_at DESC, a.id DESC",
    );
    sqlx::query_as::<_, Assignment>(&sql)
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_all_assignments"))
}

/// Ids of all assignments belonging to a group.
pub async fn list_assignment_ids_for_group<'e>(
    executor: impl PgExecutor<'e>,
    group_id: Uuid,
) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM assignments WHERE group_id = $1")
        .bind(group_id)
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_assignment_ids_for_group", group_id = %group_id))
}

/// Overwrite the editable fields of an assignment.
pub async fn update_assignment<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    title: &str,
    description: Option<&str>,
    due_date: Option<DateTime<Utc>>,
    group_id: Uuid,
) -> sqlx::Result<Option<Assignment>> {
    let sql = assignment_query(
        r"WITH a_src AS (
            UPDATE assignments
            SET title = $2, description = $3, due_date = $4, group_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )",
        "",
    );
    sqlx::query_as::<_, Assignment>(&sql)
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(due_date)
        .bind(group_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("update_assignment", assignment_id = %id))
}

/// Delete an assignment; its submissions go with it.
pub async fn delete_assignment<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<u64> {
    sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map(|r| r.rows_affected())
        .map_err(db_error!("delete_assignment", assignment_id = %id))
}

// ============================================================================
// Submission Queries
// ============================================================================

fn submission_query(source: &str, tail: &str) -> String {
    format!(
        "{source} SELECT s.id, s.assignment_id, a.title AS assignment_title, s.user_id, \
         u.username, s.file_path, s.file_name, s.file_size, s.status, s.grade, s.feedback, \
         s.submitted_at, s.updated_at \
         FROM s_src s \
         JOIN assignments a ON a.id = s.assignment_id \
         JOIN users u ON u.id = s.user_id {tail}"
    )
}

/// Check whether a user already submitted to an assignment.
pub async fn submission_exists<'e>(
    executor: impl PgExecutor<'e>,
    assignment_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM submissions WHERE assignment_id = $1 AND user_id = $2)",
    )
    .bind(assignment_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(db_error!("submission_exists", assignment_id = %assignment_id, user_id = %user_id))
}

/// Record a new submission in PENDING state.
pub async fn create_submission<'e>(
    executor: impl PgExecutor<'e>,
    assignment_id: Uuid,
    user_id: Uuid,
    file_path: &str,
    file_name: &str,
    file_size: i64,
) -> sqlx::Result<Submission> {
    let sql = submission_query(
        r"WITH s_src AS (
            INSERT INTO submissions
                (id, assignment_id, user_id, file_path, file_name, file_size, status, submitted_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW(), NOW())
            RETURNING *
        )",
        "",
    );
    sqlx::query_as::<_, Submission>(&sql)
        .bind(Uuid::now_v7())
        .bind(assignment_id)
        .bind(user_id)
        .bind(file_path)
        .bind(file_name)
        .bind(file_size)
        .fetch_one(executor)
        .await
        .map_err(db_error!("create_submission", assignment_id = %assignment_id, user_id = %user_id))
}

/// Find a submission by ID.
pub async fn find_submission<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> sqlx::Result<Option<Submission>> {
    let sql = submission_query("WITH s_src AS (SELECT * FROM submissions)", "WHERE s.id = $1");
    sqlx::query_as::<_, Submission>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_submission", submission_id = %id))
}

/// Submissions for an assignment, newest first.
pub async fn list_submissions_for_assignment<'e>(
    executor: impl PgExecutor<'e>,
    assignment_id: Uuid,
) -> sqlx::Result<Vec<Submission>> {
    let sql = submission_query(
        "WITH s_src AS (SELECT * FROM submissions)",
        "WHERE s.assignment_id = $1 ORDER BY s.submitted_at DESC, s.id DESC",
    );
    sqlx::query_as::<_, Submission>(&sql)
        .bind(assignment_id)
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_submissions_for_assignment", assignment_id = %assignment_id))
}

/// Submissions by a user, newest first.
pub async fn list_submissions_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Vec<Submission>> {
    let sql = submission_query(
        "WITH s_src AS (SELECT * FROM submissions)",
        "WHERE s.user_id = $1 ORDER BY s.submitted_at DESC, s.id DESC",
    );
    sqlx::query_as::<_, Submission>(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(db_error!("list_submissions_for_user", user_id = %user_id))
}

/// Overwrite the grading fields of a submission.
pub async fn evaluate_submission<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: SubmissionStatus,
    grade: Option<f64>,
    feedback: Option<&str>,
) -> sqlx::Result<Option<Submission>> {
    let sql = submission_query(
        r"WITH s_src AS (
            UPDATE submissions
            SET status = $2, grade = $3, feedback = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )",
        "",
    );
    sqlx::query_as::<_, Submission>(&sql)
        .bind(id)
        .bind(status)
        .bind(grade)
        .bind(feedback)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("evaluate_submission", submission_id = %id))
}

// ============================================================================
// Profile Queries
// ============================================================================

/// Find the profile of a user.
pub async fn find_user_details<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Option<UserDetails>> {
    sqlx::query_as::<_, UserDetails>("SELECT * FROM user_details WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("find_user_details", user_id = %user_id))
}

/// Load a profile and lock its row until the transaction ends.
pub async fn lock_user_details<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> sqlx::Result<Option<UserDetails>> {
    sqlx::query_as::<_, UserDetails>("SELECT * FROM user_details WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error!("lock_user_details", user_id = %user_id))
}

/// Insert a new profile. Timestamps are set by the store.
pub async fn insert_user_details<'e>(
    executor: impl PgExecutor<'e>,
    details: &UserDetails,
) -> sqlx::Result<UserDetails> {
    sqlx::query_as::<_, UserDetails>(
        r"
        INSERT INTO user_details (
            id, user_id, first_name, last_name, referral_source, date_of_birth, ead_type,
            ead_start_date, prior_experience, experience_details, programming_languages,
            resume_path, ead_path, id_document_path, profile_completed, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW(), NOW())
        RETURNING *
        ",
    )
    .bind(details.id)
    .bind(details.user_id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(&details.referral_source)
    .bind(details.date_of_birth)
    .bind(&details.ead_type)
    .bind(details.ead_start_date)
    .bind(details.prior_experience)
    .bind(&details.experience_details)
    .bind(&details.programming_languages)
    .bind(&details.resume_path)
    .bind(&details.ead_path)
    .bind(&details.id_document_path)
    .bind(details.profile_completed)
    .fetch_one(executor)
    .await
    .map_err(db_error!("insert_user_details", user_id = %details.user_id))
}

/// Write back every mutable profile column.
pub async fn save_user_details<'e>(
    executor: impl PgExecutor<'e>,
    details: &UserDetails,
) -> sqlx::Result<UserDetails> {
    sqlx::query_as::<_, UserDetails>(
        r"
        UPDATE user_details SET
            first_name = $2, last_name = $3, referral_source = $4, date_of_birth = $5,
            ead_type = $6, ead_start_date = $7, prior_experience = $8, experience_details = $9,
            programming_languages = $10, resume_path = $11, ead_path = $12,
            id_document_path = $13, profile_completed = $14, updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        ",
    )
    .bind(details.user_id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(&details.referral_source)
    .bind(details.date_of_birth)
    .bind(&details.ead_type)
    .bind(details.ead_start_date)
    .bind(details.prior_experience)
    .bind(&details.experience_details)
    .bind(&details.programming_languages)
    .bind(&details.resume_path)
    .bind(&details.ead_path)
    .bind(&details.id_document_path)
    .bind(details.profile_completed)
    .fetch_one(executor)
    .await
    .map_err(db_error!("save_user_details", user_id = %details.user_id))
}
