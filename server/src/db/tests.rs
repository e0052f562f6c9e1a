//! Database Integration Tests
//!
//! Run against a fresh, migrated database per test (`#[sqlx::test]`).

#[cfg(test)]
mod postgres_tests {
    use super::super::*;
    use sqlx::PgPool;

    async fn user(pool: &PgPool, name: &str, role: Role) -> User {
        create_user(
            pool,
            name,
            &format!("{name}@example.com"),
            "hash",
            role,
            AccountStatus::Onboarding,
        )
        .await
        .expect("Failed to create user")
    }

    // ========================================================================
    // User Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_create_and_find_user(pool: PgPool) {
        let created = user(&pool, "alice", Role::User).await;
        assert_eq!(created.role, Role::User);
        assert_eq!(created.status, AccountStatus::Onboarding);

        let found = find_user_by_username(&pool, "alice")
            .await
            .expect("Query failed")
            .expect("User not found");
        assert_eq!(found.id, created.id);

        assert!(username_exists(&pool, "alice").await.unwrap());
        assert!(!username_exists(&pool, "bob").await.unwrap());
        assert!(email_exists(&pool, "alice@example.com").await.unwrap());
    }

    #[sqlx::test]
    async fn test_username_uniqueness(pool: PgPool) {
        user(&pool, "dup", Role::User).await;
        let err = create_user(
            &pool,
            "dup",
            "other@example.com",
            "hash",
            Role::User,
            AccountStatus::Onboarding,
        )
        .await
        .expect_err("Duplicate username should fail");
        assert!(is_unique_violation(&err));
    }

    #[sqlx::test]
    async fn test_primary_admin_is_oldest(pool: PgPool) {
        assert!(find_primary_admin(&pool).await.unwrap().is_none());
        let first = user(&pool, "admin1", Role::Admin).await;
        user(&pool, "admin2", Role::Admin).await;
        user(&pool, "student", Role::User).await;

        let primary = find_primary_admin(&pool).await.unwrap().unwrap();
        assert_eq!(primary.id, first.id);
        assert_eq!(list_admins(&pool).await.unwrap().len(), 2);
        assert_eq!(list_users_by_role(&pool, Role::User).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn test_update_status(pool: PgPool) {
        let created = user(&pool, "carol", Role::User).await;
        let updated = update_user_status(&pool, created.id, AccountStatus::Active)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Active);
        assert!(updated.updated_at >= created.updated_at);
    }

    // ========================================================================
    // Membership Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_attach_moves_user_between_groups(pool: PgPool) {
        let x = user(&pool, "xavier", Role::User).await;
        let h = create_group(&pool, "H", None).await.unwrap();
        let g = create_group(&pool, "G", Some("target")).await.unwrap();

        let previous = attach_user_to_group(&pool, x.id, h.id).await.unwrap();
        assert_eq!(previous, None);

        let previous = attach_user_to_group(&pool, x.id, g.id).await.unwrap();
        assert_eq!(previous, Some(h.id));

        let g_view = find_group_view(&pool, g.id).await.unwrap().unwrap();
        let h_view = find_group_view(&pool, h.id).await.unwrap().unwrap();
        assert_eq!(g_view.member_ids, vec![x.id]);
        assert!(h_view.member_ids.is_empty());
        assert_eq!(find_user_group_id(&pool, x.id).await.unwrap(), Some(g.id));
    }

    #[sqlx::test]
    async fn test_group_delete_requires_detach(pool: PgPool) {
        let x = user(&pool, "yara", Role::User).await;
        let g = create_group(&pool, "Cohort", None).await.unwrap();
        attach_user_to_group(&pool, x.id, g.id).await.unwrap();

        assert!(delete_group(&pool, g.id).await.is_err());

        let detached = detach_all_members(&pool, g.id).await.unwrap();
        assert_eq!(detached, vec![x.id]);
        assert_eq!(delete_group(&pool, g.id).await.unwrap(), 1);
        assert_eq!(find_user_group_id(&pool, x.id).await.unwrap(), None);
    }

    // ========================================================================
    // Message Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_message_requires_single_target(pool: PgPool) {
        let a = user(&pool, "sender", Role::User).await;
        let b = user(&pool, "receiver", Role::Admin).await;
        let g = create_group(&pool, "Chat", None).await.unwrap();

        assert!(insert_message(&pool, a.id, Some(b.id), Some(g.id), "both")
            .await
            .is_err());
        assert!(insert_message(&pool, a.id, None, None, "neither").await.is_err());

        insert_message(&pool, a.id, Some(b.id), None, "first").await.unwrap();
        insert_message(&pool, b.id, Some(a.id), None, "second").await.unwrap();
        let thread = list_onboarding_thread(&pool, a.id).await.unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[sqlx::test]
    async fn test_onboarding_thread_only_with_primary_admin(pool: PgPool) {
        let primary = user(&pool, "primary", Role::Admin).await;
        let other = user(&pool, "deputy", Role::Admin).await;
        let student = user(&pool, "student", Role::User).await;

        insert_message(&pool, student.id, Some(primary.id), None, "to primary")
            .await
            .unwrap();
        insert_message(&pool, other.id, Some(student.id), None, "from deputy")
            .await
            .unwrap();
        insert_message(&pool, primary.id, Some(student.id), None, "reply")
            .await
            .unwrap();

        let thread = list_onboarding_thread(&pool, student.id).await.unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["to primary", "reply"]);
    }

    // ========================================================================
    // Assignment / Submission Tests
    // ========================================================================

    #[sqlx::test]
    async fn test_submission_unique_per_user(pool: PgPool) {
        let admin = user(&pool, "teacher", Role::Admin).await;
        let student = user(&pool, "pupil", Role::User).await;
        let g = create_group(&pool, "Class", None).await.unwrap();
        let a = create_assignment(&pool, "Essay", None, None, g.id, admin.id)
            .await
            .unwrap();
        assert_eq!(a.group_name, "Class");
        assert_eq!(a.created_by_username, "teacher");
        assert_eq!(a.submission_count, 0);

        let first = create_submission(&pool, a.id, student.id, "p", "essay.pdf", 10)
            .await
            .unwrap();
        assert_eq!(first.status, SubmissionStatus::Pending);
        assert!(submission_exists(&pool, a.id, student.id).await.unwrap());

        let err = create_submission(&pool, a.id, student.id, "q", "again.pdf", 20)
            .await
            .expect_err("Second submission should fail");
        assert!(is_unique_violation(&err));

        let reloaded = find_assignment(&pool, a.id).await.unwrap().unwrap();
        assert_eq!(reloaded.submission_count, 1);
    }

    #[sqlx::test]
    async fn test_grade_bounds_enforced_by_store(pool: PgPool) {
        let admin = user(&pool, "grader", Role::Admin).await;
        let student = user(&pool, "gradee", Role::User).await;
        let g = create_group(&pool, "Bounds", None).await.unwrap();
        let a = create_assignment(&pool, "Quiz", None, None, g.id, admin.id)
            .await
            .unwrap();
        let s = create_submission(&pool, a.id, student.id, "p", "quiz.pdf", 1)
            .await
            .unwrap();

        assert!(
            evaluate_submission(&pool, s.id, SubmissionStatus::Graded, Some(150.0), None)
                .await
                .is_err()
        );
        let graded =
            evaluate_submission(&pool, s.id, SubmissionStatus::Graded, Some(85.5), Some("ok"))
                .await
                .unwrap()
                .unwrap();
        assert_eq!(graded.grade, Some(85.5));
        assert_eq!(graded.status, SubmissionStatus::Graded);
    }
}
