//! Integration test harness.
//!
//! These tests need a PostgreSQL instance and are gated on
//! `DROPLINK_TEST_DATABASE_URL`; without it every test is a silent
//! skip, so the suite stays runnable on machines without a database.

mod integration {
    pub mod helpers;

    mod deletion_test;
    mod invariants_test;
    mod link_test;
    mod quota_test;
}
