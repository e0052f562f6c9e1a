//! Student Portal Server
//!
//! Backend for a cohort-based student portal: accounts and onboarding
//! profiles, groups, direct and group chat, assignments with file
//! submissions and grading, and email notifications.

pub mod api;
pub mod assignments;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod email;
pub mod groups;
pub mod profiles;
pub mod storage;
pub mod users;
pub mod util;
