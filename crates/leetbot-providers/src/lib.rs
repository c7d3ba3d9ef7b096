//! # leetbot-providers
//!
//! External sources of daily tasks.

pub mod leetcode;

pub use leetcode::LeetCodeClient;
