// src/handlers/mod.rs

pub mod admin;
pub mod answers;
pub mod auth;
pub mod catalog;
pub mod questions;
pub mod stats;
