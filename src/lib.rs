// src/lib.rs

pub mod account;
pub mod api;
pub mod app_state;
pub mod config;
pub mod database;
pub mod error;
pub mod metadata;
pub mod service;
pub mod storage;
