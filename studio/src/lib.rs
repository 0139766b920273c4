//! Draftroom Studio - Actor-based editor backend with REST API
//!
//! This crate provides the per-user editing backend for Draftroom,
//! hosting one supervised actor per editor session.

pub mod actors;
pub mod api;
pub mod app_state;
pub mod config;
pub mod document;
pub mod edit_service;
pub mod keymap;

pub mod supervisor;
