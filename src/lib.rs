// ABOUTME: Library root for the managed database console
// ABOUTME: Exposes the wizards, service client and rendering used by the CLI

pub mod catalogue;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod interactive;
pub mod remote;
pub mod report;
pub mod wizard;
